// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use courier_webhooks::*;
use dill::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryDeadLetterWebhookRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    entries_by_id: HashMap<DeadLetterWebhookID, DeadLetterWebhook>,
    entry_ids_by_delivery_id: HashMap<WebhookDeliveryID, DeadLetterWebhookID>,
}

impl State {
    fn list_live_newest_first(
        &self,
        predicate: impl Fn(&DeadLetterWebhook) -> bool,
    ) -> Vec<DeadLetterWebhook> {
        let mut entries: Vec<_> = self
            .entries_by_id
            .values()
            .filter(|entry| entry.deleted_at.is_none() && predicate(entry))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.failed_at.cmp(&a.failed_at).then(b.id.cmp(&a.id)));
        entries
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn DeadLetterWebhookRepository)]
#[scope(Singleton)]
impl InMemoryDeadLetterWebhookRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl DeadLetterWebhookRepository for InMemoryDeadLetterWebhookRepository {
    async fn create(&self, entry: &DeadLetterWebhook) -> Result<(), CreateDeadLetterWebhookError> {
        let mut guard = self.state.lock().unwrap();

        if guard.entry_ids_by_delivery_id.contains_key(&entry.delivery_id) {
            return Err(CreateDeadLetterWebhookError::AlreadyArchived(
                DeadLetterWebhookDuplicateError {
                    delivery_id: entry.delivery_id,
                },
            ));
        }

        guard
            .entry_ids_by_delivery_id
            .insert(entry.delivery_id, entry.id);
        guard.entries_by_id.insert(entry.id, entry.clone());

        Ok(())
    }

    async fn get_by_id(
        &self,
        entry_id: DeadLetterWebhookID,
    ) -> Result<Option<DeadLetterWebhook>, GetDeadLetterWebhookError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .entries_by_id
            .get(&entry_id)
            .filter(|entry| entry.deleted_at.is_none())
            .cloned())
    }

    async fn get_by_delivery_id(
        &self,
        delivery_id: WebhookDeliveryID,
    ) -> Result<Option<DeadLetterWebhook>, GetDeadLetterWebhookError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .entry_ids_by_delivery_id
            .get(&delivery_id)
            .and_then(|id| guard.entries_by_id.get(id))
            .filter(|entry| entry.deleted_at.is_none())
            .cloned())
    }

    async fn list_by_config_id(
        &self,
        config_id: WebhookConfigID,
    ) -> Result<Vec<DeadLetterWebhook>, ListDeadLetterWebhooksError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.list_live_newest_first(|entry| entry.webhook_config_id == config_id))
    }

    async fn list_by_event_type(
        &self,
        event_type: &WebhookEventType,
    ) -> Result<Vec<DeadLetterWebhook>, ListDeadLetterWebhooksError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.list_live_newest_first(|entry| entry.event_type == *event_type))
    }

    async fn soft_delete(
        &self,
        entry_id: DeadLetterWebhookID,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), DeleteDeadLetterWebhookError> {
        let mut guard = self.state.lock().unwrap();

        match guard.entries_by_id.get_mut(&entry_id) {
            Some(entry) if entry.deleted_at.is_none() => {
                entry.deleted_at = Some(deleted_at);
                Ok(())
            }
            _ => Err(DeleteDeadLetterWebhookError::NotFound(
                DeadLetterWebhookNotFoundError { entry_id },
            )),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
