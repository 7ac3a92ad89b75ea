// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use courier_webhooks::*;
use dill::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryWebhookConfigRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    configs_by_id: HashMap<WebhookConfigID, WebhookConfig>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn WebhookConfigRepository)]
#[scope(Singleton)]
impl InMemoryWebhookConfigRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl WebhookConfigRepository for InMemoryWebhookConfigRepository {
    async fn create(&self, config: &WebhookConfig) -> Result<(), CreateWebhookConfigError> {
        let mut guard = self.state.lock().unwrap();

        match guard.configs_by_id.entry(config.id) {
            Entry::Occupied(_) => Err(CreateWebhookConfigError::Duplicate(
                WebhookConfigDuplicateError {
                    config_id: config.id,
                },
            )),
            Entry::Vacant(entry) => {
                entry.insert(config.clone());
                Ok(())
            }
        }
    }

    async fn update(
        &self,
        config: WebhookConfig,
    ) -> Result<WebhookConfig, UpdateWebhookConfigError> {
        let mut guard = self.state.lock().unwrap();

        let Some(stored) = guard.configs_by_id.get_mut(&config.id) else {
            return Err(UpdateWebhookConfigError::NotFound(
                WebhookConfigNotFoundError {
                    config_id: config.id,
                },
            ));
        };

        if stored.version != config.version {
            return Err(UpdateWebhookConfigError::ConcurrentModification(
                ConcurrentModificationError {
                    entity: "webhook config",
                    entity_id: config.id.into_inner(),
                    expected_version: config.version,
                    actual_version: stored.version,
                },
            ));
        }

        let mut updated = config;
        updated.version += 1;
        *stored = updated.clone();

        Ok(updated)
    }

    async fn get_by_id(
        &self,
        config_id: WebhookConfigID,
    ) -> Result<Option<WebhookConfig>, GetWebhookConfigError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .configs_by_id
            .get(&config_id)
            .filter(|config| !config.is_deleted())
            .cloned())
    }

    async fn list_eligible_by_event_type(
        &self,
        event_type: &WebhookEventType,
    ) -> Result<Vec<WebhookConfig>, ListWebhookConfigsError> {
        let guard = self.state.lock().unwrap();

        let mut configs: Vec<_> = guard
            .configs_by_id
            .values()
            .filter(|config| config.is_eligible() && config.is_subscribed_to(event_type))
            .cloned()
            .collect();
        configs.sort_by_key(|config| (config.created_at, config.id));

        Ok(configs)
    }

    async fn soft_delete(
        &self,
        config_id: WebhookConfigID,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), DeleteWebhookConfigError> {
        let mut guard = self.state.lock().unwrap();

        match guard.configs_by_id.get_mut(&config_id) {
            Some(config) if !config.is_deleted() => {
                config.mark_deleted(deleted_at);
                config.version += 1;
                Ok(())
            }
            _ => Err(DeleteWebhookConfigError::NotFound(
                WebhookConfigNotFoundError { config_id },
            )),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
