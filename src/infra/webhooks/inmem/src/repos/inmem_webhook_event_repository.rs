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

pub struct InMemoryWebhookEventRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    events_by_id: HashMap<WebhookEventID, WebhookEvent>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn WebhookEventRepository)]
#[scope(Singleton)]
impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn create_event(&self, event: &WebhookEvent) -> Result<(), CreateWebhookEventError> {
        let mut guard = self.state.lock().unwrap();

        match guard.events_by_id.entry(event.id) {
            Entry::Occupied(_) => Err(CreateWebhookEventError::Duplicate(
                WebhookEventDuplicateError { event_id: event.id },
            )),
            Entry::Vacant(entry) => {
                entry.insert(event.clone());
                Ok(())
            }
        }
    }

    async fn get_event_by_id(
        &self,
        event_id: WebhookEventID,
    ) -> Result<WebhookEvent, GetWebhookEventError> {
        let guard = self.state.lock().unwrap();

        guard.events_by_id.get(&event_id).cloned().ok_or_else(|| {
            GetWebhookEventError::NotFound(WebhookEventNotFoundError { event_id })
        })
    }

    async fn mark_processed(
        &self,
        event_id: WebhookEventID,
        processed_at: DateTime<Utc>,
    ) -> Result<(), MarkWebhookEventProcessedError> {
        let mut guard = self.state.lock().unwrap();

        let Some(event) = guard.events_by_id.get_mut(&event_id) else {
            return Err(MarkWebhookEventProcessedError::NotFound(
                WebhookEventNotFoundError { event_id },
            ));
        };
        event.mark_processed(processed_at);

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
