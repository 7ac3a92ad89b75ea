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

pub struct InMemoryWebhookDeliveryRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    deliveries_by_id: HashMap<WebhookDeliveryID, WebhookDelivery>,
    // Live (non-deleted) deliveries only
    delivery_ids_by_idempotency_key: HashMap<WebhookIdempotencyKey, WebhookDeliveryID>,
    delivery_ids_by_event_id: HashMap<WebhookEventID, Vec<WebhookDeliveryID>>,
}

impl State {
    fn collect(&self, ids: &[WebhookDeliveryID]) -> Vec<WebhookDelivery> {
        ids.iter()
            .filter_map(|id| self.deliveries_by_id.get(id))
            .cloned()
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn WebhookDeliveryRepository)]
#[scope(Singleton)]
impl InMemoryWebhookDeliveryRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl WebhookDeliveryRepository for InMemoryWebhookDeliveryRepository {
    async fn create(&self, delivery: &WebhookDelivery) -> Result<(), CreateWebhookDeliveryError> {
        let mut guard = self.state.lock().unwrap();

        if guard.deliveries_by_id.contains_key(&delivery.id) {
            return Err(CreateWebhookDeliveryError::Duplicate(
                WebhookDeliveryDuplicateError {
                    delivery_id: delivery.id,
                },
            ));
        }

        if guard
            .delivery_ids_by_idempotency_key
            .contains_key(&delivery.idempotency_key)
        {
            return Err(CreateWebhookDeliveryError::DuplicateIdempotencyKey(
                WebhookDeliveryDuplicateKeyError {
                    idempotency_key: delivery.idempotency_key.clone(),
                },
            ));
        }

        if delivery.deleted_at.is_none() {
            guard
                .delivery_ids_by_idempotency_key
                .insert(delivery.idempotency_key.clone(), delivery.id);
        }
        guard
            .delivery_ids_by_event_id
            .entry(delivery.event_id)
            .or_default()
            .push(delivery.id);
        guard.deliveries_by_id.insert(delivery.id, delivery.clone());

        Ok(())
    }

    async fn update(
        &self,
        delivery: WebhookDelivery,
    ) -> Result<WebhookDelivery, UpdateWebhookDeliveryError> {
        let mut guard = self.state.lock().unwrap();

        let Some(stored) = guard.deliveries_by_id.get_mut(&delivery.id) else {
            return Err(UpdateWebhookDeliveryError::NotFound(
                WebhookDeliveryNotFoundError {
                    delivery_id: delivery.id,
                },
            ));
        };

        if stored.version != delivery.version {
            return Err(UpdateWebhookDeliveryError::ConcurrentModification(
                ConcurrentModificationError {
                    entity: "webhook delivery",
                    entity_id: delivery.id.into_inner(),
                    expected_version: delivery.version,
                    actual_version: stored.version,
                },
            ));
        }

        let mut updated = delivery;
        updated.version += 1;
        *stored = updated.clone();

        // Soft deletion releases the idempotency key
        if updated.deleted_at.is_some()
            && guard
                .delivery_ids_by_idempotency_key
                .get(&updated.idempotency_key)
                == Some(&updated.id)
        {
            guard
                .delivery_ids_by_idempotency_key
                .remove(&updated.idempotency_key);
        }

        Ok(updated)
    }

    async fn get_by_id(
        &self,
        delivery_id: WebhookDeliveryID,
    ) -> Result<Option<WebhookDelivery>, GetWebhookDeliveryError> {
        let guard = self.state.lock().unwrap();
        Ok(guard.deliveries_by_id.get(&delivery_id).cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &WebhookIdempotencyKey,
    ) -> Result<Option<WebhookDelivery>, GetWebhookDeliveryError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .delivery_ids_by_idempotency_key
            .get(idempotency_key)
            .and_then(|id| guard.deliveries_by_id.get(id))
            .cloned())
    }

    async fn list_due_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<WebhookDelivery>, ListWebhookDeliveriesError> {
        let guard = self.state.lock().unwrap();

        let mut deliveries: Vec<_> = guard
            .deliveries_by_id
            .values()
            .filter(|delivery| delivery.is_due(now))
            .cloned()
            .collect();
        deliveries.sort_by_key(|delivery| (delivery.next_attempt_at, delivery.created_at));

        Ok(deliveries)
    }

    async fn list_by_event_id(
        &self,
        event_id: WebhookEventID,
    ) -> Result<Vec<WebhookDelivery>, ListWebhookDeliveriesError> {
        let guard = self.state.lock().unwrap();

        Ok(guard
            .delivery_ids_by_event_id
            .get(&event_id)
            .map(|ids| guard.collect(ids))
            .unwrap_or_default())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
