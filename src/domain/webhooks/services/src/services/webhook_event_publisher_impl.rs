// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use courier_webhooks::*;
use dill::{component, interface};
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn WebhookEventPublisher)]
pub struct WebhookEventPublisherImpl {
    webhook_config_repo: Arc<dyn WebhookConfigRepository>,
    webhook_event_repo: Arc<dyn WebhookEventRepository>,
    webhook_delivery_repo: Arc<dyn WebhookDeliveryRepository>,
    time_source: Arc<dyn SystemTimeSource>,
}

impl WebhookEventPublisherImpl {
    async fn create_deliveries(
        &self,
        event: &WebhookEvent,
        configs: &[WebhookConfig],
    ) -> Result<Vec<WebhookDeliveryID>, InternalError> {
        let mut created_ids = Vec::with_capacity(configs.len());

        for config in configs {
            let idempotency_key = WebhookIdempotencyKey::new(event.id, config.id);

            if self
                .webhook_delivery_repo
                .find_by_idempotency_key(&idempotency_key)
                .await
                .int_err()?
                .is_some()
            {
                tracing::debug!(%idempotency_key, "Webhook delivery already exists, skipping");
                continue;
            }

            let delivery = WebhookDelivery::new(
                WebhookDeliveryID::new(uuid::Uuid::new_v4()),
                event.id,
                config.id,
                self.time_source.now(),
            );

            match self.webhook_delivery_repo.create(&delivery).await {
                Ok(()) => {
                    tracing::debug!(
                        delivery_id = %delivery.id,
                        config_id = %config.id,
                        "Webhook delivery scheduled"
                    );
                    created_ids.push(delivery.id);
                }
                Err(CreateWebhookDeliveryError::DuplicateIdempotencyKey(e)) => {
                    tracing::debug!(error = %e, "Webhook delivery created concurrently, skipping");
                }
                Err(e @ CreateWebhookDeliveryError::Duplicate(_)) => return Err(e.int_err()),
                Err(CreateWebhookDeliveryError::Internal(e)) => return Err(e),
            }
        }

        Ok(created_ids)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl WebhookEventPublisher for WebhookEventPublisherImpl {
    #[tracing::instrument(level = "debug", skip_all, fields(%event_type))]
    async fn trigger_event(
        &self,
        event_type: WebhookEventType,
        data: serde_json::Value,
    ) -> Result<Option<WebhookEventID>, TriggerWebhookEventError> {
        let configs = self
            .webhook_config_repo
            .list_eligible_by_event_type(&event_type)
            .await
            .int_err()?;

        if configs.is_empty() {
            tracing::debug!("No webhook subscribers for event type");
            return Ok(None);
        }

        let event = WebhookEvent::new(
            WebhookEventID::new(uuid::Uuid::new_v4()),
            event_type,
            data,
            self.time_source.now(),
        );
        self.webhook_event_repo
            .create_event(&event)
            .await
            .int_err()?;

        let created_ids = self.create_deliveries(&event, &configs).await?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            deliveries = created_ids.len(),
            "Webhook event published"
        );

        Ok(Some(event.id))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(%event_id))]
    async fn fan_out_event(
        &self,
        event_id: WebhookEventID,
    ) -> Result<Vec<WebhookDeliveryID>, FanOutWebhookEventError> {
        let event = match self.webhook_event_repo.get_event_by_id(event_id).await {
            Ok(event) => event,
            Err(GetWebhookEventError::NotFound(e)) => {
                return Err(FanOutWebhookEventError::EventNotFound(e));
            }
            Err(GetWebhookEventError::Internal(e)) => return Err(e.into()),
        };

        let configs = self
            .webhook_config_repo
            .list_eligible_by_event_type(&event.event_type)
            .await
            .int_err()?;

        Ok(self.create_deliveries(&event, &configs).await?)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Publishes an event on behalf of a business operation that must not fail
/// because of webhooks. Unknown event types and storage errors are logged
/// and swallowed.
pub async fn trigger_webhook_safely(
    publisher: &dyn WebhookEventPublisher,
    event_type: &str,
    data: serde_json::Value,
) -> Option<WebhookEventID> {
    let event_type = match WebhookEventType::try_new(event_type) {
        Ok(event_type) => event_type,
        Err(e) => {
            tracing::error!(error = %e, event_type, "Invalid webhook event type");
            return None;
        }
    };

    match publisher.trigger_event(event_type.clone(), data).await {
        Ok(maybe_event_id) => maybe_event_id,
        Err(e) => {
            tracing::error!(
                error = ?e,
                error_msg = %e,
                %event_type,
                "Failed to trigger webhook event"
            );
            None
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
