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
#[interface(dyn DeadLetterArchiver)]
pub struct DeadLetterArchiverImpl {
    webhook_event_repo: Arc<dyn WebhookEventRepository>,
    dead_letter_repo: Arc<dyn DeadLetterWebhookRepository>,
    time_source: Arc<dyn SystemTimeSource>,
}

#[async_trait::async_trait]
impl DeadLetterArchiver for DeadLetterArchiverImpl {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(delivery_id = %delivery.id, config_id = %config.id)
    )]
    async fn archive(
        &self,
        delivery: &WebhookDelivery,
        config: &WebhookConfig,
        status_code: u16,
        error_message: &str,
    ) -> Result<Option<DeadLetterWebhookID>, InternalError> {
        let event = match self
            .webhook_event_repo
            .get_event_by_id(delivery.event_id)
            .await
        {
            Ok(event) => event,
            Err(GetWebhookEventError::NotFound(e)) => {
                tracing::warn!(error = %e, "Event vanished, nothing to archive");
                return Ok(None);
            }
            Err(GetWebhookEventError::Internal(e)) => return Err(e),
        };

        let now = self.time_source.now();

        let entry = DeadLetterWebhook {
            id: DeadLetterWebhookID::new(uuid::Uuid::new_v4()),
            delivery_id: delivery.id,
            event_id: event.id,
            webhook_config_id: config.id,
            event_type: event.event_type.clone(),
            url: config.url.clone(),
            payload: WebhookPayload::from_event(&event).to_json()?,
            status_code,
            attempts: delivery.attempts,
            error_message: error_message.to_string(),
            failed_at: now,
            created_at: now,
            deleted_at: None,
        };

        match self.dead_letter_repo.create(&entry).await {
            Ok(()) => {
                tracing::warn!(
                    dead_letter_id = %entry.id,
                    attempts = entry.attempts,
                    status_code,
                    url = %entry.url,
                    "Webhook delivery moved to dead letter queue"
                );
                Ok(Some(entry.id))
            }
            Err(CreateDeadLetterWebhookError::AlreadyArchived(e)) => {
                tracing::debug!(error = %e, "Webhook delivery archived earlier");
                Ok(None)
            }
            Err(CreateDeadLetterWebhookError::Internal(e)) => Err(e),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
