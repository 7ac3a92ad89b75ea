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

use crate::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn WebhookDeliveryExecutor)]
pub struct WebhookDeliveryExecutorImpl {
    webhook_config_repo: Arc<dyn WebhookConfigRepository>,
    webhook_event_repo: Arc<dyn WebhookEventRepository>,
    webhook_delivery_repo: Arc<dyn WebhookDeliveryRepository>,
    webhook_signer: Arc<dyn WebhookSigner>,
    webhook_sender: Arc<dyn WebhookSender>,
    dead_letter_archiver: Arc<dyn DeadLetterArchiver>,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
    webhooks_config: Arc<WebhooksConfig>,
    time_source: Arc<dyn SystemTimeSource>,
}

struct WebhookRequestData {
    payload_bytes: bytes::Bytes,
    headers: http::HeaderMap,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

impl WebhookDeliveryExecutorImpl {
    async fn try_attempt_delivery(
        &self,
        delivery_id: WebhookDeliveryID,
    ) -> Result<WebhookDeliveryOutcome, InternalError> {
        let Some(delivery) = self.load_pending_delivery(delivery_id).await? else {
            tracing::debug!("Webhook delivery is gone or no longer pending, skipping");
            return Ok(WebhookDeliveryOutcome::Skipped);
        };

        let Some(config) = self
            .webhook_config_repo
            .get_by_id(delivery.webhook_config_id)
            .await
            .int_err()?
        else {
            return self
                .fail_delivery(delivery_id, WebhookDeliveryFailureReason::ConfigNotFound)
                .await;
        };

        let event = match self
            .webhook_event_repo
            .get_event_by_id(delivery.event_id)
            .await
        {
            Ok(event) => event,
            Err(GetWebhookEventError::NotFound(_)) => {
                return self
                    .fail_delivery(delivery_id, WebhookDeliveryFailureReason::EventNotFound)
                    .await;
            }
            Err(GetWebhookEventError::Internal(e)) => return Err(e),
        };

        if !config.active {
            return self
                .fail_delivery(delivery_id, WebhookDeliveryFailureReason::ConfigInactive)
                .await;
        }

        let request_data = match self.prepare_request(&config, &event) {
            Ok(request_data) => request_data,
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    error_msg = %e.reason(),
                    "Failed to prepare webhook request"
                );
                return self
                    .register_failed_attempt(delivery_id, Some(&config), 0, e.reason())
                    .await;
            }
        };

        let circuit_breaker = self.circuit_breakers.get_or_create(config.url.as_str());

        let send_result = circuit_breaker
            .execute(|| {
                self.webhook_sender.send_webhook(
                    config.url.clone(),
                    request_data.payload_bytes,
                    request_data.headers,
                )
            })
            .await;

        match send_result {
            Ok(response) if response.is_success() => {
                self.complete_delivery(delivery_id, &event, response.status_code.as_u16())
                    .await
            }
            Ok(response) => {
                let status_code = response.status_code.as_u16();
                let error_message = if response.body.is_empty() {
                    format!("HTTP {}", response.status_code)
                } else {
                    response.body
                };
                self.register_failed_attempt(
                    delivery_id,
                    Some(&config),
                    status_code,
                    error_message,
                )
                .await
            }
            Err(CircuitBreakerError::Open(e)) => {
                tracing::warn!(error = %e, "Webhook delivery rejected by circuit breaker");
                self.fail_delivery(
                    delivery_id,
                    WebhookDeliveryFailureReason::CircuitOpen { url: e.url },
                )
                .await
            }
            Err(CircuitBreakerError::Operation(e)) => {
                tracing::warn!(error = ?e, error_msg = %e, "Webhook transport failure");
                self.register_failed_attempt(delivery_id, Some(&config), 0, e.to_string())
                    .await
            }
        }
    }

    async fn load_pending_delivery(
        &self,
        delivery_id: WebhookDeliveryID,
    ) -> Result<Option<WebhookDelivery>, InternalError> {
        let maybe_delivery = self
            .webhook_delivery_repo
            .get_by_id(delivery_id)
            .await
            .int_err()?;

        Ok(maybe_delivery.filter(|d| d.is_pending() && d.deleted_at.is_none()))
    }

    fn prepare_request(
        &self,
        config: &WebhookConfig,
        event: &WebhookEvent,
    ) -> Result<WebhookRequestData, InternalError> {
        let payload_bytes = WebhookPayload::from_event(event).to_bytes()?;
        let signature = self.webhook_signer.sign(&payload_bytes, &config.secret);

        let mut headers = http::HeaderMap::new();

        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static(WEBHOOK_CONTENT_TYPE),
        );
        headers.insert(
            http::header::USER_AGENT,
            http::HeaderValue::from_str(&self.webhooks_config.user_agent).int_err()?,
        );
        headers.insert(
            http::header::HeaderName::from_static(HEADER_WEBHOOK_SIGNATURE),
            http::HeaderValue::from_str(&signature).int_err()?,
        );
        headers.insert(
            http::header::HeaderName::from_static(HEADER_WEBHOOK_ID),
            http::HeaderValue::from_str(&event.id.to_string()).int_err()?,
        );
        headers.insert(
            http::header::HeaderName::from_static(HEADER_WEBHOOK_TIMESTAMP),
            http::HeaderValue::from_str(&format_webhook_timestamp(event.created_at)).int_err()?,
        );

        Ok(WebhookRequestData {
            payload_bytes,
            headers,
        })
    }

    async fn save_delivery(
        &self,
        delivery: WebhookDelivery,
    ) -> Result<Option<WebhookDelivery>, InternalError> {
        match self.webhook_delivery_repo.update(delivery).await {
            Ok(stored) => Ok(Some(stored)),
            Err(UpdateWebhookDeliveryError::NotFound(e)) => {
                tracing::warn!(error = %e, "Webhook delivery vanished before saving");
                Ok(None)
            }
            Err(UpdateWebhookDeliveryError::ConcurrentModification(e)) => {
                tracing::warn!(error = %e, "Webhook delivery changed concurrently, dropping result");
                Ok(None)
            }
            Err(UpdateWebhookDeliveryError::Internal(e)) => Err(e),
        }
    }

    async fn complete_delivery(
        &self,
        delivery_id: WebhookDeliveryID,
        event: &WebhookEvent,
        status_code: u16,
    ) -> Result<WebhookDeliveryOutcome, InternalError> {
        let Some(mut delivery) = self.load_pending_delivery(delivery_id).await? else {
            return Ok(WebhookDeliveryOutcome::Skipped);
        };

        let now = self.time_source.now();
        delivery.mark_delivered(status_code, now);

        if self.save_delivery(delivery).await?.is_none() {
            return Ok(WebhookDeliveryOutcome::Skipped);
        }

        tracing::info!(status_code, "Webhook delivered");

        match self.webhook_event_repo.mark_processed(event.id, now).await {
            Ok(()) => {}
            Err(MarkWebhookEventProcessedError::NotFound(e)) => {
                tracing::warn!(error = %e, "Delivered event is gone, not marking processed");
            }
            Err(MarkWebhookEventProcessedError::Internal(e)) => {
                tracing::error!(
                    error = ?e,
                    error_msg = %e.reason(),
                    "Failed to mark webhook event processed"
                );
            }
        }

        Ok(WebhookDeliveryOutcome::Delivered { status_code })
    }

    async fn fail_delivery(
        &self,
        delivery_id: WebhookDeliveryID,
        reason: WebhookDeliveryFailureReason,
    ) -> Result<WebhookDeliveryOutcome, InternalError> {
        let Some(mut delivery) = self.load_pending_delivery(delivery_id).await? else {
            return Ok(WebhookDeliveryOutcome::Skipped);
        };

        delivery.mark_failed(reason.to_string(), self.time_source.now());

        if self.save_delivery(delivery).await?.is_none() {
            return Ok(WebhookDeliveryOutcome::Skipped);
        }

        tracing::warn!(%reason, "Webhook delivery failed permanently");

        Ok(WebhookDeliveryOutcome::Failed { reason })
    }

    async fn register_failed_attempt(
        &self,
        delivery_id: WebhookDeliveryID,
        config: Option<&WebhookConfig>,
        status_code: u16,
        error_message: String,
    ) -> Result<WebhookDeliveryOutcome, InternalError> {
        let Some(mut delivery) = self.load_pending_delivery(delivery_id).await? else {
            return Ok(WebhookDeliveryOutcome::Skipped);
        };

        let retry_policy = self.webhooks_config.retry_policy();
        let now = self.time_source.now();
        let verdict =
            delivery.register_failed_attempt(status_code, error_message, &retry_policy, now);
        let attempts = delivery.attempts;

        let next_attempt_at = match verdict {
            WebhookFailedAttemptVerdict::RetryScheduled { next_attempt_at } => next_attempt_at,
            WebhookFailedAttemptVerdict::Exhausted => {
                // The delivery must stay pending until its dead letter exists
                let archived = match config {
                    Some(config) => self.try_archive(&delivery, config, status_code).await,
                    None => false,
                };
                if archived {
                    if self.save_delivery(delivery).await?.is_none() {
                        return Ok(WebhookDeliveryOutcome::Skipped);
                    }

                    tracing::warn!(attempts, status_code, "Webhook delivery retries exhausted");

                    return Ok(WebhookDeliveryOutcome::DeadLettered { attempts });
                }

                let next_attempt_at = now + retry_policy.delay_after(attempts);
                delivery.postpone(next_attempt_at, now);
                next_attempt_at
            }
        };

        if self.save_delivery(delivery).await?.is_none() {
            return Ok(WebhookDeliveryOutcome::Skipped);
        }

        tracing::info!(
            attempts,
            status_code,
            %next_attempt_at,
            "Webhook delivery attempt failed, retry scheduled"
        );

        Ok(WebhookDeliveryOutcome::Rescheduled {
            attempts,
            next_attempt_at,
        })
    }

    async fn try_archive(
        &self,
        delivery: &WebhookDelivery,
        config: &WebhookConfig,
        status_code: u16,
    ) -> bool {
        let error_message = delivery.error_message.clone().unwrap_or_default();

        match self
            .dead_letter_archiver
            .archive(delivery, config, status_code, &error_message)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    error_msg = %e.reason(),
                    "Failed to archive exhausted webhook delivery, postponing"
                );
                false
            }
        }
    }

    /// Counts an unexpected failure as an attempt so the delivery follows
    /// the regular backoff instead of being picked up again immediately
    async fn register_internal_failure(
        &self,
        delivery: &WebhookDelivery,
        error: &InternalError,
    ) -> Result<WebhookDeliveryOutcome, InternalError> {
        let config = match self
            .webhook_config_repo
            .get_by_id(delivery.webhook_config_id)
            .await
        {
            Ok(maybe_config) => maybe_config,
            Err(e) => {
                tracing::warn!(error = ?e, error_msg = %e, "Webhook config unavailable");
                None
            }
        };

        self.register_failed_attempt(delivery.id, config.as_ref(), 0, error.reason())
            .await
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl WebhookDeliveryExecutor for WebhookDeliveryExecutorImpl {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            delivery_id = %delivery.id,
            config_id = %delivery.webhook_config_id,
            event_id = %delivery.event_id,
        )
    )]
    async fn attempt_delivery(&self, delivery: &WebhookDelivery) -> WebhookDeliveryOutcome {
        let e = match self.try_attempt_delivery(delivery.id).await {
            Ok(outcome) => return outcome,
            Err(e) => e,
        };

        tracing::error!(
            error = ?e,
            error_msg = %e.reason(),
            "Webhook delivery attempt failed with an internal error"
        );

        match self.register_internal_failure(delivery, &e).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    error_msg = %e.reason(),
                    "Webhook delivery attempt could not be recorded"
                );
                WebhookDeliveryOutcome::Errored
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
