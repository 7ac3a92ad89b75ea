// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use assert_matches::assert_matches;
use chrono::{DateTime, Utc};
use courier_webhooks::*;
use courier_webhooks_inmem::{InMemoryWebhookDeliveryRepository, InMemoryWebhookEventRepository};
use courier_webhooks_services::*;
use time_source::{SystemTimeSource, SystemTimeSourceStub};

use super::webhook_services_harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_trigger_without_subscribers_stores_nothing() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());

    harness
        .create_config(
            TEST_WEBHOOK_URL,
            vec![WebhookEventTypeCatalog::user_updated()],
        )
        .await;

    let res = harness
        .webhook_event_publisher
        .trigger_event(
            WebhookEventTypeCatalog::grade_created(),
            serde_json::json!({"gradeId": "g1"}),
        )
        .await;
    assert_matches!(res, Ok(None));

    assert!(
        harness
            .webhook_delivery_repo
            .list_due_pending(harness.now())
            .await
            .unwrap()
            .is_empty()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_trigger_creates_event_and_pending_delivery() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());

    let config = harness
        .create_config(
            TEST_WEBHOOK_URL,
            vec![WebhookEventTypeCatalog::grade_created()],
        )
        .await;

    let event_id = harness
        .webhook_event_publisher
        .trigger_event(
            WebhookEventTypeCatalog::grade_created(),
            serde_json::json!({"gradeId": "g1"}),
        )
        .await
        .unwrap()
        .unwrap();

    let event = harness.get_event(event_id).await;
    assert_eq!(event.event_type, WebhookEventTypeCatalog::grade_created());
    assert_eq!(event.data, serde_json::json!({"gradeId": "g1"}));
    assert!(!event.processed);
    assert_eq!(event.created_at, harness.now());

    let deliveries = harness
        .webhook_delivery_repo
        .list_by_event_id(event_id)
        .await
        .unwrap();
    assert_eq!(deliveries.len(), 1);

    let delivery = &deliveries[0];
    assert_eq!(delivery.webhook_config_id, config.id);
    assert_eq!(delivery.status, WebhookDeliveryStatus::Pending);
    assert_eq!(delivery.attempts, 0);
    assert_eq!(delivery.next_attempt_at, Some(harness.now()));
    assert_eq!(
        delivery.idempotency_key,
        WebhookIdempotencyKey::new(event_id, config.id)
    );
    assert!(delivery.is_due(harness.now()));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_trigger_skips_ineligible_configs() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());
    let grade_created = WebhookEventTypeCatalog::grade_created();

    let active = harness
        .create_config("https://a.example.com/hook", vec![grade_created.clone()])
        .await;

    let mut inactive = harness
        .create_config("https://b.example.com/hook", vec![grade_created.clone()])
        .await;
    inactive.deactivate(harness.now());
    harness.webhook_config_repo.update(inactive).await.unwrap();

    let deleted = harness
        .create_config("https://c.example.com/hook", vec![grade_created.clone()])
        .await;
    harness
        .webhook_config_repo
        .soft_delete(deleted.id, harness.now())
        .await
        .unwrap();

    harness
        .create_config(
            "https://d.example.com/hook",
            vec![WebhookEventTypeCatalog::announcement_posted()],
        )
        .await;

    let event_id = harness
        .webhook_event_publisher
        .trigger_event(grade_created, serde_json::json!({}))
        .await
        .unwrap()
        .unwrap();

    let deliveries = harness
        .webhook_delivery_repo
        .list_by_event_id(event_id)
        .await
        .unwrap();
    assert_eq!(
        deliveries
            .iter()
            .map(|d| d.webhook_config_id)
            .collect::<Vec<_>>(),
        vec![active.id]
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_fan_out_creates_only_missing_deliveries() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());
    let grade_updated = WebhookEventTypeCatalog::grade_updated();

    harness
        .create_config("https://a.example.com/hook", vec![grade_updated.clone()])
        .await;

    let event_id = harness
        .webhook_event_publisher
        .trigger_event(grade_updated.clone(), serde_json::json!({"gradeId": "g7"}))
        .await
        .unwrap()
        .unwrap();

    // Repeating the fan-out is a no-op
    let created = harness
        .webhook_event_publisher
        .fan_out_event(event_id)
        .await
        .unwrap();
    assert!(created.is_empty());

    // A late subscriber gets its own delivery
    let late = harness
        .create_config("https://b.example.com/hook", vec![grade_updated])
        .await;
    let created = harness
        .webhook_event_publisher
        .fan_out_event(event_id)
        .await
        .unwrap();
    assert_eq!(created.len(), 1);

    let late_delivery = harness.get_delivery(created[0]).await;
    assert_eq!(late_delivery.webhook_config_id, late.id);

    assert_eq!(
        harness
            .webhook_delivery_repo
            .list_by_event_id(event_id)
            .await
            .unwrap()
            .len(),
        2
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_fan_out_unknown_event() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());

    let event_id = WebhookEventID::new(uuid::Uuid::new_v4());
    let res = harness.webhook_event_publisher.fan_out_event(event_id).await;

    assert_matches!(
        res,
        Err(FanOutWebhookEventError::EventNotFound(WebhookEventNotFoundError { event_id: missing_id }))
            if missing_id == event_id
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_trigger_webhook_safely() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());

    harness
        .create_config(
            TEST_WEBHOOK_URL,
            vec![WebhookEventTypeCatalog::user_updated()],
        )
        .await;

    let publisher = harness.webhook_event_publisher.as_ref();

    assert!(
        trigger_webhook_safely(publisher, "user.updated", serde_json::json!({"userId": "u1"}))
            .await
            .is_some()
    );
    assert!(
        trigger_webhook_safely(publisher, "grade.created", serde_json::json!({}))
            .await
            .is_none()
    );
    assert!(
        trigger_webhook_safely(publisher, "   ", serde_json::json!({}))
            .await
            .is_none()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_storage_failure_propagates_from_trigger() {
    let time_source = SystemTimeSourceStub::new_set(WebhookServicesHarness::t0());

    let catalog = dill::CatalogBuilder::new()
        .add_value(time_source)
        .bind::<dyn SystemTimeSource, SystemTimeSourceStub>()
        .add_value(UnavailableWebhookConfigRepository)
        .bind::<dyn WebhookConfigRepository, UnavailableWebhookConfigRepository>()
        .add::<InMemoryWebhookEventRepository>()
        .add::<InMemoryWebhookDeliveryRepository>()
        .add::<WebhookEventPublisherImpl>()
        .build();

    let publisher = catalog.get_one::<dyn WebhookEventPublisher>().unwrap();

    let res = publisher
        .trigger_event(WebhookEventTypeCatalog::test(), serde_json::json!({}))
        .await;
    assert_matches!(res, Err(TriggerWebhookEventError::Internal(_)));

    // Business callers are shielded from the failure
    assert_eq!(
        trigger_webhook_safely(publisher.as_ref(), "webhook.test", serde_json::json!({})).await,
        None
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct UnavailableWebhookConfigRepository;

impl UnavailableWebhookConfigRepository {
    fn storage_error() -> InternalError {
        "config storage unavailable".int_err()
    }
}

#[async_trait::async_trait]
impl WebhookConfigRepository for UnavailableWebhookConfigRepository {
    async fn create(&self, _config: &WebhookConfig) -> Result<(), CreateWebhookConfigError> {
        Err(Self::storage_error().into())
    }

    async fn update(
        &self,
        _config: WebhookConfig,
    ) -> Result<WebhookConfig, UpdateWebhookConfigError> {
        Err(Self::storage_error().into())
    }

    async fn get_by_id(
        &self,
        _config_id: WebhookConfigID,
    ) -> Result<Option<WebhookConfig>, GetWebhookConfigError> {
        Err(Self::storage_error().into())
    }

    async fn list_eligible_by_event_type(
        &self,
        _event_type: &WebhookEventType,
    ) -> Result<Vec<WebhookConfig>, ListWebhookConfigsError> {
        Err(Self::storage_error().into())
    }

    async fn soft_delete(
        &self,
        _config_id: WebhookConfigID,
        _deleted_at: DateTime<Utc>,
    ) -> Result<(), DeleteWebhookConfigError> {
        Err(Self::storage_error().into())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
