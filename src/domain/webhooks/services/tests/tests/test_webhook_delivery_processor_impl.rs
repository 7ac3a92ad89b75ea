// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Duration;
use courier_webhooks::*;

use super::webhook_services_harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_nothing_due() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());

    let summary = harness
        .webhook_delivery_processor
        .process_pending_deliveries()
        .await
        .unwrap();

    assert_eq!(summary, WebhookDeliveryBatchSummary::default());
    assert_eq!(summary.total(), 0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_only_due_deliveries_are_attempted() {
    let mut mock_webhook_sender = MockWebhookSender::new();
    WebhookServicesHarness::add_response_expectation(
        &mut mock_webhook_sender,
        TEST_WEBHOOK_URL,
        http::StatusCode::OK,
        "OK",
        1,
    );

    let harness = WebhookServicesHarness::new(mock_webhook_sender);
    let (config, _, due) = harness.create_pending_delivery(TEST_WEBHOOK_URL).await;

    let later_event = harness
        .create_event(WebhookEventTypeCatalog::grade_created())
        .await;
    let mut later = harness.create_delivery(later_event.id, config.id).await;
    later.next_attempt_at = Some(harness.now() + Duration::minutes(2));
    harness.webhook_delivery_repo.update(later.clone()).await.unwrap();

    let summary = harness
        .webhook_delivery_processor
        .process_pending_deliveries()
        .await
        .unwrap();

    assert_eq!(
        summary,
        WebhookDeliveryBatchSummary {
            delivered: 1,
            ..Default::default()
        }
    );
    assert_eq!(
        harness.get_delivery(due.id).await.status,
        WebhookDeliveryStatus::Delivered
    );

    let later = harness.get_delivery(later.id).await;
    assert_eq!(later.status, WebhookDeliveryStatus::Pending);
    assert_eq!(later.attempts, 0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_failing_destination_does_not_affect_healthy_one() {
    const BROKEN_URL: &str = "https://broken.example.com/hook";
    const HEALTHY_URL: &str = "https://healthy.example.com/hook";

    let mut mock_webhook_sender = MockWebhookSender::new();
    WebhookServicesHarness::add_connection_failure_expectation(
        &mut mock_webhook_sender,
        BROKEN_URL,
        1,
    );
    WebhookServicesHarness::add_response_expectation(
        &mut mock_webhook_sender,
        HEALTHY_URL,
        http::StatusCode::OK,
        "OK",
        1,
    );

    let harness = WebhookServicesHarness::new(mock_webhook_sender);
    let grade_created = WebhookEventTypeCatalog::grade_created();

    let broken = harness
        .create_config(BROKEN_URL, vec![grade_created.clone()])
        .await;
    let healthy = harness
        .create_config(HEALTHY_URL, vec![grade_created.clone()])
        .await;

    let event_id = harness
        .webhook_event_publisher
        .trigger_event(grade_created, serde_json::json!({"gradeId": "g1"}))
        .await
        .unwrap()
        .unwrap();

    let summary = harness
        .webhook_delivery_processor
        .process_pending_deliveries()
        .await
        .unwrap();

    assert_eq!(
        summary,
        WebhookDeliveryBatchSummary {
            delivered: 1,
            rescheduled: 1,
            ..Default::default()
        }
    );

    let deliveries = harness
        .webhook_delivery_repo
        .list_by_event_id(event_id)
        .await
        .unwrap();
    for delivery in deliveries {
        if delivery.webhook_config_id == healthy.id {
            assert_eq!(delivery.status, WebhookDeliveryStatus::Delivered);
        } else {
            assert_eq!(delivery.webhook_config_id, broken.id);
            assert_eq!(delivery.status, WebhookDeliveryStatus::Pending);
            assert_eq!(delivery.attempts, 1);
        }
    }

    assert!(harness.get_event(event_id).await.processed);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_batches_respect_concurrency_limit() {
    let sender = InFlightCountingSender::default();
    let webhooks_config = WebhooksConfig {
        concurrency_limit: 2,
        ..WebhookServicesHarness::test_webhooks_config()
    };

    let harness = WebhookServicesHarness::new_with_sender(sender.clone(), webhooks_config);

    let config = harness
        .create_config(
            TEST_WEBHOOK_URL,
            vec![WebhookEventTypeCatalog::grade_created()],
        )
        .await;
    for _ in 0..5 {
        let event = harness
            .create_event(WebhookEventTypeCatalog::grade_created())
            .await;
        harness.create_delivery(event.id, config.id).await;
    }

    let summary = harness
        .webhook_delivery_processor
        .process_pending_deliveries()
        .await
        .unwrap();

    assert_eq!(summary.delivered, 5);
    assert_eq!(sender.total_calls.load(Ordering::SeqCst), 5);
    assert!(sender.max_in_flight.load(Ordering::SeqCst) <= 2);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default, Clone)]
struct InFlightCountingSender {
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    total_calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl WebhookSender for InFlightCountingSender {
    async fn send_webhook(
        &self,
        _target_url: url::Url,
        _payload: bytes::Bytes,
        _headers: http::HeaderMap,
    ) -> Result<WebhookResponse, WebhookSendError> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(WebhookServicesHarness::response(http::StatusCode::OK, "OK"))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
