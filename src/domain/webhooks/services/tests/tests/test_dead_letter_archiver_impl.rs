// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use courier_webhooks::*;

use super::webhook_services_harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_archive_snapshots_delivery() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());
    let (config, event, mut delivery) = harness.create_pending_delivery(TEST_WEBHOOK_URL).await;
    delivery.attempts = 3;

    let entry_id = harness
        .dead_letter_archiver
        .archive(&delivery, &config, 503, "Service Unavailable")
        .await
        .unwrap()
        .unwrap();

    let entry = harness
        .dead_letter_repo
        .get_by_id(entry_id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(entry.delivery_id, delivery.id);
    assert_eq!(entry.event_id, event.id);
    assert_eq!(entry.webhook_config_id, config.id);
    assert_eq!(entry.event_type, event.event_type);
    assert_eq!(entry.url, config.url);
    assert_eq!(entry.status_code, 503);
    assert_eq!(entry.attempts, 3);
    assert_eq!(entry.error_message, "Service Unavailable");
    assert_eq!(entry.failed_at, harness.now());
    assert_eq!(entry.deleted_at, None);
    assert_eq!(
        entry.payload,
        serde_json::json!({
            "id": event.id.to_string(),
            "eventType": "grade.created",
            "data": {"gradeId": "g1", "score": 92},
            "timestamp": format_webhook_timestamp(event.created_at),
        })
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_archive_is_idempotent_per_delivery() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());
    let (config, _, delivery) = harness.create_pending_delivery(TEST_WEBHOOK_URL).await;

    let first = harness
        .dead_letter_archiver
        .archive(&delivery, &config, 500, "boom")
        .await
        .unwrap();
    assert!(first.is_some());

    let second = harness
        .dead_letter_archiver
        .archive(&delivery, &config, 500, "boom")
        .await
        .unwrap();
    assert_eq!(second, None);

    let entries = harness
        .dead_letter_repo
        .list_by_event_type(&WebhookEventTypeCatalog::grade_created())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(Some(entries[0].id), first);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_archive_without_event_writes_nothing() {
    let harness = WebhookServicesHarness::new(MockWebhookSender::new());

    let config = harness
        .create_config(
            TEST_WEBHOOK_URL,
            vec![WebhookEventTypeCatalog::grade_created()],
        )
        .await;
    let delivery = harness
        .create_delivery(WebhookEventID::new(uuid::Uuid::new_v4()), config.id)
        .await;

    let res = harness
        .dead_letter_archiver
        .archive(&delivery, &config, 0, "Failed to connect")
        .await
        .unwrap();
    assert_eq!(res, None);

    assert!(
        harness
            .dead_letter_repo
            .list_by_config_id(config.id)
            .await
            .unwrap()
            .is_empty()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
