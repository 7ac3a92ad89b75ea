// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use courier_webhooks::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn new_config(
    url: &str,
    event_types: impl IntoIterator<Item = WebhookEventType>,
    created_at: DateTime<Utc>,
) -> WebhookConfig {
    WebhookConfig::new(
        WebhookConfigID::new(uuid::Uuid::new_v4()),
        url::Url::parse(url).unwrap(),
        event_types,
        WebhookSecret::new("test-secret"),
        created_at,
    )
}

pub(crate) fn new_event(event_type: WebhookEventType, created_at: DateTime<Utc>) -> WebhookEvent {
    WebhookEvent::new(
        WebhookEventID::new(uuid::Uuid::new_v4()),
        event_type,
        serde_json::json!({"key": "value"}),
        created_at,
    )
}

pub(crate) fn new_delivery(
    event_id: WebhookEventID,
    config_id: WebhookConfigID,
    created_at: DateTime<Utc>,
) -> WebhookDelivery {
    WebhookDelivery::new(
        WebhookDeliveryID::new(uuid::Uuid::new_v4()),
        event_id,
        config_id,
        created_at,
    )
}

pub(crate) fn new_dead_letter(
    config: &WebhookConfig,
    event_type: WebhookEventType,
    failed_at: DateTime<Utc>,
) -> DeadLetterWebhook {
    DeadLetterWebhook {
        id: DeadLetterWebhookID::new(uuid::Uuid::new_v4()),
        delivery_id: WebhookDeliveryID::new(uuid::Uuid::new_v4()),
        event_id: WebhookEventID::new(uuid::Uuid::new_v4()),
        webhook_config_id: config.id,
        event_type,
        url: config.url.clone(),
        payload: serde_json::json!({"key": "value"}),
        status_code: 500,
        attempts: 5,
        error_message: "Internal Server Error".to_string(),
        failed_at,
        created_at: failed_at,
        deleted_at: None,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
