// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use nutype::nutype;

use crate::{WebhookConfigID, WebhookDeliveryID, WebhookEventID, WebhookEventType};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[nutype(derive(
    Debug,
    Display,
    Clone,
    Copy,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize
))]
pub struct DeadLetterWebhookID(uuid::Uuid);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Snapshot of a delivery that exhausted its retries. Self-contained, so it
/// stays readable after the originating config or event is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterWebhook {
    pub id: DeadLetterWebhookID,
    pub delivery_id: WebhookDeliveryID,
    pub event_id: WebhookEventID,
    pub webhook_config_id: WebhookConfigID,
    pub event_type: WebhookEventType,
    pub url: url::Url,
    pub payload: serde_json::Value,
    pub status_code: u16,
    pub attempts: u32,
    pub error_message: String,
    pub failed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
