// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, SecondsFormat, Utc};
use internal_error::{InternalError, ResultIntoInternal};
use serde::{Deserialize, Serialize};

use crate::{WebhookEvent, WebhookEventID, WebhookEventType};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Formats a timestamp the way it appears both in the payload body and in
/// the timestamp header
pub fn format_webhook_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Body sent to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub id: WebhookEventID,
    pub event_type: WebhookEventType,
    pub data: serde_json::Value,
    pub timestamp: String,
}

impl WebhookPayload {
    pub fn from_event(event: &WebhookEvent) -> Self {
        Self {
            id: event.id,
            event_type: event.event_type.clone(),
            data: event.data.clone(),
            timestamp: format_webhook_timestamp(event.created_at),
        }
    }

    /// Canonical bytes: both signed and sent as the request body
    pub fn to_bytes(&self) -> Result<bytes::Bytes, InternalError> {
        let raw = serde_json::to_vec(self).int_err()?;
        Ok(bytes::Bytes::from(raw))
    }

    pub fn to_json(&self) -> Result<serde_json::Value, InternalError> {
        serde_json::to_value(self).int_err()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
