// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};

use crate::WebhookEventType;

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
pub struct WebhookConfigID(uuid::Uuid);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Shared secret used to sign payloads. Never printed nor serialized: both
/// `Debug` and `Serialize` emit a redacted placeholder.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookSecret {
    value: Vec<u8>,
}

impl WebhookSecret {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose_bytes(&self) -> &[u8] {
        &self.value
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(***)")
    }
}

impl Serialize for WebhookSecret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A subscriber endpoint registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub id: WebhookConfigID,
    pub url: url::Url,
    pub events: BTreeSet<WebhookEventType>,
    pub secret: WebhookSecret,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl WebhookConfig {
    pub fn new(
        id: WebhookConfigID,
        url: url::Url,
        events: impl IntoIterator<Item = WebhookEventType>,
        secret: WebhookSecret,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            url,
            events: events.into_iter().collect(),
            secret,
            active: true,
            created_at,
            updated_at: created_at,
            deleted_at: None,
            version: 0,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Active and not soft-deleted
    pub fn is_eligible(&self) -> bool {
        self.active && !self.is_deleted()
    }

    pub fn is_subscribed_to(&self, event_type: &WebhookEventType) -> bool {
        self.events.contains(event_type)
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.active = true;
        self.updated_at = now;
    }

    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
