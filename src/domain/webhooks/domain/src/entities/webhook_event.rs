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
pub struct WebhookEventID(uuid::Uuid);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Dotted event type name, matched case-sensitively
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        Debug,
        Display,
        AsRef,
        Clone,
        Hash,
        Ord,
        PartialOrd,
        Eq,
        PartialEq,
        Serialize,
        Deserialize
    )
)]
pub struct WebhookEventType(String);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct WebhookEventTypeCatalog {}

impl WebhookEventTypeCatalog {
    pub const TEST: &'static str = "webhook.test";
    pub const GRADE_CREATED: &'static str = "grade.created";
    pub const GRADE_UPDATED: &'static str = "grade.updated";
    pub const USER_UPDATED: &'static str = "user.updated";
    pub const ANNOUNCEMENT_POSTED: &'static str = "announcement.posted";

    pub fn test() -> WebhookEventType {
        WebhookEventType::try_new(Self::TEST).unwrap()
    }

    pub fn grade_created() -> WebhookEventType {
        WebhookEventType::try_new(Self::GRADE_CREATED).unwrap()
    }

    pub fn grade_updated() -> WebhookEventType {
        WebhookEventType::try_new(Self::GRADE_UPDATED).unwrap()
    }

    pub fn user_updated() -> WebhookEventType {
        WebhookEventType::try_new(Self::USER_UPDATED).unwrap()
    }

    pub fn announcement_posted() -> WebhookEventType {
        WebhookEventType::try_new(Self::ANNOUNCEMENT_POSTED).unwrap()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A domain occurrence that subscribers may be notified about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub id: WebhookEventID,
    pub event_type: WebhookEventType,
    pub data: serde_json::Value,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn new(
        id: WebhookEventID,
        event_type: WebhookEventType,
        data: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_type,
            data,
            processed: false,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn mark_processed(&mut self, now: DateTime<Utc>) {
        if !self.processed {
            self.processed = true;
            self.updated_at = now;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
