// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Duration, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};

use crate::{WebhookConfigID, WebhookEventID};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Longest error text kept on a delivery record
pub const MAX_WEBHOOK_ERROR_MESSAGE_LENGTH: usize = 4096;

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
pub struct WebhookDeliveryID(uuid::Uuid);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WebhookDeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Deterministic key identifying the one delivery of an event to a config
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookIdempotencyKey(String);

impl WebhookIdempotencyKey {
    pub fn new(event_id: WebhookEventID, webhook_config_id: WebhookConfigID) -> Self {
        Self(format!("{event_id}:{webhook_config_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WebhookIdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRetryPolicy {
    pub max_retries: u32,
    pub retry_delays: Vec<Duration>,
}

impl WebhookRetryPolicy {
    pub fn new(max_retries: u32, retry_delays: Vec<Duration>) -> Self {
        Self {
            max_retries,
            retry_delays,
        }
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_retries
    }

    /// Delay to wait after `attempts` failed attempts. Past the end of the
    /// table the last delay is reused.
    pub fn delay_after(&self, attempts: u32) -> Duration {
        let Some(last_index) = self.retry_delays.len().checked_sub(1) else {
            return Duration::zero();
        };
        let index = usize::try_from(attempts).unwrap_or(usize::MAX).min(last_index);
        self.retry_delays[index]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFailedAttemptVerdict {
    RetryScheduled { next_attempt_at: DateTime<Utc> },
    Exhausted,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One attempt-tracked dispatch of an event to one config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDelivery {
    pub id: WebhookDeliveryID,
    pub event_id: WebhookEventID,
    pub webhook_config_id: WebhookConfigID,
    pub status: WebhookDeliveryStatus,
    pub attempts: u32,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub idempotency_key: WebhookIdempotencyKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl WebhookDelivery {
    /// Creates a pending delivery eligible for its first attempt right away
    pub fn new(
        id: WebhookDeliveryID,
        event_id: WebhookEventID,
        webhook_config_id: WebhookConfigID,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_id,
            webhook_config_id,
            status: WebhookDeliveryStatus::Pending,
            attempts: 0,
            status_code: None,
            error_message: None,
            next_attempt_at: Some(created_at),
            idempotency_key: WebhookIdempotencyKey::new(event_id, webhook_config_id),
            created_at,
            updated_at: created_at,
            deleted_at: None,
            version: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WebhookDeliveryStatus::Pending
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_pending()
            && self.deleted_at.is_none()
            && self.next_attempt_at.is_some_and(|at| at <= now)
    }

    pub fn mark_delivered(&mut self, status_code: u16, now: DateTime<Utc>) {
        self.status = WebhookDeliveryStatus::Delivered;
        self.attempts += 1;
        self.status_code = Some(status_code);
        self.error_message = None;
        self.next_attempt_at = None;
        self.updated_at = now;
    }

    /// Terminal failure that does not count as a delivery attempt
    pub fn mark_failed(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = WebhookDeliveryStatus::Failed;
        self.error_message = Some(truncate_error_message(reason.into()));
        self.next_attempt_at = None;
        self.updated_at = now;
    }

    /// Counts a failed attempt and either schedules a retry or stops retrying
    pub fn register_failed_attempt(
        &mut self,
        status_code: u16,
        error_message: impl Into<String>,
        retry_policy: &WebhookRetryPolicy,
        now: DateTime<Utc>,
    ) -> WebhookFailedAttemptVerdict {
        self.attempts += 1;
        self.status_code = Some(status_code);
        self.error_message = Some(truncate_error_message(error_message.into()));
        self.updated_at = now;

        if retry_policy.is_exhausted(self.attempts) {
            self.status = WebhookDeliveryStatus::Failed;
            self.next_attempt_at = None;
            WebhookFailedAttemptVerdict::Exhausted
        } else {
            let next_attempt_at = now + retry_policy.delay_after(self.attempts);
            self.next_attempt_at = Some(next_attempt_at);
            WebhookFailedAttemptVerdict::RetryScheduled { next_attempt_at }
        }
    }

    /// Puts a delivery back in the queue without counting an attempt. Used
    /// when an exhausted delivery could not be archived yet.
    pub fn postpone(&mut self, next_attempt_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.status = WebhookDeliveryStatus::Pending;
        self.next_attempt_at = Some(next_attempt_at);
        self.updated_at = now;
    }
}

fn truncate_error_message(message: String) -> String {
    if message.chars().count() <= MAX_WEBHOOK_ERROR_MESSAGE_LENGTH {
        message
    } else {
        message
            .chars()
            .take(MAX_WEBHOOK_ERROR_MESSAGE_LENGTH)
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
