// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};

use crate::WebhookDelivery;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Makes one delivery attempt and records its result. Never fails: every
/// problem, internal ones included, ends up as a delivery state transition.
#[async_trait::async_trait]
pub trait WebhookDeliveryExecutor: Send + Sync {
    async fn attempt_delivery(&self, delivery: &WebhookDelivery) -> WebhookDeliveryOutcome;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDeliveryOutcome {
    Delivered {
        status_code: u16,
    },
    Rescheduled {
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
    },
    DeadLettered {
        attempts: u32,
    },
    Failed {
        reason: WebhookDeliveryFailureReason,
    },
    /// Delivery vanished or is no longer pending
    Skipped,
    /// Storage refused to record even the failed attempt
    Errored,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Terminal failures that do not count as delivery attempts
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookDeliveryFailureReason {
    #[error("Webhook configuration not found")]
    ConfigNotFound,

    #[error("Webhook event not found")]
    EventNotFound,

    #[error("Webhook configuration inactive")]
    ConfigInactive,

    #[error("Circuit breaker open for {url}")]
    CircuitOpen { url: String },
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
