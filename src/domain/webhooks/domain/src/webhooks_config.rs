// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::Duration;
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};

use crate::WebhookRetryPolicy;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_MAX_WEBHOOK_RETRIES: u32 = 5;
pub const DEFAULT_WEBHOOK_REQUEST_TIMEOUT_MS: i64 = 30_000;
pub const DEFAULT_WEBHOOK_CONCURRENCY_LIMIT: usize = 5;
pub const DEFAULT_CIRCUIT_BREAKER_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_CIRCUIT_BREAKER_COOLDOWN_MS: i64 = 60_000;
pub const DEFAULT_WEBHOOK_DELIVERY_POLLING_INTERVAL_MS: i64 = 10_000;
pub const DEFAULT_WEBHOOK_USER_AGENT: &str = "Courier-Webhook/1.0";

/// 1s, 5s, 30s, 2m, 10m
pub const DEFAULT_WEBHOOK_RETRY_DELAYS_MS: [i64; 5] = [1_000, 5_000, 30_000, 120_000, 600_000];

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Tunables of the delivery engine. Durations are given in milliseconds when
/// deserialized; every field may be omitted and falls back to its default.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhooksConfig {
    /// Number of failed attempts after which a delivery is dead-lettered
    pub max_retries: u32,

    /// Delay before the next attempt, indexed by attempts made so far.
    /// The last entry repeats once the table is exhausted.
    #[serde_as(as = "Vec<DurationMilliSeconds<i64>>")]
    pub retry_delays: Vec<Duration>,

    #[serde_as(as = "DurationMilliSeconds<i64>")]
    pub request_timeout: Duration,

    /// Maximum number of deliveries in flight within one batch
    pub concurrency_limit: usize,

    pub circuit_breaker_failure_threshold: u32,

    #[serde_as(as = "DurationMilliSeconds<i64>")]
    pub circuit_breaker_cooldown: Duration,

    #[serde_as(as = "DurationMilliSeconds<i64>")]
    pub delivery_polling_interval: Duration,

    pub user_agent: String,
}

impl WebhooksConfig {
    pub fn retry_policy(&self) -> WebhookRetryPolicy {
        WebhookRetryPolicy::new(self.max_retries, self.retry_delays.clone())
    }
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_WEBHOOK_RETRIES,
            retry_delays: DEFAULT_WEBHOOK_RETRY_DELAYS_MS
                .iter()
                .map(|ms| Duration::milliseconds(*ms))
                .collect(),
            request_timeout: Duration::milliseconds(DEFAULT_WEBHOOK_REQUEST_TIMEOUT_MS),
            concurrency_limit: DEFAULT_WEBHOOK_CONCURRENCY_LIMIT,
            circuit_breaker_failure_threshold: DEFAULT_CIRCUIT_BREAKER_FAILURE_THRESHOLD,
            circuit_breaker_cooldown: Duration::milliseconds(DEFAULT_CIRCUIT_BREAKER_COOLDOWN_MS),
            delivery_polling_interval: Duration::milliseconds(
                DEFAULT_WEBHOOK_DELIVERY_POLLING_INTERVAL_MS,
            ),
            user_agent: DEFAULT_WEBHOOK_USER_AGENT.to_string(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
