// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use courier_webhooks::WebhooksConfig;
use dill::*;
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through, consecutive failures are counted
    Closed,
    /// Calls are rejected until the cooldown elapses
    Open,
    /// A single trial call decides between closing and re-opening
    HalfOpen,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum CircuitBreakerError<E> {
    #[error(transparent)]
    Open(CircuitOpenError),

    #[error(transparent)]
    Operation(E),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Circuit breaker is open for {url}, next trial allowed at {next_trial_at}")]
pub struct CircuitOpenError {
    pub url: String,
    pub next_trial_at: DateTime<Utc>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerStatus {
    pub url: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub opened_at: Option<DateTime<Utc>>,
    pub next_trial_at: Option<DateTime<Utc>>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Per-destination failure guard. Only failures of the wrapped operation
/// count; whatever the operation returns as `Ok` is a success.
pub struct CircuitBreaker {
    url: String,
    failure_threshold: u32,
    cooldown: Duration,
    time_source: Arc<dyn SystemTimeSource>,
    state: Mutex<CircuitBreakerState>,
}

struct CircuitBreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<DateTime<Utc>>,
    trial_in_flight: bool,
}

impl CircuitBreaker {
    pub fn new(
        url: impl Into<String>,
        failure_threshold: u32,
        cooldown: Duration,
        time_source: Arc<dyn SystemTimeSource>,
    ) -> Self {
        Self {
            url: url.into(),
            failure_threshold: failure_threshold.max(1),
            cooldown,
            time_source,
            state: Mutex::new(CircuitBreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> CircuitBreakerStatus {
        let state = self.state.lock().unwrap();
        CircuitBreakerStatus {
            url: self.url.clone(),
            state: state.state,
            consecutive_failures: state.consecutive_failures,
            opened_at: state.opened_at,
            next_trial_at: match state.state {
                CircuitState::Open => state.opened_at.map(|at| at + self.cooldown),
                CircuitState::Closed | CircuitState::HalfOpen => None,
            },
        }
    }

    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut permit = self.acquire().map_err(CircuitBreakerError::Open)?;

        let result = operation().await;

        permit.completed = true;
        match result {
            Ok(value) => {
                self.on_success(permit.is_trial);
                Ok(value)
            }
            Err(e) => {
                self.on_failure(permit.is_trial);
                Err(CircuitBreakerError::Operation(e))
            }
        }
    }

    fn acquire(&self) -> Result<CallPermit<'_>, CircuitOpenError> {
        let mut state = self.state.lock().unwrap();

        match state.state {
            CircuitState::Closed => {}
            CircuitState::Open => {
                let opened_at = state.opened_at.unwrap_or_else(|| self.time_source.now());
                let next_trial_at = opened_at + self.cooldown;
                if self.time_source.now() < next_trial_at {
                    return Err(CircuitOpenError {
                        url: self.url.clone(),
                        next_trial_at,
                    });
                }

                tracing::info!(url = %self.url, "Circuit breaker half-open, allowing a trial call");
                state.state = CircuitState::HalfOpen;
                state.trial_in_flight = true;
                return Ok(CallPermit::new(self, true));
            }
            CircuitState::HalfOpen => {
                if state.trial_in_flight {
                    return Err(CircuitOpenError {
                        url: self.url.clone(),
                        next_trial_at: self.time_source.now(),
                    });
                }
                state.trial_in_flight = true;
                return Ok(CallPermit::new(self, true));
            }
        }

        Ok(CallPermit::new(self, false))
    }

    fn on_success(&self, is_trial: bool) {
        let mut state = self.state.lock().unwrap();

        match state.state {
            CircuitState::Closed => {
                state.consecutive_failures = 0;
            }
            CircuitState::HalfOpen if is_trial => {
                tracing::info!(url = %self.url, "Circuit breaker closed");
                state.state = CircuitState::Closed;
                state.consecutive_failures = 0;
                state.opened_at = None;
                state.trial_in_flight = false;
            }
            // Calls admitted before the circuit opened don't get to close it
            CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    fn on_failure(&self, is_trial: bool) {
        let mut state = self.state.lock().unwrap();
        let now = self.time_source.now();

        state.consecutive_failures += 1;

        match state.state {
            CircuitState::HalfOpen if is_trial => {
                tracing::warn!(url = %self.url, "Circuit breaker trial call failed, re-opening");
                state.state = CircuitState::Open;
                state.opened_at = Some(now);
                state.trial_in_flight = false;
            }
            CircuitState::Closed if state.consecutive_failures >= self.failure_threshold => {
                tracing::warn!(
                    url = %self.url,
                    consecutive_failures = state.consecutive_failures,
                    "Circuit breaker opened"
                );
                state.state = CircuitState::Open;
                state.opened_at = Some(now);
            }
            CircuitState::Closed | CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    fn on_abandoned_trial(&self) {
        let mut state = self.state.lock().unwrap();
        if state.state == CircuitState::HalfOpen {
            state.trial_in_flight = false;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Releases a half-open trial slot if the guarded call is dropped midway
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    is_trial: bool,
    completed: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, is_trial: bool) -> Self {
        Self {
            breaker,
            is_trial,
            completed: false,
        }
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.is_trial && !self.completed {
            self.breaker.on_abandoned_trial();
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Holds one breaker per destination, created on first use
pub struct CircuitBreakerRegistry {
    failure_threshold: u32,
    cooldown: Duration,
    time_source: Arc<dyn SystemTimeSource>,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

#[component(pub)]
#[scope(Singleton)]
impl CircuitBreakerRegistry {
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(webhooks_config: Arc<WebhooksConfig>, time_source: Arc<dyn SystemTimeSource>) -> Self {
        Self::with_settings(
            webhooks_config.circuit_breaker_failure_threshold,
            webhooks_config.circuit_breaker_cooldown,
            time_source,
        )
    }

    pub fn with_settings(
        failure_threshold: u32,
        cooldown: Duration,
        time_source: Arc<dyn SystemTimeSource>,
    ) -> Self {
        Self {
            failure_threshold,
            cooldown,
            time_source,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, url: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap();

        if let Some(breaker) = breakers.get(url) {
            return breaker.clone();
        }

        let breaker = Arc::new(CircuitBreaker::new(
            url,
            self.failure_threshold,
            self.cooldown,
            self.time_source.clone(),
        ));
        breakers.insert(url.to_string(), breaker.clone());
        breaker
    }

    /// Snapshot of every known breaker, sorted by URL
    pub fn statuses(&self) -> Vec<CircuitBreakerStatus> {
        let breakers: Vec<_> = self.breakers.lock().unwrap().values().cloned().collect();

        let mut statuses: Vec<_> = breakers.iter().map(|b| b.status()).collect();
        statuses.sort_by(|a, b| a.url.cmp(&b.url));
        statuses
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
