// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;

use crate::WebhookDeliveryOutcome;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
pub trait WebhookDeliveryProcessor: Send + Sync {
    /// Attempts every due pending delivery in bounded-concurrency batches.
    /// Fails only if the due deliveries could not be listed.
    async fn process_pending_deliveries(
        &self,
    ) -> Result<WebhookDeliveryBatchSummary, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WebhookDeliveryBatchSummary {
    pub delivered: usize,
    pub rescheduled: usize,
    pub dead_lettered: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl WebhookDeliveryBatchSummary {
    pub fn record(&mut self, outcome: &WebhookDeliveryOutcome) {
        match outcome {
            WebhookDeliveryOutcome::Delivered { .. } => self.delivered += 1,
            WebhookDeliveryOutcome::Rescheduled { .. } => self.rescheduled += 1,
            WebhookDeliveryOutcome::DeadLettered { .. } => self.dead_lettered += 1,
            WebhookDeliveryOutcome::Failed { .. } => self.failed += 1,
            WebhookDeliveryOutcome::Skipped => self.skipped += 1,
            WebhookDeliveryOutcome::Errored => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.delivered
            + self.rescheduled
            + self.dead_lettered
            + self.failed
            + self.skipped
            + self.errored
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
