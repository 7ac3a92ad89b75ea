// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use courier_webhooks::*;
use dill::{component, interface};
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn WebhookDeliveryProcessor)]
pub struct WebhookDeliveryProcessorImpl {
    webhook_delivery_repo: Arc<dyn WebhookDeliveryRepository>,
    webhook_delivery_executor: Arc<dyn WebhookDeliveryExecutor>,
    webhooks_config: Arc<WebhooksConfig>,
    time_source: Arc<dyn SystemTimeSource>,
}

#[async_trait::async_trait]
impl WebhookDeliveryProcessor for WebhookDeliveryProcessorImpl {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn process_pending_deliveries(
        &self,
    ) -> Result<WebhookDeliveryBatchSummary, InternalError> {
        let due_deliveries = self
            .webhook_delivery_repo
            .list_due_pending(self.time_source.now())
            .await
            .int_err()?;

        let mut summary = WebhookDeliveryBatchSummary::default();
        if due_deliveries.is_empty() {
            return Ok(summary);
        }

        let concurrency_limit = self.webhooks_config.concurrency_limit.max(1);

        tracing::debug!(
            due = due_deliveries.len(),
            concurrency_limit,
            "Processing due webhook deliveries"
        );

        for chunk in due_deliveries.chunks(concurrency_limit) {
            let outcomes = futures::future::join_all(
                chunk
                    .iter()
                    .map(|delivery| self.webhook_delivery_executor.attempt_delivery(delivery)),
            )
            .await;

            for outcome in &outcomes {
                summary.record(outcome);
            }
        }

        tracing::info!(
            delivered = summary.delivered,
            rescheduled = summary.rescheduled,
            dead_lettered = summary.dead_lettered,
            failed = summary.failed,
            skipped = summary.skipped,
            errored = summary.errored,
            "Webhook delivery batch processed"
        );

        Ok(summary)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
