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
use dill::*;
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Background loop that periodically drains due webhook deliveries
pub struct WebhookDeliveryAgent {
    webhook_delivery_processor: Arc<dyn WebhookDeliveryProcessor>,
    webhooks_config: Arc<WebhooksConfig>,
    time_source: Arc<dyn SystemTimeSource>,
}

#[component(pub)]
#[scope(Singleton)]
impl WebhookDeliveryAgent {
    pub fn new(
        webhook_delivery_processor: Arc<dyn WebhookDeliveryProcessor>,
        webhooks_config: Arc<WebhooksConfig>,
        time_source: Arc<dyn SystemTimeSource>,
    ) -> Self {
        Self {
            webhook_delivery_processor,
            webhooks_config,
            time_source,
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            polling_interval_ms = self.webhooks_config.delivery_polling_interval.num_milliseconds(),
            "Webhook delivery agent started"
        );

        loop {
            self.run_single_iteration().await;

            self.time_source
                .sleep(self.webhooks_config.delivery_polling_interval)
                .await;
        }
    }

    /// Processes whatever is due right now. Returns `None` if the due
    /// deliveries could not be listed.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn run_single_iteration(&self) -> Option<WebhookDeliveryBatchSummary> {
        match self
            .webhook_delivery_processor
            .process_pending_deliveries()
            .await
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    error_msg = %e.reason(),
                    "Webhook delivery iteration failed"
                );
                None
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
