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
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct WebhookSenderImpl {
    client: reqwest::Client,
    request_timeout: std::time::Duration,
    time_source: Arc<dyn SystemTimeSource>,
}

#[dill::component(pub)]
#[dill::interface(dyn WebhookSender)]
impl WebhookSenderImpl {
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(webhooks_config: Arc<WebhooksConfig>, time_source: Arc<dyn SystemTimeSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            request_timeout: webhooks_config.request_timeout.to_std().unwrap_or_default(),
            time_source,
        }
    }

    fn map_transport_error(&self, target_url: &url::Url, e: reqwest::Error) -> WebhookSendError {
        if e.is_timeout() {
            WebhookSendError::ConnectionTimeout(WebhookSendConnectionTimeoutError {
                target_url: target_url.clone(),
                timeout: self.request_timeout,
            })
        } else if e.is_connect() {
            WebhookSendError::FailedToConnect(WebhookSendFailedToConnectError {
                target_url: target_url.clone(),
            })
        } else {
            WebhookSendError::Internal(e.int_err())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl WebhookSender for WebhookSenderImpl {
    #[tracing::instrument(level = "debug", skip_all, fields(%target_url))]
    async fn send_webhook(
        &self,
        target_url: url::Url,
        payload: bytes::Bytes,
        headers: http::HeaderMap,
    ) -> Result<WebhookResponse, WebhookSendError> {
        let response = self
            .client
            .post(target_url.clone())
            .headers(headers)
            .body(payload)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&target_url, e))?;

        let status_code = response.status();
        let response_headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(&target_url, e))?;

        tracing::debug!(%status_code, "Webhook response received");

        Ok(WebhookResponse::new(
            status_code,
            response_headers,
            body,
            self.time_source.now(),
        ))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
