// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;

use crate::WebhookResponse;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait WebhookSender: Send + Sync {
    /// POSTs the payload. Any HTTP response, successful or not, is `Ok`.
    async fn send_webhook(
        &self,
        target_url: url::Url,
        payload: bytes::Bytes,
        headers: http::HeaderMap,
    ) -> Result<WebhookResponse, WebhookSendError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum WebhookSendError {
    #[error(transparent)]
    FailedToConnect(WebhookSendFailedToConnectError),

    #[error(transparent)]
    ConnectionTimeout(WebhookSendConnectionTimeoutError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to connect to {target_url}")]
pub struct WebhookSendFailedToConnectError {
    pub target_url: url::Url,
}

#[derive(thiserror::Error, Debug)]
#[error("Webhook request to {target_url} timed out after {timeout:?}")]
pub struct WebhookSendConnectionTimeoutError {
    pub target_url: url::Url,
    pub timeout: std::time::Duration,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
