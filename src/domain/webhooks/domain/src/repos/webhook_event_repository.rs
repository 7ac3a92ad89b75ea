// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use internal_error::InternalError;

use crate::{WebhookEvent, WebhookEventID};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn create_event(&self, event: &WebhookEvent) -> Result<(), CreateWebhookEventError>;

    async fn get_event_by_id(
        &self,
        event_id: WebhookEventID,
    ) -> Result<WebhookEvent, GetWebhookEventError>;

    /// Idempotent: the first call wins and later calls keep its timestamp
    async fn mark_processed(
        &self,
        event_id: WebhookEventID,
        processed_at: DateTime<Utc>,
    ) -> Result<(), MarkWebhookEventProcessedError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum CreateWebhookEventError {
    #[error(transparent)]
    Duplicate(WebhookEventDuplicateError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(thiserror::Error, Debug)]
#[error("Webhook event id='{event_id}' already exists")]
pub struct WebhookEventDuplicateError {
    pub event_id: WebhookEventID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum GetWebhookEventError {
    #[error(transparent)]
    NotFound(WebhookEventNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum MarkWebhookEventProcessedError {
    #[error(transparent)]
    NotFound(WebhookEventNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
#[error("Webhook event id='{event_id}' not found")]
pub struct WebhookEventNotFoundError {
    pub event_id: WebhookEventID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
