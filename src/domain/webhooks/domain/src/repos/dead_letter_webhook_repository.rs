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

use crate::{
    DeadLetterWebhook,
    DeadLetterWebhookID,
    WebhookConfigID,
    WebhookDeliveryID,
    WebhookEventType,
};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
pub trait DeadLetterWebhookRepository: Send + Sync {
    /// At most one entry per delivery
    async fn create(&self, entry: &DeadLetterWebhook) -> Result<(), CreateDeadLetterWebhookError>;

    async fn get_by_id(
        &self,
        entry_id: DeadLetterWebhookID,
    ) -> Result<Option<DeadLetterWebhook>, GetDeadLetterWebhookError>;

    async fn get_by_delivery_id(
        &self,
        delivery_id: WebhookDeliveryID,
    ) -> Result<Option<DeadLetterWebhook>, GetDeadLetterWebhookError>;

    /// Newest first
    async fn list_by_config_id(
        &self,
        config_id: WebhookConfigID,
    ) -> Result<Vec<DeadLetterWebhook>, ListDeadLetterWebhooksError>;

    /// Newest first
    async fn list_by_event_type(
        &self,
        event_type: &WebhookEventType,
    ) -> Result<Vec<DeadLetterWebhook>, ListDeadLetterWebhooksError>;

    async fn soft_delete(
        &self,
        entry_id: DeadLetterWebhookID,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), DeleteDeadLetterWebhookError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum CreateDeadLetterWebhookError {
    #[error(transparent)]
    AlreadyArchived(DeadLetterWebhookDuplicateError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(thiserror::Error, Debug)]
#[error("Webhook delivery id='{delivery_id}' is already archived")]
pub struct DeadLetterWebhookDuplicateError {
    pub delivery_id: WebhookDeliveryID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum GetDeadLetterWebhookError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum ListDeadLetterWebhooksError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum DeleteDeadLetterWebhookError {
    #[error(transparent)]
    NotFound(DeadLetterWebhookNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(thiserror::Error, Debug)]
#[error("Dead letter webhook id='{entry_id}' not found")]
pub struct DeadLetterWebhookNotFoundError {
    pub entry_id: DeadLetterWebhookID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
