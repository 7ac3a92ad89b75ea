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

use crate::{ConcurrentModificationError, WebhookConfig, WebhookConfigID, WebhookEventType};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
pub trait WebhookConfigRepository: Send + Sync {
    async fn create(&self, config: &WebhookConfig) -> Result<(), CreateWebhookConfigError>;

    /// Stores the config if its `version` matches the stored one.
    /// Returns the stored record with the bumped version.
    async fn update(&self, config: WebhookConfig)
    -> Result<WebhookConfig, UpdateWebhookConfigError>;

    /// Soft-deleted configs are not returned
    async fn get_by_id(
        &self,
        config_id: WebhookConfigID,
    ) -> Result<Option<WebhookConfig>, GetWebhookConfigError>;

    /// Active, non-deleted configs subscribed to the event type
    async fn list_eligible_by_event_type(
        &self,
        event_type: &WebhookEventType,
    ) -> Result<Vec<WebhookConfig>, ListWebhookConfigsError>;

    async fn soft_delete(
        &self,
        config_id: WebhookConfigID,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), DeleteWebhookConfigError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum CreateWebhookConfigError {
    #[error(transparent)]
    Duplicate(WebhookConfigDuplicateError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(thiserror::Error, Debug)]
#[error("Webhook config id='{config_id}' already exists")]
pub struct WebhookConfigDuplicateError {
    pub config_id: WebhookConfigID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum UpdateWebhookConfigError {
    #[error(transparent)]
    NotFound(WebhookConfigNotFoundError),

    #[error(transparent)]
    ConcurrentModification(ConcurrentModificationError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum GetWebhookConfigError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum ListWebhookConfigsError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum DeleteWebhookConfigError {
    #[error(transparent)]
    NotFound(WebhookConfigNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
#[error("Webhook config id='{config_id}' not found")]
pub struct WebhookConfigNotFoundError {
    pub config_id: WebhookConfigID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
