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
    ConcurrentModificationError,
    WebhookDelivery,
    WebhookDeliveryID,
    WebhookEventID,
    WebhookIdempotencyKey,
};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
pub trait WebhookDeliveryRepository: Send + Sync {
    /// Rejects a delivery whose idempotency key is already taken by a live
    /// (non-deleted) delivery
    async fn create(&self, delivery: &WebhookDelivery) -> Result<(), CreateWebhookDeliveryError>;

    /// Versioned write: succeeds only if the stored version equals
    /// `delivery.version`. Returns the stored record with the bumped version.
    async fn update(
        &self,
        delivery: WebhookDelivery,
    ) -> Result<WebhookDelivery, UpdateWebhookDeliveryError>;

    async fn get_by_id(
        &self,
        delivery_id: WebhookDeliveryID,
    ) -> Result<Option<WebhookDelivery>, GetWebhookDeliveryError>;

    async fn find_by_idempotency_key(
        &self,
        idempotency_key: &WebhookIdempotencyKey,
    ) -> Result<Option<WebhookDelivery>, GetWebhookDeliveryError>;

    /// Pending, non-deleted deliveries with `next_attempt_at <= now`,
    /// oldest schedule first
    async fn list_due_pending(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<WebhookDelivery>, ListWebhookDeliveriesError>;

    async fn list_by_event_id(
        &self,
        event_id: WebhookEventID,
    ) -> Result<Vec<WebhookDelivery>, ListWebhookDeliveriesError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum CreateWebhookDeliveryError {
    #[error(transparent)]
    Duplicate(WebhookDeliveryDuplicateError),

    #[error(transparent)]
    DuplicateIdempotencyKey(WebhookDeliveryDuplicateKeyError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(thiserror::Error, Debug)]
#[error("Webhook delivery id='{delivery_id}' already exists")]
pub struct WebhookDeliveryDuplicateError {
    pub delivery_id: WebhookDeliveryID,
}

#[derive(thiserror::Error, Debug)]
#[error("Webhook delivery with idempotency key '{idempotency_key}' already exists")]
pub struct WebhookDeliveryDuplicateKeyError {
    pub idempotency_key: WebhookIdempotencyKey,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum UpdateWebhookDeliveryError {
    #[error(transparent)]
    NotFound(WebhookDeliveryNotFoundError),

    #[error(transparent)]
    ConcurrentModification(ConcurrentModificationError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum GetWebhookDeliveryError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum ListWebhookDeliveriesError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
#[error("Webhook delivery id='{delivery_id}' not found")]
pub struct WebhookDeliveryNotFoundError {
    pub delivery_id: WebhookDeliveryID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
