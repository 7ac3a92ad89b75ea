// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;

use crate::{WebhookDeliveryID, WebhookEventID, WebhookEventNotFoundError, WebhookEventType};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
pub trait WebhookEventPublisher: Send + Sync {
    /// Records the event and one pending delivery per eligible subscriber.
    /// Returns `None` and stores nothing when nobody subscribes to the type.
    async fn trigger_event(
        &self,
        event_type: WebhookEventType,
        data: serde_json::Value,
    ) -> Result<Option<WebhookEventID>, TriggerWebhookEventError>;

    /// Creates deliveries for an already recorded event, skipping configs
    /// that already have one. Returns the ids of newly created deliveries.
    async fn fan_out_event(
        &self,
        event_id: WebhookEventID,
    ) -> Result<Vec<WebhookDeliveryID>, FanOutWebhookEventError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum TriggerWebhookEventError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(thiserror::Error, Debug)]
pub enum FanOutWebhookEventError {
    #[error(transparent)]
    EventNotFound(WebhookEventNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
