// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::InternalError;

use crate::{DeadLetterWebhookID, WebhookConfig, WebhookDelivery};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
pub trait DeadLetterArchiver: Send + Sync {
    /// Snapshots an exhausted delivery. Returns `None` when there is nothing
    /// to archive: the event is gone or the delivery was archived before.
    async fn archive(
        &self,
        delivery: &WebhookDelivery,
        config: &WebhookConfig,
        status_code: u16,
        error_message: &str,
    ) -> Result<Option<DeadLetterWebhookID>, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
