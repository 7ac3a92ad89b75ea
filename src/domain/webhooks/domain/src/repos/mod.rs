// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod dead_letter_webhook_repository;
mod webhook_config_repository;
mod webhook_delivery_repository;
mod webhook_event_repository;

pub use dead_letter_webhook_repository::*;
pub use webhook_config_repository::*;
pub use webhook_delivery_repository::*;
pub use webhook_event_repository::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Raised by versioned updates when the stored record moved on since it was read
#[derive(thiserror::Error, Debug)]
#[error(
    "Concurrent modification of {entity} id='{entity_id}': expected version {expected_version}, \
     found {actual_version}"
)]
pub struct ConcurrentModificationError {
    pub entity: &'static str,
    pub entity_id: uuid::Uuid,
    pub expected_version: u64,
    pub actual_version: u64,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
