// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod inmem_dead_letter_webhook_repository;
mod inmem_webhook_config_repository;
mod inmem_webhook_delivery_repository;
mod inmem_webhook_event_repository;

pub use inmem_dead_letter_webhook_repository::*;
pub use inmem_webhook_config_repository::*;
pub use inmem_webhook_delivery_repository::*;
pub use inmem_webhook_event_repository::*;
