// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod dead_letter_webhook;
mod webhook_config;
mod webhook_delivery;
mod webhook_event;
mod webhook_payload;
mod webhook_response;

pub use dead_letter_webhook::*;
pub use webhook_config::*;
pub use webhook_delivery::*;
pub use webhook_event::*;
pub use webhook_payload::*;
pub use webhook_response::*;
