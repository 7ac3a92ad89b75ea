// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod dead_letter_archiver;
mod webhook_delivery_executor;
mod webhook_delivery_processor;
mod webhook_event_publisher;
mod webhook_sender;
mod webhook_signer;

pub use dead_letter_archiver::*;
pub use webhook_delivery_executor::*;
pub use webhook_delivery_processor::*;
pub use webhook_event_publisher::*;
pub use webhook_sender::*;
pub use webhook_signer::*;
