// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod circuit_breaker;
mod dead_letter_archiver_impl;
mod webhook_delivery_agent;
mod webhook_delivery_executor_impl;
mod webhook_delivery_processor_impl;
mod webhook_event_publisher_impl;
mod webhook_headers;
mod webhook_sender_impl;
mod webhook_signer_impl;

pub use circuit_breaker::*;
pub use dead_letter_archiver_impl::*;
pub use webhook_delivery_agent::*;
pub use webhook_delivery_executor_impl::*;
pub use webhook_delivery_processor_impl::*;
pub use webhook_event_publisher_impl::*;
pub use webhook_headers::*;
pub use webhook_sender_impl::*;
pub use webhook_signer_impl::*;
