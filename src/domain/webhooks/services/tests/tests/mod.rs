// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod webhook_services_harness;

mod test_dead_letter_archiver_impl;
mod test_webhook_delivery_processor_impl;
mod test_webhook_event_publisher_impl;
