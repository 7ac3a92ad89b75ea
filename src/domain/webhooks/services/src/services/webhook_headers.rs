// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const HEADER_WEBHOOK_SIGNATURE: &str = "x-webhook-signature";
pub const HEADER_WEBHOOK_ID: &str = "x-webhook-id";
pub const HEADER_WEBHOOK_TIMESTAMP: &str = "x-webhook-timestamp";

pub const WEBHOOK_CONTENT_TYPE: &str = "application/json";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
