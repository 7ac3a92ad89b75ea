// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::WebhookSecret;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// HMAC-SHA256 signature codec over raw payload bytes
pub trait WebhookSigner: Send + Sync {
    /// Lowercase hex digest, 64 characters
    fn sign(&self, payload: &[u8], secret: &WebhookSecret) -> String;

    /// Constant-time comparison. Malformed signatures yield `false`.
    fn verify(&self, payload: &[u8], secret: &WebhookSecret, signature: &str) -> bool;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
