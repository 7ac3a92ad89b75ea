// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use courier_webhooks::{WebhookSecret, WebhookSigner};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct WebhookSignerImpl {}

#[dill::component(pub)]
#[dill::interface(dyn WebhookSigner)]
impl WebhookSignerImpl {
    pub fn new() -> Self {
        Self {}
    }

    fn key(secret: &WebhookSecret) -> ring::hmac::Key {
        ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret.expose_bytes())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

impl WebhookSigner for WebhookSignerImpl {
    fn sign(&self, payload: &[u8], secret: &WebhookSecret) -> String {
        let tag = ring::hmac::sign(&Self::key(secret), payload);
        hex::encode(tag.as_ref())
    }

    fn verify(&self, payload: &[u8], secret: &WebhookSecret, signature: &str) -> bool {
        let Ok(expected_tag) = hex::decode(signature) else {
            return false;
        };

        // ring compares tags in constant time
        ring::hmac::verify(&Self::key(secret), payload, &expected_tag).is_ok()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
