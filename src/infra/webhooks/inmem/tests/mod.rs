// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Runs a shared repository fixture against a freshly built in-memory harness
macro_rules! inmem_repository_test {
    (suite = $suite:ident, fixture = $fixture:ident, harness = $harness:ident $(,)?) => {
        #[test_log::test(tokio::test)]
        async fn $fixture() {
            let harness = $harness::new();
            $suite::$fixture(&harness.catalog).await;
        }
    };
}
