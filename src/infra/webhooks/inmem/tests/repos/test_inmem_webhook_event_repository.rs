// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use courier_webhooks_inmem::InMemoryWebhookEventRepository;
use courier_webhooks_repo_tests::webhook_event_repository_test_suite as suite;
use dill::{Catalog, CatalogBuilder};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

inmem_repository_test!(
    suite = suite,
    fixture = test_get_missing_event,
    harness = InMemoryWebhookEventRepositoryHarness
);

inmem_repository_test!(
    suite = suite,
    fixture = test_create_and_get_event,
    harness = InMemoryWebhookEventRepositoryHarness
);

inmem_repository_test!(
    suite = suite,
    fixture = test_mark_event_processed,
    harness = InMemoryWebhookEventRepositoryHarness
);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct InMemoryWebhookEventRepositoryHarness {
    catalog: Catalog,
}

impl InMemoryWebhookEventRepositoryHarness {
    pub fn new() -> Self {
        let mut catalog_builder = CatalogBuilder::new();
        catalog_builder.add::<InMemoryWebhookEventRepository>();

        Self {
            catalog: catalog_builder.build(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
