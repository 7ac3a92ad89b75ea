// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use courier_webhooks_inmem::InMemoryWebhookConfigRepository;
use courier_webhooks_repo_tests::webhook_config_repository_test_suite as suite;
use dill::{Catalog, CatalogBuilder};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

inmem_repository_test!(
    suite = suite,
    fixture = test_no_configs_initially,
    harness = InMemoryWebhookConfigRepositoryHarness
);

inmem_repository_test!(
    suite = suite,
    fixture = test_create_and_get_config,
    harness = InMemoryWebhookConfigRepositoryHarness
);

inmem_repository_test!(
    suite = suite,
    fixture = test_list_eligible_by_event_type,
    harness = InMemoryWebhookConfigRepositoryHarness
);

inmem_repository_test!(
    suite = suite,
    fixture = test_update_config_versioned,
    harness = InMemoryWebhookConfigRepositoryHarness
);

inmem_repository_test!(
    suite = suite,
    fixture = test_soft_delete_config,
    harness = InMemoryWebhookConfigRepositoryHarness
);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct InMemoryWebhookConfigRepositoryHarness {
    catalog: Catalog,
}

impl InMemoryWebhookConfigRepositoryHarness {
    pub fn new() -> Self {
        let mut catalog_builder = CatalogBuilder::new();
        catalog_builder.add::<InMemoryWebhookConfigRepository>();

        Self {
            catalog: catalog_builder.build(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
