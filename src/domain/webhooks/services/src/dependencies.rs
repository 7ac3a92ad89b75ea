// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use dill::CatalogBuilder;

use crate::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Registers the delivery engine. Repositories, a `WebhooksConfig` value and
/// a `SystemTimeSource` are expected to be provided by the host.
pub fn register_dependencies(catalog_builder: &mut CatalogBuilder) {
    catalog_builder.add::<CircuitBreakerRegistry>();
    catalog_builder.add::<WebhookSignerImpl>();
    catalog_builder.add::<WebhookSenderImpl>();
    catalog_builder.add::<WebhookEventPublisherImpl>();
    catalog_builder.add::<WebhookDeliveryExecutorImpl>();
    catalog_builder.add::<WebhookDeliveryProcessorImpl>();
    catalog_builder.add::<DeadLetterArchiverImpl>();
    catalog_builder.add::<WebhookDeliveryAgent>();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
