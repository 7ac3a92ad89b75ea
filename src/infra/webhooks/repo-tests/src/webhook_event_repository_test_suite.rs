// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use courier_webhooks::*;
use dill::Catalog;

use crate::helpers::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_get_missing_event(catalog: &Catalog) {
    let event_repo = catalog.get_one::<dyn WebhookEventRepository>().unwrap();

    let event_id = WebhookEventID::new(uuid::Uuid::new_v4());
    let res = event_repo.get_event_by_id(event_id).await;
    assert_matches!(
        res,
        Err(GetWebhookEventError::NotFound(WebhookEventNotFoundError { event_id: missing_id }))
            if missing_id == event_id
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_create_and_get_event(catalog: &Catalog) {
    let event_repo = catalog.get_one::<dyn WebhookEventRepository>().unwrap();

    let event = new_event(WebhookEventTypeCatalog::grade_created(), Utc::now());
    let res = event_repo.create_event(&event).await;
    assert_matches!(res, Ok(()));

    let res = event_repo.get_event_by_id(event.id).await;
    assert_matches!(res, Ok(stored) if stored == event);

    let res = event_repo.create_event(&event).await;
    assert_matches!(res, Err(CreateWebhookEventError::Duplicate(_)));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_mark_event_processed(catalog: &Catalog) {
    let event_repo = catalog.get_one::<dyn WebhookEventRepository>().unwrap();
    let now = Utc::now();

    let event = new_event(WebhookEventTypeCatalog::grade_created(), now);
    event_repo.create_event(&event).await.unwrap();

    let first = now + Duration::seconds(1);
    event_repo.mark_processed(event.id, first).await.unwrap();
    event_repo
        .mark_processed(event.id, first + Duration::seconds(1))
        .await
        .unwrap();

    let stored = event_repo.get_event_by_id(event.id).await.unwrap();
    assert!(stored.processed);
    assert_eq!(stored.updated_at, first);

    let res = event_repo
        .mark_processed(WebhookEventID::new(uuid::Uuid::new_v4()), now)
        .await;
    assert_matches!(res, Err(MarkWebhookEventProcessedError::NotFound(_)));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
