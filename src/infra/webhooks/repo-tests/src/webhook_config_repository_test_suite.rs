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

pub async fn test_no_configs_initially(catalog: &Catalog) {
    let config_repo = catalog.get_one::<dyn WebhookConfigRepository>().unwrap();

    let res = config_repo
        .get_by_id(WebhookConfigID::new(uuid::Uuid::new_v4()))
        .await;
    assert_matches!(res, Ok(None));

    let res = config_repo
        .list_eligible_by_event_type(&WebhookEventTypeCatalog::grade_created())
        .await;
    assert_matches!(res, Ok(configs) if configs.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_create_and_get_config(catalog: &Catalog) {
    let config_repo = catalog.get_one::<dyn WebhookConfigRepository>().unwrap();

    let config = new_config(
        "https://example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        Utc::now(),
    );
    let res = config_repo.create(&config).await;
    assert_matches!(res, Ok(()));

    let res = config_repo.get_by_id(config.id).await;
    assert_matches!(res, Ok(Some(stored)) if stored == config);

    let res = config_repo.create(&config).await;
    assert_matches!(
        res,
        Err(CreateWebhookConfigError::Duplicate(WebhookConfigDuplicateError { config_id }))
            if config_id == config.id
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_list_eligible_by_event_type(catalog: &Catalog) {
    let config_repo = catalog.get_one::<dyn WebhookConfigRepository>().unwrap();
    let now = Utc::now();

    let subscribed = new_config(
        "https://a.example.com/hook",
        [
            WebhookEventTypeCatalog::grade_created(),
            WebhookEventTypeCatalog::grade_updated(),
        ],
        now,
    );
    let also_subscribed = new_config(
        "https://b.example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now + Duration::seconds(1),
    );
    let mut inactive = new_config(
        "https://c.example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now,
    );
    inactive.deactivate(now);
    let deleted = new_config(
        "https://d.example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now,
    );
    let other_type = new_config(
        "https://e.example.com/hook",
        [WebhookEventTypeCatalog::user_updated()],
        now,
    );

    for config in [&subscribed, &also_subscribed, &inactive, &deleted, &other_type] {
        config_repo.create(config).await.unwrap();
    }
    config_repo.soft_delete(deleted.id, now).await.unwrap();

    let configs = config_repo
        .list_eligible_by_event_type(&WebhookEventTypeCatalog::grade_created())
        .await
        .unwrap();
    let ids: Vec<_> = configs.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![subscribed.id, also_subscribed.id]);

    let configs = config_repo
        .list_eligible_by_event_type(&WebhookEventTypeCatalog::grade_updated())
        .await
        .unwrap();
    let ids: Vec<_> = configs.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![subscribed.id]);

    let configs = config_repo
        .list_eligible_by_event_type(&WebhookEventTypeCatalog::announcement_posted())
        .await
        .unwrap();
    assert!(configs.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_update_config_versioned(catalog: &Catalog) {
    let config_repo = catalog.get_one::<dyn WebhookConfigRepository>().unwrap();
    let now = Utc::now();

    let config = new_config(
        "https://example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now,
    );
    config_repo.create(&config).await.unwrap();

    let mut first_copy = config.clone();
    first_copy.deactivate(now);
    let updated = config_repo.update(first_copy).await.unwrap();
    assert_eq!(updated.version, config.version + 1);
    assert!(!updated.active);

    // A writer holding the original version loses
    let mut stale_copy = config.clone();
    stale_copy.url = url::Url::parse("https://other.example.com/hook").unwrap();
    let res = config_repo.update(stale_copy).await;
    assert_matches!(
        res,
        Err(UpdateWebhookConfigError::ConcurrentModification(ConcurrentModificationError {
            expected_version: 0,
            actual_version: 1,
            ..
        }))
    );

    let stored = config_repo.get_by_id(config.id).await.unwrap().unwrap();
    assert_eq!(stored, updated);

    let missing = new_config(
        "https://x.example.com/hook",
        Vec::<WebhookEventType>::new(),
        now,
    );
    let res = config_repo.update(missing).await;
    assert_matches!(res, Err(UpdateWebhookConfigError::NotFound(_)));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_soft_delete_config(catalog: &Catalog) {
    let config_repo = catalog.get_one::<dyn WebhookConfigRepository>().unwrap();
    let now = Utc::now();

    let config = new_config(
        "https://example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now,
    );
    config_repo.create(&config).await.unwrap();

    let res = config_repo.soft_delete(config.id, now).await;
    assert_matches!(res, Ok(()));

    let res = config_repo.get_by_id(config.id).await;
    assert_matches!(res, Ok(None));

    let res = config_repo.soft_delete(config.id, now).await;
    assert_matches!(
        res,
        Err(DeleteWebhookConfigError::NotFound(WebhookConfigNotFoundError { config_id }))
            if config_id == config.id
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
