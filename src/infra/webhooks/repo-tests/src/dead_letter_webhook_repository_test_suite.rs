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

pub async fn test_create_and_get_dead_letter(catalog: &Catalog) {
    let dead_letter_repo = catalog.get_one::<dyn DeadLetterWebhookRepository>().unwrap();

    let config = new_config(
        "https://example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        Utc::now(),
    );
    let entry = new_dead_letter(&config, WebhookEventTypeCatalog::grade_created(), Utc::now());

    let res = dead_letter_repo.create(&entry).await;
    assert_matches!(res, Ok(()));

    let res = dead_letter_repo.get_by_id(entry.id).await;
    assert_matches!(res, Ok(Some(stored)) if stored == entry);

    let res = dead_letter_repo.get_by_delivery_id(entry.delivery_id).await;
    assert_matches!(res, Ok(Some(stored)) if stored.id == entry.id);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_one_dead_letter_per_delivery(catalog: &Catalog) {
    let dead_letter_repo = catalog.get_one::<dyn DeadLetterWebhookRepository>().unwrap();

    let config = new_config(
        "https://example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        Utc::now(),
    );
    let entry = new_dead_letter(&config, WebhookEventTypeCatalog::grade_created(), Utc::now());
    dead_letter_repo.create(&entry).await.unwrap();

    let again = DeadLetterWebhook {
        id: DeadLetterWebhookID::new(uuid::Uuid::new_v4()),
        ..entry.clone()
    };
    let res = dead_letter_repo.create(&again).await;
    assert_matches!(
        res,
        Err(CreateDeadLetterWebhookError::AlreadyArchived(DeadLetterWebhookDuplicateError {
            delivery_id
        })) if delivery_id == entry.delivery_id
    );

    let entries = dead_letter_repo.list_by_config_id(config.id).await.unwrap();
    assert_eq!(entries.len(), 1);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_list_dead_letters(catalog: &Catalog) {
    let dead_letter_repo = catalog.get_one::<dyn DeadLetterWebhookRepository>().unwrap();
    let now = Utc::now();

    let config_a = new_config(
        "https://a.example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now,
    );
    let config_b = new_config(
        "https://b.example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now,
    );

    let older_a = new_dead_letter(
        &config_a,
        WebhookEventTypeCatalog::grade_created(),
        now - Duration::minutes(5),
    );
    let newer_a = new_dead_letter(&config_a, WebhookEventTypeCatalog::user_updated(), now);
    let only_b = new_dead_letter(
        &config_b,
        WebhookEventTypeCatalog::grade_created(),
        now - Duration::minutes(1),
    );

    for entry in [&older_a, &newer_a, &only_b] {
        dead_letter_repo.create(entry).await.unwrap();
    }

    let ids: Vec<_> = dead_letter_repo
        .list_by_config_id(config_a.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![newer_a.id, older_a.id]);

    let ids: Vec<_> = dead_letter_repo
        .list_by_event_type(&WebhookEventTypeCatalog::grade_created())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![only_b.id, older_a.id]);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_soft_delete_dead_letter(catalog: &Catalog) {
    let dead_letter_repo = catalog.get_one::<dyn DeadLetterWebhookRepository>().unwrap();
    let now = Utc::now();

    let config = new_config(
        "https://example.com/hook",
        [WebhookEventTypeCatalog::grade_created()],
        now,
    );
    let entry = new_dead_letter(&config, WebhookEventTypeCatalog::grade_created(), now);
    dead_letter_repo.create(&entry).await.unwrap();

    let res = dead_letter_repo.soft_delete(entry.id, now).await;
    assert_matches!(res, Ok(()));

    assert_matches!(dead_letter_repo.get_by_id(entry.id).await, Ok(None));
    assert_matches!(
        dead_letter_repo.list_by_config_id(config.id).await,
        Ok(entries) if entries.is_empty()
    );

    let res = dead_letter_repo.soft_delete(entry.id, now).await;
    assert_matches!(res, Err(DeleteDeadLetterWebhookError::NotFound(_)));

    // The archive still refuses a second entry for that delivery
    let again = DeadLetterWebhook {
        id: DeadLetterWebhookID::new(uuid::Uuid::new_v4()),
        ..entry.clone()
    };
    let res = dead_letter_repo.create(&again).await;
    assert_matches!(res, Err(CreateDeadLetterWebhookError::AlreadyArchived(_)));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
