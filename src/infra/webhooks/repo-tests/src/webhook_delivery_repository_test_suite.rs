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

pub async fn test_no_deliveries_initially(catalog: &Catalog) {
    let delivery_repo = catalog.get_one::<dyn WebhookDeliveryRepository>().unwrap();

    let res = delivery_repo.list_due_pending(Utc::now()).await;
    assert_matches!(res, Ok(deliveries) if deliveries.is_empty());

    let res = delivery_repo
        .get_by_id(WebhookDeliveryID::new(uuid::Uuid::new_v4()))
        .await;
    assert_matches!(res, Ok(None));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_create_and_find_delivery(catalog: &Catalog) {
    let delivery_repo = catalog.get_one::<dyn WebhookDeliveryRepository>().unwrap();
    let now = Utc::now();

    let event_id = WebhookEventID::new(uuid::Uuid::new_v4());
    let config_id = WebhookConfigID::new(uuid::Uuid::new_v4());
    let delivery = new_delivery(event_id, config_id, now);

    let res = delivery_repo.create(&delivery).await;
    assert_matches!(res, Ok(()));

    let res = delivery_repo.get_by_id(delivery.id).await;
    assert_matches!(res, Ok(Some(stored)) if stored == delivery);

    let res = delivery_repo
        .find_by_idempotency_key(&WebhookIdempotencyKey::new(event_id, config_id))
        .await;
    assert_matches!(res, Ok(Some(stored)) if stored.id == delivery.id);

    let res = delivery_repo.list_by_event_id(event_id).await;
    assert_matches!(res, Ok(deliveries) if deliveries == vec![delivery.clone()]);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_duplicate_idempotency_key_rejected(catalog: &Catalog) {
    let delivery_repo = catalog.get_one::<dyn WebhookDeliveryRepository>().unwrap();
    let now = Utc::now();

    let event_id = WebhookEventID::new(uuid::Uuid::new_v4());
    let config_id = WebhookConfigID::new(uuid::Uuid::new_v4());

    let first = new_delivery(event_id, config_id, now);
    delivery_repo.create(&first).await.unwrap();

    // Different id, same (event, config) pair
    let second = new_delivery(event_id, config_id, now);
    let res = delivery_repo.create(&second).await;
    assert_matches!(
        res,
        Err(CreateWebhookDeliveryError::DuplicateIdempotencyKey(
            WebhookDeliveryDuplicateKeyError { idempotency_key }
        )) if idempotency_key == first.idempotency_key
    );

    let deliveries = delivery_repo.list_by_event_id(event_id).await.unwrap();
    assert_eq!(deliveries.len(), 1);

    // Another config for the same event is fine
    let other = new_delivery(event_id, WebhookConfigID::new(uuid::Uuid::new_v4()), now);
    let res = delivery_repo.create(&other).await;
    assert_matches!(res, Ok(()));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_duplicate_delivery_id_rejected(catalog: &Catalog) {
    let delivery_repo = catalog.get_one::<dyn WebhookDeliveryRepository>().unwrap();
    let now = Utc::now();

    let config_id = WebhookConfigID::new(uuid::Uuid::new_v4());
    let first = new_delivery(WebhookEventID::new(uuid::Uuid::new_v4()), config_id, now);
    delivery_repo.create(&first).await.unwrap();

    // Same id under a fresh idempotency key
    let other_event_id = WebhookEventID::new(uuid::Uuid::new_v4());
    let mut second = new_delivery(other_event_id, config_id, now);
    second.id = first.id;

    let res = delivery_repo.create(&second).await;
    assert_matches!(
        res,
        Err(CreateWebhookDeliveryError::Duplicate(
            WebhookDeliveryDuplicateError { delivery_id }
        )) if delivery_id == first.id
    );

    let res = delivery_repo.get_by_id(first.id).await;
    assert_matches!(res, Ok(Some(stored)) if stored == first);

    let res = delivery_repo.find_by_idempotency_key(&first.idempotency_key).await;
    assert_matches!(res, Ok(Some(stored)) if stored.id == first.id);

    let res = delivery_repo.find_by_idempotency_key(&second.idempotency_key).await;
    assert_matches!(res, Ok(None));

    let res = delivery_repo.list_by_event_id(other_event_id).await;
    assert_matches!(res, Ok(deliveries) if deliveries.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_soft_deleted_delivery_releases_idempotency_key(catalog: &Catalog) {
    let delivery_repo = catalog.get_one::<dyn WebhookDeliveryRepository>().unwrap();
    let now = Utc::now();

    let event_id = WebhookEventID::new(uuid::Uuid::new_v4());
    let config_id = WebhookConfigID::new(uuid::Uuid::new_v4());

    let mut first = new_delivery(event_id, config_id, now);
    delivery_repo.create(&first).await.unwrap();

    first.deleted_at = Some(now);
    delivery_repo.update(first).await.unwrap();

    let res = delivery_repo
        .find_by_idempotency_key(&WebhookIdempotencyKey::new(event_id, config_id))
        .await;
    assert_matches!(res, Ok(None));

    let second = new_delivery(event_id, config_id, now);
    let res = delivery_repo.create(&second).await;
    assert_matches!(res, Ok(()));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_list_due_pending(catalog: &Catalog) {
    let delivery_repo = catalog.get_one::<dyn WebhookDeliveryRepository>().unwrap();
    let now = Utc::now();
    let event_id = WebhookEventID::new(uuid::Uuid::new_v4());
    let policy = WebhooksConfig::default().retry_policy();

    let new_for_event = |created_at| {
        new_delivery(
            event_id,
            WebhookConfigID::new(uuid::Uuid::new_v4()),
            created_at,
        )
    };

    let due_later = new_for_event(now - Duration::seconds(1));
    let due_earlier = new_for_event(now - Duration::seconds(10));
    let due_exactly_now = new_for_event(now);
    let not_yet_due = new_for_event(now + Duration::seconds(1));

    let mut delivered = new_for_event(now - Duration::seconds(20));
    delivered.mark_delivered(200, now);

    let mut failed = new_for_event(now - Duration::seconds(20));
    failed.mark_failed("Webhook configuration inactive", now);

    let mut backing_off = new_for_event(now - Duration::seconds(20));
    backing_off.register_failed_attempt(503, "Service Unavailable", &policy, now);

    let mut deleted = new_for_event(now - Duration::seconds(20));
    deleted.deleted_at = Some(now);

    for delivery in [
        &due_later,
        &due_earlier,
        &due_exactly_now,
        &not_yet_due,
        &delivered,
        &failed,
        &backing_off,
        &deleted,
    ] {
        delivery_repo.create(delivery).await.unwrap();
    }

    let due = delivery_repo.list_due_pending(now).await.unwrap();
    let due_ids: Vec<_> = due.iter().map(|d| d.id).collect();
    assert_eq!(
        due_ids,
        vec![due_earlier.id, due_later.id, due_exactly_now.id]
    );

    // Once the backoff elapses the rescheduled delivery shows up again
    let due = delivery_repo
        .list_due_pending(now + Duration::seconds(5))
        .await
        .unwrap();
    assert!(due.iter().any(|d| d.id == backing_off.id));
    assert!(due.iter().any(|d| d.id == not_yet_due.id));
    assert!(!due.iter().any(|d| d.id == delivered.id || d.id == failed.id));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_update_delivery_versioned(catalog: &Catalog) {
    let delivery_repo = catalog.get_one::<dyn WebhookDeliveryRepository>().unwrap();
    let now = Utc::now();

    let delivery = new_delivery(
        WebhookEventID::new(uuid::Uuid::new_v4()),
        WebhookConfigID::new(uuid::Uuid::new_v4()),
        now,
    );
    delivery_repo.create(&delivery).await.unwrap();

    let mut winner = delivery.clone();
    winner.mark_delivered(200, now);
    let stored = delivery_repo.update(winner).await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.status, WebhookDeliveryStatus::Delivered);

    let mut loser = delivery.clone();
    loser.mark_failed("Webhook configuration inactive", now);
    let res = delivery_repo.update(loser).await;
    assert_matches!(
        res,
        Err(UpdateWebhookDeliveryError::ConcurrentModification(ConcurrentModificationError {
            expected_version: 0,
            actual_version: 1,
            ..
        }))
    );

    let reloaded = delivery_repo.get_by_id(delivery.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, WebhookDeliveryStatus::Delivered);

    let unknown = new_delivery(
        WebhookEventID::new(uuid::Uuid::new_v4()),
        WebhookConfigID::new(uuid::Uuid::new_v4()),
        now,
    );
    let res = delivery_repo.update(unknown).await;
    assert_matches!(res, Err(UpdateWebhookDeliveryError::NotFound(_)));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
