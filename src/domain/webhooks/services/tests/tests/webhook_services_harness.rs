// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use courier_webhooks::*;
use courier_webhooks_inmem::{
    InMemoryDeadLetterWebhookRepository,
    InMemoryWebhookConfigRepository,
    InMemoryWebhookDeliveryRepository,
    InMemoryWebhookEventRepository,
};
use courier_webhooks_services::*;
use time_source::{SystemTimeSource, SystemTimeSourceStub};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) const TEST_WEBHOOK_URL: &str = "https://example.com/webhook";
pub(crate) const TEST_WEBHOOK_SECRET: &[u8] = b"test-secret";

pub(crate) struct WebhookServicesHarness {
    pub catalog: dill::Catalog,
    pub time_source: SystemTimeSourceStub,
    pub webhook_config_repo: Arc<dyn WebhookConfigRepository>,
    pub webhook_event_repo: Arc<dyn WebhookEventRepository>,
    pub webhook_delivery_repo: Arc<dyn WebhookDeliveryRepository>,
    pub dead_letter_repo: Arc<dyn DeadLetterWebhookRepository>,
    pub webhook_event_publisher: Arc<dyn WebhookEventPublisher>,
    pub webhook_delivery_executor: Arc<dyn WebhookDeliveryExecutor>,
    pub webhook_delivery_processor: Arc<dyn WebhookDeliveryProcessor>,
    pub dead_letter_archiver: Arc<dyn DeadLetterArchiver>,
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
}

impl WebhookServicesHarness {
    pub fn new(mock_webhook_sender: MockWebhookSender) -> Self {
        Self::new_with_sender(mock_webhook_sender, Self::test_webhooks_config())
    }

    pub fn new_with_sender<TSender: WebhookSender + 'static>(
        webhook_sender: TSender,
        webhooks_config: WebhooksConfig,
    ) -> Self {
        Self::new_with_repositories(webhook_sender, webhooks_config, |b| {
            b.add::<InMemoryWebhookConfigRepository>()
                .add::<InMemoryWebhookEventRepository>()
                .add::<InMemoryWebhookDeliveryRepository>()
                .add::<InMemoryDeadLetterWebhookRepository>();
        })
    }

    /// Lets a test substitute some of the repositories
    pub fn new_with_repositories<TSender: WebhookSender + 'static>(
        webhook_sender: TSender,
        webhooks_config: WebhooksConfig,
        register_repositories: impl FnOnce(&mut dill::CatalogBuilder),
    ) -> Self {
        let time_source = SystemTimeSourceStub::new_set(Self::t0());

        let mut b = dill::CatalogBuilder::new();
        register_repositories(&mut b);
        b.add_value(time_source.clone())
            .bind::<dyn SystemTimeSource, SystemTimeSourceStub>()
            .add_value(webhooks_config)
            .add_value(webhook_sender)
            .bind::<dyn WebhookSender, TSender>()
            .add::<CircuitBreakerRegistry>()
            .add::<WebhookSignerImpl>()
            .add::<WebhookEventPublisherImpl>()
            .add::<WebhookDeliveryExecutorImpl>()
            .add::<WebhookDeliveryProcessorImpl>()
            .add::<DeadLetterArchiverImpl>()
            .add::<WebhookDeliveryAgent>();

        let catalog = b.build();

        Self {
            time_source,
            webhook_config_repo: catalog.get_one().unwrap(),
            webhook_event_repo: catalog.get_one().unwrap(),
            webhook_delivery_repo: catalog.get_one().unwrap(),
            dead_letter_repo: catalog.get_one().unwrap(),
            webhook_event_publisher: catalog.get_one().unwrap(),
            webhook_delivery_executor: catalog.get_one().unwrap(),
            webhook_delivery_processor: catalog.get_one().unwrap(),
            dead_letter_archiver: catalog.get_one().unwrap(),
            circuit_breakers: catalog.get_one().unwrap(),
            catalog,
        }
    }

    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    /// Three attempts with 1s, 5s and 30s delays
    pub fn test_webhooks_config() -> WebhooksConfig {
        WebhooksConfig {
            max_retries: 3,
            retry_delays: vec![
                Duration::seconds(1),
                Duration::seconds(5),
                Duration::seconds(30),
            ],
            ..WebhooksConfig::default()
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_source.now()
    }

    pub async fn create_config(
        &self,
        url: &str,
        event_types: Vec<WebhookEventType>,
    ) -> WebhookConfig {
        let config = WebhookConfig::new(
            WebhookConfigID::new(uuid::Uuid::new_v4()),
            url::Url::parse(url).unwrap(),
            event_types,
            WebhookSecret::new(TEST_WEBHOOK_SECRET),
            self.now(),
        );
        self.webhook_config_repo.create(&config).await.unwrap();
        config
    }

    pub async fn create_event(&self, event_type: WebhookEventType) -> WebhookEvent {
        let event = WebhookEvent::new(
            WebhookEventID::new(uuid::Uuid::new_v4()),
            event_type,
            serde_json::json!({"gradeId": "g1", "score": 92}),
            self.now(),
        );
        self.webhook_event_repo.create_event(&event).await.unwrap();
        event
    }

    pub async fn create_delivery(
        &self,
        event_id: WebhookEventID,
        config_id: WebhookConfigID,
    ) -> WebhookDelivery {
        let delivery = WebhookDelivery::new(
            WebhookDeliveryID::new(uuid::Uuid::new_v4()),
            event_id,
            config_id,
            self.now(),
        );
        self.webhook_delivery_repo.create(&delivery).await.unwrap();
        delivery
    }

    /// Config subscribed to `grade.created`, one event and its pending delivery
    pub async fn create_pending_delivery(
        &self,
        url: &str,
    ) -> (WebhookConfig, WebhookEvent, WebhookDelivery) {
        let config = self
            .create_config(url, vec![WebhookEventTypeCatalog::grade_created()])
            .await;
        let event = self
            .create_event(WebhookEventTypeCatalog::grade_created())
            .await;
        let delivery = self.create_delivery(event.id, config.id).await;
        (config, event, delivery)
    }

    pub async fn get_delivery(&self, delivery_id: WebhookDeliveryID) -> WebhookDelivery {
        self.webhook_delivery_repo
            .get_by_id(delivery_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn get_event(&self, event_id: WebhookEventID) -> WebhookEvent {
        self.webhook_event_repo
            .get_event_by_id(event_id)
            .await
            .unwrap()
    }

    pub async fn attempt(&self, delivery_id: WebhookDeliveryID) -> WebhookDeliveryOutcome {
        let delivery = self.get_delivery(delivery_id).await;
        self.webhook_delivery_executor
            .attempt_delivery(&delivery)
            .await
    }

    pub fn response(status_code: http::StatusCode, body: &str) -> WebhookResponse {
        WebhookResponse::new(
            status_code,
            http::HeaderMap::new(),
            body.to_string(),
            Self::t0(),
        )
    }

    pub fn add_response_expectation(
        mock_webhook_sender: &mut MockWebhookSender,
        target_url: &str,
        status_code: http::StatusCode,
        body: &str,
        times: usize,
    ) {
        let target_url = url::Url::parse(target_url).unwrap();
        let response = Self::response(status_code, body);

        mock_webhook_sender
            .expect_send_webhook()
            .withf(move |url, _, _| *url == target_url)
            .times(times)
            .returning(move |_, _, _| Ok(response.clone()));
    }

    pub fn add_connection_failure_expectation(
        mock_webhook_sender: &mut MockWebhookSender,
        target_url: &str,
        times: usize,
    ) {
        let target_url = url::Url::parse(target_url).unwrap();
        let expected_url = target_url.clone();

        mock_webhook_sender
            .expect_send_webhook()
            .withf(move |url, _, _| *url == expected_url)
            .times(times)
            .returning(move |_, _, _| {
                Err(WebhookSendError::FailedToConnect(
                    WebhookSendFailedToConnectError {
                        target_url: target_url.clone(),
                    },
                ))
            });
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
