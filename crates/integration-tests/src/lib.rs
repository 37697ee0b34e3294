//! End-to-end tests for the TrustLoop gateway and dashboard.
//!
//! Every test starts its own [`MockShopify`] Admin API and a real gateway
//! pointed at it through `admin_origin`, both on ephemeral ports, so tests
//! run in parallel without shared state.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p trustloop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gateway_proxy` - Proxy routes, validation, error mapping, CORS
//! - `widget_install` - Dashboard installer against the live gateway
//! - `review_webhook` - Order webhook receiver and HMAC verification
//! - `dashboard_session` - Connect, restore and disconnect with a file store

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

pub mod mock_shopify;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use secrecy::SecretString;
use trustloop_dashboard::{Credentials, GatewayClient};
use trustloop_gateway::config::GatewayConfig;
use trustloop_gateway::services::{ReviewRequest, ReviewScheduler, SchedulerError};
use trustloop_gateway::state::AppState;
use url::Url;

pub use mock_shopify::{MockShopify, RecordedRequest, SHOP, VALID_TOKEN};

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Scheduler that keeps every request it is handed.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    requests: Mutex<Vec<ReviewRequest>>,
}

impl RecordingScheduler {
    pub fn requests(&self) -> Vec<ReviewRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewScheduler for RecordingScheduler {
    async fn schedule(&self, request: ReviewRequest) -> Result<(), SchedulerError> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// A running gateway wired to its own mock Shopify.
pub struct TestContext {
    pub client: reqwest::Client,
    pub gateway_url: Url,
    pub shopify: MockShopify,
    pub scheduler: Arc<RecordingScheduler>,
}

impl TestContext {
    /// Gateway without webhook signature verification.
    pub async fn new() -> Self {
        Self::start(None).await
    }

    /// Gateway that verifies webhooks against `secret`.
    pub async fn with_webhook_secret(secret: &str) -> Self {
        Self::start(Some(SecretString::from(secret))).await
    }

    async fn start(secret: Option<SecretString>) -> Self {
        let shopify = MockShopify::start().await;

        let mut config = GatewayConfig::local();
        config.shopify.admin_origin = Some(shopify.origin().clone());
        config.webhooks.secret = secret;
        config.reviews.email_delay = Duration::ZERO;

        let scheduler = Arc::new(RecordingScheduler::default());
        let state = AppState::with_scheduler(config, scheduler.clone()).unwrap();
        let gateway_url = serve(trustloop_gateway::app(state)).await;

        Self {
            client: reqwest::Client::new(),
            gateway_url,
            shopify,
            scheduler,
        }
    }

    pub fn url(&self, route: &str) -> Url {
        self.gateway_url.join(route).unwrap()
    }

    /// POST a JSON body to a gateway route; returns status and parsed body.
    pub async fn post(&self, route: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let response = self
            .client
            .post(self.url(route))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    /// The dashboard's client for this gateway.
    pub fn dashboard_client(&self) -> GatewayClient {
        GatewayClient::new(self.gateway_url.clone()).unwrap()
    }

    /// Credentials the mock accepts.
    pub fn credentials(&self) -> Credentials {
        Credentials::new("demo", SecretString::from(VALID_TOKEN))
    }
}
