//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::services::{EmailError, LoggingScheduler, ReviewEmailService, ReviewScheduler};
use crate::shopify::{AdminClient, ShopifyError};

/// Errors building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("Email service: {0}")]
    Email(#[from] EmailError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Everything inside is immutable after start-up.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    shopify: AdminClient,
    scheduler: Arc<dyn ReviewScheduler>,
    email: ReviewEmailService,
}

impl AppState {
    /// Create application state with the logging review scheduler.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the email sender cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, StateError> {
        Self::with_scheduler(config, Arc::new(LoggingScheduler))
    }

    /// Create application state with a custom review scheduler.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the email sender cannot be built.
    pub fn with_scheduler(
        config: GatewayConfig,
        scheduler: Arc<dyn ReviewScheduler>,
    ) -> Result<Self, StateError> {
        let shopify = AdminClient::new(&config.shopify)?;
        let email = ReviewEmailService::new(&config.reviews.email_from, config.reviews.email_delay)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                scheduler,
                email,
            }),
        })
    }

    /// Get a reference to the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    /// Get a reference to the review scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &dyn ReviewScheduler {
        self.inner.scheduler.as_ref()
    }

    /// Get a reference to the review email service.
    #[must_use]
    pub fn email(&self) -> &ReviewEmailService {
        &self.inner.email
    }
}
