//! Storefront widget installation.
//!
//! Installing is two steps with different weights: the script tag is the
//! install, the `orders/fulfilled` webhook is best effort. Shopify refuses a
//! second subscription for the same topic and address, so a conflict on the
//! webhook is an expected outcome of reinstalling.
//!
//! # State machine
//!
//! ```text
//! Unknown ──check──▶ Installed | NotInstalled
//! NotInstalled ──install──▶ Installed   (webhook failure does not revert)
//! Installed ──uninstall──▶ NotInstalled (any failed delete keeps Installed)
//! ```
//!
//! Every transition ends with a fresh listing, so the state shown is what
//! Shopify reports rather than what was attempted.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use trustloop_core::{
    ScriptTag, ScriptTagId, ShopInfo, WIDGET_FILENAME, WebhookRegistration, WebhookTopic,
    matching_widget_tags,
};
use url::Url;

use crate::client::{Credentials, GatewayError};

/// Gateway operations the installer and session need.
///
/// [`GatewayClient`](crate::client::GatewayClient) is the production
/// implementation.
pub trait StoreGateway: Send + Sync {
    fn get_shop(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<ShopInfo, GatewayError>> + Send;

    fn list_script_tags(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Vec<ScriptTag>, GatewayError>> + Send;

    fn create_script_tag(
        &self,
        credentials: &Credentials,
        src: &str,
    ) -> impl Future<Output = Result<ScriptTag, GatewayError>> + Send;

    fn delete_script_tag(
        &self,
        credentials: &Credentials,
        id: ScriptTagId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn create_webhook(
        &self,
        credentials: &Credentials,
        topic: &WebhookTopic,
        address: &str,
    ) -> impl Future<Output = Result<WebhookRegistration, GatewayError>> + Send;
}

/// Whether the widget is on the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    /// Not yet checked.
    #[default]
    Unknown,
    Installed,
    NotInstalled,
}

/// What happened to the fulfillment webhook during an install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Newly subscribed.
    Registered(WebhookRegistration),
    /// Shopify already had this subscription.
    AlreadyRegistered,
    /// Registration failed; the widget is installed regardless.
    Failed(String),
    /// No callback address configured.
    Skipped,
}

impl WebhookOutcome {
    /// Whether review requests will be triggered for this shop.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Registered(_) | Self::AlreadyRegistered)
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// The script tag that was created.
    pub primary: ScriptTag,
    pub secondary: WebhookOutcome,
    /// State after the post-install refresh.
    pub state: InstallState,
}

/// Result of a successful uninstall.
#[derive(Debug, Clone, Serialize)]
pub struct UninstallReport {
    pub removed: Vec<ScriptTagId>,
    pub state: InstallState,
}

/// An install, uninstall or check failure, as one line for the merchant.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct InstallError {
    message: String,
    #[source]
    source: Option<GatewayError>,
}

impl InstallError {
    /// Use the gateway's message when it gave one, otherwise `fallback`.
    #[must_use]
    pub fn from_gateway(err: GatewayError, fallback: &str) -> Self {
        let message = match &err {
            GatewayError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        };
        Self {
            message,
            source: Some(err),
        }
    }

    /// The message shown to the merchant.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Where the widget is served from and where Shopify should send order
/// webhooks.
#[derive(Debug, Clone)]
pub struct InstallTarget {
    pub widget_origin: Url,
    pub webhook_address: Option<Url>,
}

impl InstallTarget {
    /// The all-in-one widget script URL.
    ///
    /// The origin's path is treated as a directory: `https://cdn.example/x`
    /// and `https://cdn.example/x/` both serve `x/trustloop-all.js`.
    ///
    /// # Errors
    ///
    /// Returns error if the origin cannot be joined with the file name.
    pub fn script_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.widget_origin.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(WIDGET_FILENAME)
    }
}

/// Drives install and uninstall for one connected shop.
pub struct Installer<G> {
    gateway: G,
    credentials: Credentials,
    state: InstallState,
    script_tags: Vec<ScriptTag>,
}

impl<G: StoreGateway> Installer<G> {
    #[must_use]
    pub const fn new(gateway: G, credentials: Credentials) -> Self {
        Self {
            gateway,
            credentials,
            state: InstallState::Unknown,
            script_tags: Vec::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> InstallState {
        self.state
    }

    /// Script tags from the last successful listing.
    #[must_use]
    pub fn script_tags(&self) -> &[ScriptTag] {
        &self.script_tags
    }

    /// Refresh the state from the shop's script tags.
    ///
    /// # Errors
    ///
    /// Returns error if the listing fails; the state is left as it was.
    #[instrument(skip(self), fields(shop = %self.credentials.shop()))]
    pub async fn check(&mut self) -> Result<InstallState, InstallError> {
        let tags = self
            .gateway
            .list_script_tags(&self.credentials)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error checking installation");
                InstallError::from_gateway(e, "Failed to check installation")
            })?;

        self.state = if matching_widget_tags(&tags, WIDGET_FILENAME).is_empty() {
            InstallState::NotInstalled
        } else {
            InstallState::Installed
        };
        self.script_tags = tags;

        Ok(self.state)
    }

    /// Install the widget script tag, then register the fulfillment webhook.
    ///
    /// # Errors
    ///
    /// Returns error only if the script tag could not be created.
    #[instrument(
        skip(self, target),
        fields(shop = %self.credentials.shop(), origin = %target.widget_origin)
    )]
    pub async fn install(&mut self, target: &InstallTarget) -> Result<InstallReport, InstallError> {
        const FALLBACK: &str = "Failed to install widget";

        let script_url = target.script_url().map_err(|e| InstallError {
            message: format!("{FALLBACK}: invalid widget origin ({e})"),
            source: None,
        })?;

        let script_tag = self
            .gateway
            .create_script_tag(&self.credentials, script_url.as_str())
            .await
            .map_err(|e| InstallError::from_gateway(e, FALLBACK))?;

        self.state = InstallState::Installed;
        tracing::info!(id = %script_tag.id, src = %script_tag.src, "Widget script tag installed");

        let secondary = match &target.webhook_address {
            Some(address) => self.register_webhook(address).await,
            None => WebhookOutcome::Skipped,
        };

        if let Err(e) = self.check().await {
            tracing::warn!(error = %e, "Refresh after install failed");
        }

        Ok(InstallReport {
            primary: script_tag,
            secondary,
            state: self.state,
        })
    }

    async fn register_webhook(&self, address: &Url) -> WebhookOutcome {
        match self
            .gateway
            .create_webhook(
                &self.credentials,
                &WebhookTopic::OrdersFulfilled,
                address.as_str(),
            )
            .await
        {
            Ok(webhook) => {
                tracing::info!(address = %webhook.address, "Fulfillment webhook registered");
                WebhookOutcome::Registered(webhook)
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!("Webhook creation failed (already exists)");
                WebhookOutcome::AlreadyRegistered
            }
            Err(e) => {
                tracing::warn!(error = %e, "Webhook creation failed");
                WebhookOutcome::Failed(e.to_string())
            }
        }
    }

    /// Remove every widget script tag, one at a time.
    ///
    /// # Errors
    ///
    /// Returns error on the first failed listing or deletion; the state stays
    /// `Installed`.
    #[instrument(skip(self), fields(shop = %self.credentials.shop()))]
    pub async fn uninstall(&mut self) -> Result<UninstallReport, InstallError> {
        const FALLBACK: &str = "Failed to uninstall widget";

        let tags = self
            .gateway
            .list_script_tags(&self.credentials)
            .await
            .map_err(|e| InstallError::from_gateway(e, FALLBACK))?;

        let ids: Vec<ScriptTagId> = matching_widget_tags(&tags, WIDGET_FILENAME)
            .into_iter()
            .map(|tag| tag.id)
            .collect();
        self.script_tags = tags;

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Err(e) = self.gateway.delete_script_tag(&self.credentials, id).await {
                self.state = InstallState::Installed;
                tracing::error!(%id, error = %e, "Failed to delete widget script tag");
                return Err(InstallError::from_gateway(e, FALLBACK));
            }
            tracing::info!(%id, "Widget script tag removed");
            removed.push(id);
        }

        self.state = InstallState::NotInstalled;

        if let Err(e) = self.check().await {
            tracing::warn!(error = %e, "Refresh after uninstall failed");
        }

        Ok(UninstallReport {
            removed,
            state: self.state,
        })
    }
}
