//! CLI subcommands.
//!
//! - `shop` - connect, disconnect, status, products
//! - `widget` - install, uninstall, snippets

pub mod shop;
pub mod widget;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use trustloop_dashboard::{
    GatewayClient, GatewayError, JsonFileStore, ShopConnection, ShopSession,
};
use url::Url;

/// Errors specific to the CLI flow.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No saved connection.
    #[error("No store connected. Run `tl-cli connect --shop <shop> --token <token>` first.")]
    NotConnected,
}

/// Gateway client and store shared by every command.
pub struct Context {
    pub gateway: GatewayClient,
    pub store: Arc<JsonFileStore>,
}

impl Context {
    /// Build the context from global options.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(gateway_url: Url, store: PathBuf) -> Result<Self, GatewayError> {
        Ok(Self {
            gateway: GatewayClient::new(gateway_url)?,
            store: Arc::new(JsonFileStore::new(store)),
        })
    }

    /// A session over the context's gateway and store.
    #[must_use]
    pub fn session(&self) -> ShopSession<GatewayClient> {
        ShopSession::new(self.gateway.clone(), self.store.clone())
    }

    /// The saved connection, verified against the gateway.
    ///
    /// # Errors
    ///
    /// Returns error if nothing is connected or the connection is no longer
    /// valid.
    pub async fn connection(&self) -> Result<ShopConnection, Box<dyn std::error::Error>> {
        match self.session().restore().await {
            Ok(Some(connection)) => Ok(connection),
            Ok(None) => Err(CommandError::NotConnected.into()),
            Err(e) => Err(e.into()),
        }
    }
}
