//! The dashboard's connection to one Shopify store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use trustloop_core::{ShopDomain, ShopInfo};

use crate::client::{Credentials, GatewayError};
use crate::installer::StoreGateway;
use crate::store::{ConnectionStore, StoreError};

/// A verified, saved shop connection.
///
/// The access token is persisted with the connection but never printed:
/// `Debug` is implemented manually to redact it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopConnection {
    pub shop_domain: ShopDomain,
    #[serde(with = "secret_string")]
    pub access_token: SecretString,
    pub shop_name: String,
    #[serde(default)]
    pub shop_email: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub connected_at: DateTime<Utc>,
}

impl ShopConnection {
    /// Build a connection from a successful shop lookup.
    #[must_use]
    pub fn new(credentials: Credentials, shop: ShopInfo, connected_at: DateTime<Utc>) -> Self {
        Self {
            shop_domain: credentials.shop().clone(),
            access_token: credentials.access_token().clone(),
            shop_name: shop.name,
            shop_email: shop.email,
            plan: shop.plan,
            currency: shop.currency,
            timezone: shop.timezone,
            connected_at,
        }
    }

    /// Credentials for gateway calls on this shop.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.shop_domain.as_str(), self.access_token.clone())
    }
}

impl std::fmt::Debug for ShopConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopConnection")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[REDACTED]")
            .field("shop_name", &self.shop_name)
            .field("plan", &self.plan)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

mod secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(secret: &SecretString, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(secret.expose_secret())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
        String::deserialize(d).map(SecretString::from)
    }
}

/// Errors from connecting, restoring or disconnecting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Shop domain and access token are required")]
    MissingCredentials,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Connects, restores and disconnects the dashboard's shop.
pub struct ShopSession<G> {
    gateway: G,
    store: Arc<dyn ConnectionStore>,
}

impl<G: StoreGateway> ShopSession<G> {
    #[must_use]
    pub fn new(gateway: G, store: Arc<dyn ConnectionStore>) -> Self {
        Self { gateway, store }
    }

    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Verify the token against the shop and save the connection.
    ///
    /// # Errors
    ///
    /// Returns error if either value is blank, the gateway rejects the
    /// credentials, or the store cannot be written.
    #[instrument(skip(self, access_token))]
    pub async fn connect(
        &self,
        shop: &str,
        access_token: SecretString,
    ) -> Result<ShopConnection, SessionError> {
        if shop.trim().is_empty() || access_token.expose_secret().trim().is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let credentials = Credentials::new(shop, access_token);
        let info = self.gateway.get_shop(&credentials).await?;
        let connection = ShopConnection::new(credentials, info, Utc::now());

        self.store.save_connection(&connection).await?;
        tracing::info!(shop = %connection.shop_domain, name = %connection.shop_name, "Shop connected");

        Ok(connection)
    }

    /// Load the saved connection and check it still works.
    ///
    /// A connection whose token the gateway rejects as invalid (401) is
    /// removed. On any other failure the saved connection is kept and the
    /// error returned.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails, the gateway is unreachable, or the
    /// shop lookup fails for a reason other than an invalid token.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<ShopConnection>, SessionError> {
        let Some(connection) = self.store.load_connection().await? else {
            return Ok(None);
        };

        match self.gateway.get_shop(&connection.credentials()).await {
            Ok(info) => {
                let refreshed = ShopConnection {
                    shop_name: info.name,
                    shop_email: info.email,
                    plan: info.plan,
                    currency: info.currency,
                    timezone: info.timezone,
                    ..connection
                };
                Ok(Some(refreshed))
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(shop = %connection.shop_domain, error = %e, "Removing invalid Shopify connection");
                self.store.clear_connection().await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Forget the saved connection.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        self.store.clear_connection().await?;
        tracing::info!("Shop disconnected");
        Ok(())
    }

    /// The saved connection, unverified.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub async fn current(&self) -> Result<Option<ShopConnection>, SessionError> {
        Ok(self.store.load_connection().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::installer::tests::FakeGateway;
    use crate::store::MemoryStore;

    fn shop_info() -> ShopInfo {
        serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Demo",
            "email": "a@b.com",
            "domain": "demo.myshopify.com",
            "myshopifyDomain": "demo.myshopify.com",
            "plan": "basic",
            "currency": "USD",
            "timezone": "UTC"
        }))
        .unwrap()
    }

    fn session(shop: Option<ShopInfo>) -> (ShopSession<FakeGateway>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let gateway = FakeGateway {
            shop,
            ..FakeGateway::default()
        };
        (ShopSession::new(gateway, store.clone()), store)
    }

    #[tokio::test]
    async fn test_connect_saves_normalized_connection() {
        let (session, store) = session(Some(shop_info()));

        let connection = session
            .connect("https://demo.myshopify.com/admin", "tok".into())
            .await
            .unwrap();
        assert_eq!(connection.shop_domain.as_str(), "demo.myshopify.com");
        assert_eq!(connection.shop_name, "Demo");
        assert_eq!(connection.plan.as_deref(), Some("basic"));

        let saved = store.load_connection().await.unwrap().unwrap();
        assert_eq!(saved.access_token.expose_secret(), "tok");
    }

    #[tokio::test]
    async fn test_connect_requires_both_values() {
        let (session, store) = session(Some(shop_info()));
        let err = session.connect("demo", "  ".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::MissingCredentials));
        assert!(store.load_connection().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_rejected_token_saves_nothing() {
        let (session, store) = session(None);
        let err = session.connect("demo", "bad".into()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid access token. Please check your private app credentials."
        );
        assert!(store.load_connection().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_and_disconnect() {
        let (session, _store) = session(Some(shop_info()));
        assert!(session.restore().await.unwrap().is_none());

        session.connect("demo", "tok".into()).await.unwrap();
        let restored = session.restore().await.unwrap().unwrap();
        assert_eq!(restored.shop_domain.as_str(), "demo.myshopify.com");

        session.disconnect().await.unwrap();
        assert!(session.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_clears_rejected_connection() {
        let (session, store) = session(None);
        let connection = ShopConnection::new(
            Credentials::new("demo", "revoked".into()),
            shop_info(),
            Utc::now(),
        );
        store.save_connection(&connection).await.unwrap();

        assert!(session.restore().await.unwrap().is_none());
        assert!(store.load_connection().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_keeps_connection_on_gateway_error() {
        let store = Arc::new(MemoryStore::new());
        let gateway = FakeGateway {
            shop_failure: Some(500),
            ..FakeGateway::default()
        };
        let session = ShopSession::new(gateway, store.clone());
        let connection = ShopConnection::new(
            Credentials::new("demo", "tok".into()),
            shop_info(),
            Utc::now(),
        );
        store.save_connection(&connection).await.unwrap();

        let err = session.restore().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Gateway(GatewayError::Rejected { status: 500, .. })
        ));

        let saved = store.load_connection().await.unwrap().unwrap();
        assert_eq!(saved.access_token.expose_secret(), "tok");
    }

    #[test]
    fn test_connection_serializes_camel_case_and_redacts_debug() {
        let connection = ShopConnection::new(
            Credentials::new("demo", "shpat_secret".into()),
            shop_info(),
            Utc::now(),
        );

        let json = serde_json::to_value(&connection).unwrap();
        assert_eq!(json["shopDomain"], "demo.myshopify.com");
        assert_eq!(json["accessToken"], "shpat_secret");
        assert_eq!(json["shopName"], "Demo");

        assert!(!format!("{connection:?}").contains("shpat_secret"));
    }
}
