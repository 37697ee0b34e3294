//! Shopify Admin REST client.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};
use trustloop_core::{Product, ScriptTag, ScriptTagId, ShopDomain, ShopInfo, WebhookRegistration};
use url::Url;

use crate::config::ShopifyConfig;

use super::ShopifyError;
use super::wire::{
    NewScriptTagEnvelope, ProductsEnvelope, ScriptTagEnvelope, ScriptTagsEnvelope, ShopEnvelope,
    WebhookEnvelope,
};

/// Header carrying the private app access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Shopify's reply when a webhook address is already subscribed to a topic.
const ALREADY_TAKEN: &str = "has already been taken";

/// Shop and access token for one Admin API call.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ShopCredentials {
    shop: ShopDomain,
    access_token: SecretString,
}

impl ShopCredentials {
    /// Pair a normalized shop domain with its access token.
    #[must_use]
    pub const fn new(shop: ShopDomain, access_token: SecretString) -> Self {
        Self { shop, access_token }
    }

    /// The shop these credentials belong to.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }
}

impl std::fmt::Debug for ShopCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopCredentials")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Shopify Admin REST API client.
///
/// Holds no shop state of its own: every method takes the caller's
/// [`ShopCredentials`]. Cheap to clone.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    api_version: String,
    admin_origin: Option<Url>,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                api_version: config.api_version.clone(),
                admin_origin: config.admin_origin.clone(),
            }),
        })
    }

    /// Build the URL of an Admin REST resource, e.g. `script_tags` or
    /// `script_tags/596726825`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Url` if the shop does not form a valid URL.
    pub fn resource_url(&self, shop: &ShopDomain, resource: &str) -> Result<Url, ShopifyError> {
        let path = format!("admin/api/{}/{resource}.json", self.inner.api_version);

        let url = match &self.inner.admin_origin {
            Some(origin) => origin.join(&format!("{shop}/{path}"))?,
            None => Url::parse(&format!("https://{shop}/{path}"))?,
        };
        Ok(url)
    }

    // =========================================================================
    // Shop
    // =========================================================================

    /// Fetch shop metadata. Doubles as the access token check.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn get_shop(&self, credentials: &ShopCredentials) -> Result<ShopInfo, ShopifyError> {
        let url = self.resource_url(&credentials.shop, "shop")?;
        let envelope: ShopEnvelope = self.get(credentials, url).await?;
        Ok(envelope.shop.into())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List up to `limit` products.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Shopify rejects it.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn list_products(
        &self,
        credentials: &ShopCredentials,
        limit: u32,
    ) -> Result<Vec<Product>, ShopifyError> {
        let mut url = self.resource_url(&credentials.shop, "products")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());

        let envelope: ProductsEnvelope = self.get(credentials, url).await?;
        Ok(envelope.products.into_iter().map(Product::from).collect())
    }

    // =========================================================================
    // Script tags
    // =========================================================================

    /// List every script tag installed on the shop.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Shopify rejects it.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn list_script_tags(
        &self,
        credentials: &ShopCredentials,
    ) -> Result<Vec<ScriptTag>, ShopifyError> {
        let url = self.resource_url(&credentials.shop, "script_tags")?;
        let envelope: ScriptTagsEnvelope = self.get(credentials, url).await?;
        Ok(envelope.script_tags)
    }

    /// Register an `onload` script tag for `src`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Shopify rejects it.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn create_script_tag(
        &self,
        credentials: &ShopCredentials,
        src: &str,
    ) -> Result<ScriptTag, ShopifyError> {
        let url = self.resource_url(&credentials.shop, "script_tags")?;
        let response = self
            .request(reqwest::Method::POST, credentials, url)
            .json(&NewScriptTagEnvelope::onload(src))
            .send()
            .await?;

        let envelope: ScriptTagEnvelope = handle_response(response).await?;
        Ok(envelope.script_tag)
    }

    /// Remove a script tag.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Shopify rejects it.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn delete_script_tag(
        &self,
        credentials: &ShopCredentials,
        id: ScriptTagId,
    ) -> Result<(), ShopifyError> {
        let url = self.resource_url(&credentials.shop, &format!("script_tags/{id}"))?;
        let response = self
            .request(reqwest::Method::DELETE, credentials, url)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(parse_error(response).await)
    }

    // =========================================================================
    // Webhooks
    // =========================================================================

    /// Subscribe `registration.address` to `registration.topic`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Conflict` if the address is already subscribed
    /// to the topic.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn create_webhook(
        &self,
        credentials: &ShopCredentials,
        registration: WebhookRegistration,
    ) -> Result<WebhookRegistration, ShopifyError> {
        let url = self.resource_url(&credentials.shop, "webhooks")?;
        let response = self
            .request(reqwest::Method::POST, credentials, url)
            .json(&WebhookEnvelope {
                webhook: registration,
            })
            .send()
            .await?;

        let envelope: WebhookEnvelope = handle_response(response).await?;
        Ok(envelope.webhook)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn request(
        &self,
        method: reqwest::Method,
        credentials: &ShopCredentials,
        url: Url,
    ) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header(ACCESS_TOKEN_HEADER, credentials.access_token.expose_secret())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        credentials: &ShopCredentials,
        url: Url,
    ) -> Result<T, ShopifyError> {
        let response = self
            .request(reqwest::Method::GET, credentials, url)
            .send()
            .await?;
        handle_response(response).await
    }
}

/// Parse a successful response, or classify the failure.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ShopifyError> {
    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(format!("Failed to parse response: {e}")));
    }

    Err(parse_error(response).await)
}

/// Classify a non-2xx response. The body is logged, never returned to callers
/// of the gateway.
async fn parse_error(response: reqwest::Response) -> ShopifyError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    warn!(status, body = %body, "Shopify API error");

    match status {
        401 => ShopifyError::Unauthorized,
        422 if body.contains(ALREADY_TAKEN) => ShopifyError::Conflict(body),
        _ => ShopifyError::Api { status, body },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(admin_origin: Option<&str>) -> AdminClient {
        AdminClient::new(&ShopifyConfig {
            api_version: "2024-01".to_string(),
            admin_origin: admin_origin.map(|o| Url::parse(o).unwrap()),
        })
        .unwrap()
    }

    #[test]
    fn test_resource_url_default_origin() {
        let url = client(None)
            .resource_url(&ShopDomain::normalize("demo"), "script_tags")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://demo.myshopify.com/admin/api/2024-01/script_tags.json"
        );
    }

    #[test]
    fn test_resource_url_fixed_origin() {
        let url = client(Some("http://127.0.0.1:9000"))
            .resource_url(&ShopDomain::normalize("demo"), "script_tags/42")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/demo.myshopify.com/admin/api/2024-01/script_tags/42.json"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let credentials = ShopCredentials::new(
            ShopDomain::normalize("demo"),
            SecretString::from("shpat_super_secret_token"),
        );

        let debug_output = format!("{credentials:?}");
        assert!(debug_output.contains("demo.myshopify.com"));
        assert!(!debug_output.contains("shpat_super_secret_token"));
    }
}
