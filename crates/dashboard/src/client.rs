//! HTTP client for the TrustLoop gateway.
//!
//! Every call is a JSON `POST` carrying the shop and access token. Failures
//! come back as `{"error": "...", "code"?: "..."}` and are surfaced as
//! [`GatewayError::Rejected`] with the gateway's message intact.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use trustloop_core::{
    Product, ScriptTag, ScriptTagId, ShopDomain, ShopInfo, WebhookRegistration, WebhookTopic,
};
use url::Url;

use crate::installer::StoreGateway;

/// Code the gateway attaches to "already exists" conflicts.
pub const ALREADY_EXISTS_CODE: &str = "already_exists";

/// Errors that can occur when calling the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The gateway answered with an error body.
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Successful response with an unexpected body.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Whether the gateway reported the resource as already existing.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Rejected { code: Some(code), .. } if code == ALREADY_EXISTS_CODE)
    }

    /// Whether the gateway rejected the access token (401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401, .. })
    }
}

/// Shop and access token sent with every gateway call.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Credentials {
    shop: ShopDomain,
    access_token: SecretString,
}

impl Credentials {
    /// Normalize `shop` and pair it with its token.
    #[must_use]
    pub fn new(shop: &str, access_token: SecretString) -> Self {
        Self {
            shop: ShopDomain::normalize(shop),
            access_token,
        }
    }

    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a, T: Serialize> {
    shop: &'a str,
    access_token: &'a str,
    #[serde(flatten)]
    params: T,
}

#[derive(Serialize)]
struct NoParams {}

#[derive(Serialize)]
struct LimitParams {
    limit: u32,
}

#[derive(Serialize)]
struct ScriptTagParams<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

#[derive(Serialize)]
struct WebhookParams<'a> {
    topic: &'a str,
    address: &'a str,
}

#[derive(Deserialize)]
struct ShopResponse {
    shop: ShopInfo,
}

#[derive(Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct ScriptTagsResponse {
    script_tags: Vec<ScriptTag>,
}

#[derive(Deserialize)]
struct ScriptTagResponse {
    script_tag: ScriptTag,
}

#[derive(Deserialize)]
struct DeletedResponse {
    #[serde(default)]
    deleted: bool,
}

#[derive(Deserialize)]
struct WebhookResponse {
    webhook: WebhookRegistration,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    code: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the gateway's proxy routes. Cheap to clone.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(GatewayClientInner { client, base_url }),
        })
    }

    /// Fetch shop metadata, verifying the token.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` with the gateway's message on failure.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn get_shop(&self, credentials: &Credentials) -> Result<ShopInfo, GatewayError> {
        let response: ShopResponse = self.call("shopify-connect", credentials, NoParams {}).await?;
        Ok(response.shop)
    }

    /// List up to `limit` products.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` with the gateway's message on failure.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn list_products(
        &self,
        credentials: &Credentials,
        limit: Option<u32>,
    ) -> Result<Vec<Product>, GatewayError> {
        let response: ProductsResponse = match limit {
            Some(limit) => {
                self.call("shopify-products", credentials, LimitParams { limit })
                    .await?
            }
            None => self.call("shopify-products", credentials, NoParams {}).await?,
        };
        Ok(response.products)
    }

    /// List every script tag on the shop.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` with the gateway's message on failure.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn list_script_tags(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<ScriptTag>, GatewayError> {
        let response: ScriptTagsResponse = self
            .call(
                "shopify-script-tags",
                credentials,
                ScriptTagParams {
                    action: "list",
                    src: None,
                    id: None,
                },
            )
            .await?;
        Ok(response.script_tags)
    }

    /// Install a script tag loading `src`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` with the gateway's message on failure.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn create_script_tag(
        &self,
        credentials: &Credentials,
        src: &str,
    ) -> Result<ScriptTag, GatewayError> {
        let response: ScriptTagResponse = self
            .call(
                "shopify-script-tags",
                credentials,
                ScriptTagParams {
                    action: "create",
                    src: Some(src),
                    id: None,
                },
            )
            .await?;
        Ok(response.script_tag)
    }

    /// Remove a script tag.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` with the gateway's message on failure.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn delete_script_tag(
        &self,
        credentials: &Credentials,
        id: ScriptTagId,
    ) -> Result<(), GatewayError> {
        let response: DeletedResponse = self
            .call(
                "shopify-script-tags",
                credentials,
                ScriptTagParams {
                    action: "delete",
                    src: None,
                    id: Some(id.to_string()),
                },
            )
            .await?;

        if !response.deleted {
            return Err(GatewayError::Parse(
                "Gateway did not confirm the deletion".to_string(),
            ));
        }
        Ok(())
    }

    /// Subscribe `address` to `topic`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected`; check [`GatewayError::is_conflict`]
    /// for an existing subscription.
    #[instrument(skip(self, credentials), fields(shop = %credentials.shop))]
    pub async fn create_webhook(
        &self,
        credentials: &Credentials,
        topic: &WebhookTopic,
        address: &str,
    ) -> Result<WebhookRegistration, GatewayError> {
        let response: WebhookResponse = self
            .call(
                "shopify-webhooks",
                credentials,
                WebhookParams {
                    topic: topic.as_str(),
                    address,
                },
            )
            .await?;
        Ok(response.webhook)
    }

    async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        route: &str,
        credentials: &Credentials,
        params: P,
    ) -> Result<T, GatewayError> {
        let url = self.inner.base_url.join(route)?;
        let body = Request {
            shop: credentials.shop.as_str(),
            access_token: credentials.access_token.expose_secret(),
            params,
        };

        let response = self.inner.client.post(url).json(&body).send().await?;
        handle_response(response).await
    }
}

/// Parse a successful response, or turn the gateway's error body into
/// [`GatewayError::Rejected`].
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(format!("Failed to parse response: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error, code }) => (error, code),
        Err(_) => (format!("Gateway request failed with status {status}"), None),
    };

    tracing::debug!(status = status.as_u16(), %message, "Gateway rejected request");

    Err(GatewayError::Rejected {
        status: status.as_u16(),
        message,
        code,
    })
}

impl StoreGateway for GatewayClient {
    async fn get_shop(&self, credentials: &Credentials) -> Result<ShopInfo, GatewayError> {
        Self::get_shop(self, credentials).await
    }

    async fn list_script_tags(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<ScriptTag>, GatewayError> {
        Self::list_script_tags(self, credentials).await
    }

    async fn create_script_tag(
        &self,
        credentials: &Credentials,
        src: &str,
    ) -> Result<ScriptTag, GatewayError> {
        Self::create_script_tag(self, credentials, src).await
    }

    async fn delete_script_tag(
        &self,
        credentials: &Credentials,
        id: ScriptTagId,
    ) -> Result<(), GatewayError> {
        Self::delete_script_tag(self, credentials, id).await
    }

    async fn create_webhook(
        &self,
        credentials: &Credentials,
        topic: &WebhookTopic,
        address: &str,
    ) -> Result<WebhookRegistration, GatewayError> {
        Self::create_webhook(self, credentials, topic, address).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = Request {
            shop: "demo.myshopify.com",
            access_token: "tok",
            params: ScriptTagParams {
                action: "delete",
                src: None,
                id: Some("42".to_string()),
            },
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "shop": "demo.myshopify.com",
                "accessToken": "tok",
                "action": "delete",
                "id": "42"
            })
        );
    }

    #[test]
    fn test_conflict_classification() {
        let conflict = GatewayError::Rejected {
            status: 400,
            message: "Webhook already exists".to_string(),
            code: Some(ALREADY_EXISTS_CODE.to_string()),
        };
        assert!(conflict.is_conflict());
        assert_eq!(conflict.to_string(), "Webhook already exists");

        let other = GatewayError::Rejected {
            status: 400,
            message: "Failed to create webhook".to_string(),
            code: None,
        };
        assert!(!other.is_conflict());
        assert!(!other.is_unauthorized());

        let unauthorized = GatewayError::Rejected {
            status: 401,
            message: "Invalid access token. Please check your private app credentials.".to_string(),
            code: None,
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!unauthorized.is_conflict());
    }

    #[test]
    fn test_credentials_normalize_and_redact() {
        let credentials = Credentials::new("https://demo.myshopify.com/admin", "shpat_secret".into());
        assert_eq!(credentials.shop().as_str(), "demo.myshopify.com");
        assert!(!format!("{credentials:?}").contains("shpat_secret"));
    }
}
