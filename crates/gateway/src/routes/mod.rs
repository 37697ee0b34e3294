//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health               - Liveness check
//!
//! # Shopify Admin proxy (JSON body carries shop + accessToken)
//! POST /shopify-connect      - Shop info / token check
//! POST /shopify-products     - Product listing
//! POST /shopify-script-tags  - list | create | delete script tags
//! POST /shopify-webhooks     - Register a webhook
//!
//! # Reviews
//! POST /review-webhook       - Shopify order webhooks (X-Shopify-* headers)
//! POST /send-review-email    - Render and (simulated) send a review request
//! ```
//!
//! Every route answers `OPTIONS` with a CORS preflight and any other method
//! with `405 {"error": "Method not allowed"}`.

pub mod connect;
pub mod products;
pub mod review_email;
pub mod review_webhook;
pub mod script_tags;
pub mod webhooks;

use axum::{
    Router,
    handler::Handler,
    routing::{MethodRouter, post},
};
use serde::{Deserialize, de::DeserializeOwned};
use secrecy::SecretString;
use trustloop_core::ShopDomain;

use crate::error::AppError;
use crate::middleware::preflight;
use crate::shopify::ShopCredentials;
use crate::state::AppState;

/// Message for a request without shop or access token.
pub const MISSING_CREDENTIALS: &str = "Shop domain and access token are required";

/// Message for a request missing operation-specific fields.
pub const MISSING_PARAMETERS: &str = "Missing required parameters";

/// Build the complete gateway router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(connect::router())
        .merge(products::router())
        .merge(script_tags::router())
        .merge(webhooks::router())
        .merge(review_webhook::router())
        .merge(review_email::router())
}

/// A `POST` route with the standard preflight and 405 fallback.
pub fn post_route<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler).options(preflight).fallback(method_not_allowed)
}

/// Fallback for methods a route does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Parse a JSON request body.
///
/// # Errors
///
/// Returns `AppError::Validation` if the body is not valid JSON for `T`.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        AppError::Validation("Invalid JSON body".to_string())
    })
}

/// The `shop` and `accessToken` fields every proxy request carries.
///
/// Implements `Debug` manually to redact the token.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialFields {
    #[serde(default)]
    pub shop: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for CredentialFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialFields")
            .field("shop", &self.shop)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CredentialFields {
    /// Validate and normalize into credentials for the Admin API.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if either field is missing or blank,
    /// or the shop is not a plausible store handle.
    pub fn into_credentials(self) -> Result<ShopCredentials, AppError> {
        let shop = self.shop.filter(|s| !s.trim().is_empty());
        let token = self.access_token.filter(|t| !t.trim().is_empty());

        let (Some(shop), Some(token)) = (shop, token) else {
            return Err(AppError::Validation(MISSING_CREDENTIALS.to_string()));
        };

        let shop = ShopDomain::normalize(&shop);
        if !shop.is_well_formed() {
            return Err(AppError::Validation("Invalid shop domain".to_string()));
        }

        Ok(ShopCredentials::new(
            shop,
            SecretString::from(token.trim().to_string()),
        ))
    }
}

/// Treat a blank optional string as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::config::GatewayConfig;
    use crate::state::AppState;

    /// The full app against an unreachable Shopify origin, so any upstream
    /// call fails loudly.
    pub fn app() -> Router {
        let mut config = GatewayConfig::local();
        config.shopify.admin_origin = Some("http://127.0.0.1:9".parse().unwrap());
        crate::app(AppState::new(config).unwrap())
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}
