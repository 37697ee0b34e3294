//! CORS headers.
//!
//! The dashboard calls the gateway from the browser on another origin, so
//! every response allows any origin and every route answers `OPTIONS`.

use axum::{
    extract::Request,
    http::{
        HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, X_CONTENT_TYPE_OPTIONS,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Methods advertised in preflight responses.
pub const ALLOWED_METHODS: &str = "POST, GET, OPTIONS";

/// Request headers the dashboard may send.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Request headers Shopify sends with webhooks.
pub const WEBHOOK_ALLOWED_HEADERS: &str =
    "Content-Type, Authorization, X-Shopify-Topic, X-Shopify-Hmac-Sha256, X-Shopify-Shop-Domain";

/// Add `Access-Control-Allow-Origin: *` and `X-Content-Type-Options: nosniff`
/// to every response that does not already carry them.
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers
        .entry(ACCESS_CONTROL_ALLOW_ORIGIN)
        .or_insert(HeaderValue::from_static("*"));
    headers
        .entry(X_CONTENT_TYPE_OPTIONS)
        .or_insert(HeaderValue::from_static("nosniff"));

    response
}

/// Preflight response for the gateway's proxy routes.
pub async fn preflight() -> Response {
    preflight_response(ALLOWED_HEADERS)
}

/// Preflight response for the webhook receiver.
pub async fn webhook_preflight() -> Response {
    preflight_response(WEBHOOK_ALLOWED_HEADERS)
}

fn preflight_response(allowed_headers: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers),
        ],
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preflight_headers() {
        let response = preflight().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_METHODS],
            "POST, GET, OPTIONS"
        );
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
    }

    #[tokio::test]
    async fn test_webhook_preflight_allows_shopify_headers() {
        let response = webhook_preflight().await;
        let allowed = response.headers()[ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap();
        assert!(allowed.contains("X-Shopify-Hmac-Sha256"));
        assert!(allowed.contains("X-Shopify-Shop-Domain"));
    }
}
