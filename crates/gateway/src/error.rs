//! Unified error handling for the gateway.
//!
//! Every error renders as `{"error": "..."}` (plus a `code` for conflicts).
//! Shopify's own error bodies never reach the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Message returned when Shopify rejects the access token.
pub const INVALID_TOKEN_MESSAGE: &str =
    "Invalid access token. Please check your private app credentials.";

/// Machine-readable code attached to conflict responses.
pub const ALREADY_EXISTS_CODE: &str = "already_exists";

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input, caught before any upstream call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Shopify answered with a non-2xx status. Holds the generic message.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Shopify rejected the access token, or a webhook signature failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The resource already exists upstream.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The route exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Anything unexpected.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a Shopify failure onto the response taxonomy, with `failure` as
    /// the message for ordinary upstream rejections.
    ///
    /// A conflict is only meaningful to the route that created the resource,
    /// so here it is an ordinary rejection; routes that report conflicts
    /// match `ShopifyError::Conflict` before calling this.
    #[must_use]
    pub fn from_shopify(err: ShopifyError, failure: &str) -> Self {
        match err {
            ShopifyError::Unauthorized => Self::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()),
            ShopifyError::Conflict(_) | ShopifyError::Api { .. } => {
                Self::Upstream(failure.to_string())
            }
            ShopifyError::Http(_) | ShopifyError::Url(_) | ShopifyError::Parse(_) => {
                Self::Internal(err.to_string())
            }
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Upstream(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Internal(_) | Self::Upstream(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Gateway request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(message) | Self::Upstream(message) | Self::Unauthorized(message) => {
                json!({ "error": message })
            }
            Self::Conflict(message) => json!({ "error": message, "code": ALREADY_EXISTS_CODE }),
            Self::MethodNotAllowed => json!({ "error": "Method not allowed" }),
            Self::Internal(_) => json!({ "error": "Internal server error" }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_body() {
        let (status, body) = render(AppError::Validation("Missing required parameters".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing required parameters"}));
    }

    #[tokio::test]
    async fn test_internal_hides_details() {
        let (status, body) = render(AppError::Internal("connection reset by peer".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_conflict_carries_code() {
        let (status, body) = render(AppError::Conflict("Webhook already exists".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "Webhook already exists", "code": "already_exists"})
        );
    }

    #[tokio::test]
    async fn test_shopify_conflict_is_plain_rejection() {
        let err = AppError::from_shopify(
            ShopifyError::Conflict(r#"{"errors":{"src":["has already been taken"]}}"#.into()),
            "Failed to create script tag",
        );
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Failed to create script tag"}));
    }

    #[test]
    fn test_from_shopify_mapping() {
        assert_eq!(
            AppError::from_shopify(ShopifyError::Unauthorized, "x").status(),
            StatusCode::UNAUTHORIZED
        );

        let err = AppError::from_shopify(
            ShopifyError::Api {
                status: 404,
                body: "{\"errors\":\"Not Found\"}".into(),
            },
            "Failed to list script tags",
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Upstream error: Failed to list script tags");

        assert_eq!(
            AppError::from_shopify(ShopifyError::Parse("eof".into()), "x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_method_not_allowed_status() {
        assert_eq!(
            AppError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
