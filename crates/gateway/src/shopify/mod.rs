//! Shopify Admin REST API access.
//!
//! # Architecture
//!
//! - One pooled [`AdminClient`] per process; the shop and access token
//!   travel with every call as [`ShopCredentials`]
//! - Non-2xx bodies are logged here and never leave the gateway
//! - Inbound webhook signatures are checked by [`verify_webhook`]
//!
//! # Example
//!
//! ```rust,ignore
//! use trustloop_gateway::shopify::{AdminClient, ShopCredentials};
//!
//! let client = AdminClient::new(&config.shopify)?;
//! let credentials = ShopCredentials::new(ShopDomain::normalize("demo"), token);
//!
//! let tags = client.list_script_tags(&credentials).await?;
//! ```

mod client;
mod signature;
pub mod wire;

pub use client::{AdminClient, ShopCredentials};
pub use signature::{SignatureError, sign_webhook, verify_webhook};

use thiserror::Error;

/// Errors that can occur when calling the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Successful response with an unexpected body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Shopify rejected the access token (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The resource already exists (HTTP 422 "has already been taken").
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-2xx response.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::Api {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not Found");
        assert_eq!(ShopifyError::Unauthorized.to_string(), "Unauthorized");
    }
}
