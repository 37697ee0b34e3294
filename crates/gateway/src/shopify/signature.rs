//! Webhook signature verification.
//!
//! Shopify signs every webhook with `X-Shopify-Hmac-Sha256`: the base64
//! HMAC-SHA256 of the raw request body, keyed with the app's shared secret.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

/// Why a webhook signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature header")]
    Missing,
    #[error("Signature is not valid base64")]
    Malformed,
    #[error("Signature mismatch")]
    Mismatch,
}

/// Verify a webhook body against its `X-Shopify-Hmac-Sha256` header value.
///
/// # Errors
///
/// Returns `SignatureError` if the header is absent, undecodable, or does not
/// match the body.
pub fn verify_webhook(
    secret: &SecretString,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing)?;

    let expected = BASE64
        .decode(signature)
        .map_err(|_| SignatureError::Malformed)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the header value Shopify would send for `body`.
#[must_use]
pub fn sign_webhook(secret: &SecretString, body: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes()).ok()?;
    mac.update(body);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}
