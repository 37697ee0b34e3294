//! Shop connection check.

use axum::{Json, Router, body::Bytes, extract::State};
use serde::Serialize;
use tracing::instrument;
use trustloop_core::ShopInfo;

use super::{CredentialFields, parse_body, post_route};
use crate::error::AppError;
use crate::state::AppState;

/// Message for any non-auth failure reaching Shopify.
const CONNECT_FAILED: &str =
    "Failed to connect to Shopify. Please check your shop domain and access token.";

/// Build the connect router.
pub fn router() -> Router<AppState> {
    Router::new().route("/shopify-connect", post_route(connect))
}

/// Response for a successful connection check.
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub shop: ShopInfo,
}

/// Fetch shop metadata to prove the access token works.
///
/// # Errors
///
/// Returns 400 for missing credentials, 401 if Shopify rejects the token.
#[instrument(skip(state, body))]
pub async fn connect(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ConnectResponse>, AppError> {
    let credentials = parse_body::<CredentialFields>(&body)?.into_credentials()?;

    let shop = state
        .shopify()
        .get_shop(&credentials)
        .await
        .map_err(|e| AppError::from_shopify(e, CONNECT_FAILED))?;

    tracing::info!(shop = %credentials.shop(), name = %shop.name, "Shop connected");

    Ok(Json(ConnectResponse {
        success: true,
        shop,
    }))
}
