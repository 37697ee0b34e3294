//! Product listing.

use axum::{Json, Router, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use trustloop_core::Product;

use super::{CredentialFields, parse_body, post_route};
use crate::error::AppError;
use crate::state::AppState;

/// Products returned when the caller gives no limit.
pub const DEFAULT_LIMIT: u32 = 50;

/// Shopify's page size ceiling.
pub const MAX_LIMIT: u32 = 250;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new().route("/shopify-products", post_route(list_products))
}

/// Request for a product listing.
#[derive(Debug, Deserialize)]
pub struct ProductsRequest {
    #[serde(flatten)]
    pub credentials: CredentialFields,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Response with the flattened product list.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

/// Clamp a requested page size into Shopify's accepted range.
#[must_use]
pub fn effective_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// List the shop's products.
///
/// # Errors
///
/// Returns 400 for missing credentials or a Shopify rejection.
#[instrument(skip(state, body))]
pub async fn list_products(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ProductsResponse>, AppError> {
    let request: ProductsRequest = parse_body(&body)?;
    let credentials = request.credentials.into_credentials()?;
    let limit = effective_limit(request.limit);

    let products = state
        .shopify()
        .list_products(&credentials, limit)
        .await
        .map_err(|e| AppError::from_shopify(e, "Failed to fetch products from Shopify"))?;

    tracing::debug!(count = products.len(), limit, "Listed products");

    Ok(Json(ProductsResponse {
        success: true,
        products,
    }))
}
