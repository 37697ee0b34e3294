//! Raw Shopify Admin REST shapes and their conversion into client-facing types.
//!
//! Only the fields the gateway reads are declared; Shopify adds keys freely
//! and serde ignores the rest.

use serde::{Deserialize, Serialize};
use trustloop_core::{Product, ProductId, ScriptTag, ShopId, ShopInfo, WebhookRegistration};

/// Fallback image for products without media.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-product.jpg";

/// Price shown when a product has no priced variant.
pub const ZERO_PRICE: &str = "0.00";

// =============================================================================
// Shop
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ShopEnvelope {
    pub shop: RawShop,
}

#[derive(Debug, Deserialize)]
pub struct RawShop {
    pub id: ShopId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    pub myshopify_domain: String,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl From<RawShop> for ShopInfo {
    fn from(raw: RawShop) -> Self {
        Self {
            id: raw.id.to_string(),
            name: raw.name,
            email: raw.email,
            domain: raw.domain,
            myshopify_domain: raw.myshopify_domain,
            plan: raw.plan_name,
            currency: raw.currency,
            timezone: raw.timezone,
        }
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductsEnvelope {
    #[serde(default)]
    pub products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
pub struct RawProduct {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub src: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawVariant {
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub compare_at_price: Option<String>,
}

/// Empty strings count as absent, the way Shopify leaves unset fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        let image_url = raw
            .images
            .into_iter()
            .next()
            .and_then(|image| non_empty(image.src))
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        let (price, compare_at_price) = raw
            .variants
            .into_iter()
            .next()
            .map_or((None, None), |v| (non_empty(v.price), v.compare_at_price));

        Self {
            id: raw.id.to_string(),
            title: raw.title,
            handle: raw.handle,
            description: raw.body_html.unwrap_or_default(),
            status: raw.status,
            vendor: raw.vendor,
            product_type: raw.product_type,
            image_url,
            price: price.unwrap_or_else(|| ZERO_PRICE.to_string()),
            compare_at_price,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

// =============================================================================
// Script tags
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ScriptTagsEnvelope {
    #[serde(default)]
    pub script_tags: Vec<ScriptTag>,
}

#[derive(Debug, Deserialize)]
pub struct ScriptTagEnvelope {
    pub script_tag: ScriptTag,
}

/// Body of `POST script_tags.json`.
#[derive(Debug, Serialize)]
pub struct NewScriptTagEnvelope<'a> {
    pub script_tag: NewScriptTag<'a>,
}

#[derive(Debug, Serialize)]
pub struct NewScriptTag<'a> {
    pub event: &'a str,
    pub src: &'a str,
}

impl<'a> NewScriptTagEnvelope<'a> {
    /// An `onload` tag for `src`.
    #[must_use]
    pub const fn onload(src: &'a str) -> Self {
        Self {
            script_tag: NewScriptTag {
                event: "onload",
                src,
            },
        }
    }
}

// =============================================================================
// Webhooks
// =============================================================================

/// Request and response body of `POST webhooks.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub webhook: WebhookRegistration,
}
