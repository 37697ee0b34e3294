//! Shop and product shapes returned by the gateway.
//!
//! These are the flattened, client-facing forms. Shopify's raw REST shapes
//! live in the gateway, which owns the conversion.

use serde::{Deserialize, Serialize};

/// Shop metadata as returned by `shopify-connect`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShopInfo {
    /// Shopify's numeric shop ID, as a string.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    pub myshopify_domain: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// A product as listed by `shopify-products`.
///
/// `image_url` keeps its snake-case key; dashboards already read it that way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(rename = "image_url")]
    pub image_url: String,
    pub price: String,
    #[serde(default)]
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_info_camel_case() {
        let info = ShopInfo {
            id: "548380009".to_string(),
            name: "Demo".to_string(),
            email: Some("owner@demo.test".to_string()),
            domain: Some("demo.test".to_string()),
            myshopify_domain: "demo.myshopify.com".to_string(),
            plan: Some("basic".to_string()),
            currency: Some("USD".to_string()),
            timezone: None,
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["myshopifyDomain"], "demo.myshopify.com");
        assert_eq!(json["plan"], "basic");
        assert_eq!(json["id"], "548380009");
    }

    #[test]
    fn test_product_keys() {
        let product = Product {
            id: "1".to_string(),
            title: "Mug".to_string(),
            handle: Some("mug".to_string()),
            description: String::new(),
            status: Some("active".to_string()),
            vendor: None,
            product_type: Some("Kitchen".to_string()),
            image_url: "/placeholder-product.jpg".to_string(),
            price: "0.00".to_string(),
            compare_at_price: None,
            created_at: None,
            updated_at: None,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["image_url"], "/placeholder-product.jpg");
        assert_eq!(json["productType"], "Kitchen");
        assert!(json.get("compareAtPrice").is_some());
    }
}
