//! Customer reviews as the dashboard keeps them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trustloop_core::ShopDomain;

/// Moderation status of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// The merchant's public reply to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReply {
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub shop_domain: ShopDomain,
    pub product_id: String,
    pub product_title: String,
    pub customer_name: String,
    pub customer_email: String,
    /// 1 to 5 stars.
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub helpful_votes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReviewReply>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_review_defaults() {
        let review: Review = serde_json::from_value(serde_json::json!({
            "id": "1",
            "shop_domain": "demo.myshopify.com",
            "product_id": "632910392",
            "product_title": "Premium Wireless Headphones",
            "customer_name": "Sarah Johnson",
            "customer_email": "sarah@example.com",
            "rating": 5,
            "text": "Crystal clear.",
            "created_at": "2024-01-15T10:30:00Z"
        }))
        .unwrap();

        assert_eq!(review.status, ReviewStatus::Pending);
        assert!(!review.is_verified);
        assert!(review.photos.is_empty());
        assert!(review.reply.is_none());
    }
}
