//! Order webhook payloads.
//!
//! Shopify posts the full order resource on `orders/*` topics. Only the parts
//! the review flow needs are modeled; unknown keys are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};

/// Inbound order payload from an `orders/fulfilled` or `orders/paid` webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEvent {
    pub id: OrderId,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
    #[serde(default)]
    pub fulfillments: Vec<OrderFulfillment>,
}

/// Customer contact details attached to an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderCustomer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl OrderCustomer {
    /// First and last name joined, if either is present.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// A purchased line. Custom items carry no `product_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLineItem {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// A fulfillment record on an order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderFulfillment {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The slice of a fulfilled order handed to the review scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FulfilledOrder {
    /// Order ID as a string.
    pub id: String,
    pub customer: OrderCustomer,
    pub line_items: Vec<OrderLineItem>,
    pub fulfilled_at: DateTime<Utc>,
}

impl FulfilledOrder {
    /// Product IDs of every line item that has one, in order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.line_items.iter().filter_map(|item| item.product_id).collect()
    }
}

impl OrderEvent {
    /// Extract the fulfilled order.
    ///
    /// `fulfilled_at` is the first fulfillment's timestamp, or `now` when the
    /// payload carries none.
    #[must_use]
    pub fn into_fulfilled(self, now: DateTime<Utc>) -> FulfilledOrder {
        let fulfilled_at = self
            .fulfillments
            .first()
            .and_then(|f| f.created_at)
            .unwrap_or(now);

        FulfilledOrder {
            id: self.id.to_string(),
            customer: self.customer.unwrap_or_default(),
            line_items: self.line_items,
            fulfilled_at,
        }
    }
}
