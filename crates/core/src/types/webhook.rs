//! Webhook topics and registrations.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::WebhookId;

/// A Shopify webhook topic.
///
/// Only the topics the review flow reacts to get their own variant; every
/// other topic is kept verbatim so it can be logged and acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WebhookTopic {
    /// `orders/fulfilled` - triggers a review request.
    OrdersFulfilled,
    /// `orders/paid` - reserved for immediate review requests on digital goods.
    OrdersPaid,
    /// Any other topic.
    Other(String),
}

impl WebhookTopic {
    /// The topic string as Shopify spells it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::OrdersFulfilled => "orders/fulfilled",
            Self::OrdersPaid => "orders/paid",
            Self::Other(topic) => topic,
        }
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookTopic {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "orders/fulfilled" => Self::OrdersFulfilled,
            "orders/paid" => Self::OrdersPaid,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Serialize for WebhookTopic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WebhookTopic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(topic) = raw.parse::<Self>();
        Ok(topic)
    }
}

/// Payload format of a webhook subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookFormat {
    #[default]
    Json,
    Xml,
}

/// A webhook subscription as registered with Shopify.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookRegistration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WebhookId>,
    pub topic: WebhookTopic,
    pub address: String,
    #[serde(default)]
    pub format: WebhookFormat,
}

impl WebhookRegistration {
    /// A new JSON-format subscription that has not been registered yet.
    #[must_use]
    pub fn new(topic: WebhookTopic, address: impl Into<String>) -> Self {
        Self {
            id: None,
            topic,
            address: address.into(),
            format: WebhookFormat::Json,
        }
    }
}
