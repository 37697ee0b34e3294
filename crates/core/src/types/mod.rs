//! Core types for TrustLoop.
//!
//! This module provides type-safe wrappers for the Shopify resources the
//! widget lifecycle touches.

pub mod domain;
pub mod id;
pub mod order;
pub mod script_tag;
pub mod shop;
pub mod webhook;

pub use domain::{MYSHOPIFY_SUFFIX, ShopDomain};
pub use id::*;
pub use order::{FulfilledOrder, OrderCustomer, OrderEvent, OrderFulfillment, OrderLineItem};
pub use script_tag::{ScriptTag, WIDGET_FILENAME, matching_widget_tags};
pub use shop::{Product, ShopInfo};
pub use webhook::{WebhookFormat, WebhookRegistration, WebhookTopic};
