//! TrustLoop Core - Shared types library.
//!
//! This crate provides common types used across all TrustLoop components:
//! - `gateway` - Shopify Admin REST proxy and webhook receiver
//! - `dashboard` - Merchant-side session, persistence port and widget installer
//! - `cli` - Command-line dashboard
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shop domains, typed Shopify IDs, script tags, webhooks,
//!   order events, shop info and products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
