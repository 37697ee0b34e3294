//! TrustLoop dashboard library.
//!
//! The merchant-side half of widget installation: a typed client for the
//! gateway, the saved shop connection, and the install/uninstall state
//! machine. The `tl-cli` binary drives it; tests drive it through fakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use trustloop_dashboard::{GatewayClient, InstallTarget, Installer};
//!
//! let gateway = GatewayClient::new("http://127.0.0.1:8787/".parse()?)?;
//! let target = InstallTarget {
//!     widget_origin: "https://widgets.trustloop.app/".parse()?,
//!     webhook_address: Some("https://api.trustloop.app/review-webhook".parse()?),
//! };
//! let mut installer = Installer::new(gateway, connection.credentials());
//!
//! let report = installer.install(&target).await?;
//! if !report.secondary.is_active() {
//!     eprintln!("widget installed, review webhook pending");
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod installer;
pub mod review;
pub mod session;
pub mod snippets;
pub mod store;

pub use client::{Credentials, GatewayClient, GatewayError};
pub use installer::{
    InstallError, InstallReport, InstallState, InstallTarget, Installer, StoreGateway,
    UninstallReport, WebhookOutcome,
};
pub use review::{Review, ReviewReply, ReviewStatus};
pub use session::{SessionError, ShopConnection, ShopSession};
pub use snippets::{Snippet, WidgetKind, all_in_one, all_snippets, snippet};
pub use store::{ConnectionStore, JsonFileStore, MemoryStore, StoreError};
