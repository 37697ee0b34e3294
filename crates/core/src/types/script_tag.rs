//! Storefront script tags.

use serde::{Deserialize, Serialize};

use super::id::ScriptTagId;

/// Canonical filename of the all-in-one review widget bundle.
///
/// A store counts as "installed" when at least one of its script tags loads
/// a `src` containing this name.
pub const WIDGET_FILENAME: &str = "trustloop-all.js";

/// A script registered with Shopify for injection into storefront pages.
///
/// Field names follow Shopify's REST representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptTag {
    pub id: ScriptTagId,
    pub src: String,
    #[serde(default = "default_event")]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_event() -> String {
    "onload".to_string()
}

impl ScriptTag {
    /// Whether this tag loads the given widget file.
    #[must_use]
    pub fn loads(&self, filename: &str) -> bool {
        self.src.contains(filename)
    }
}

/// Select every tag that loads the widget file, in listing order.
///
/// Repeated installs leave stale duplicates behind, so callers must treat the
/// result as a set rather than expecting a single match.
#[must_use]
pub fn matching_widget_tags<'a>(tags: &'a [ScriptTag], filename: &str) -> Vec<&'a ScriptTag> {
    tags.iter().filter(|tag| tag.loads(filename)).collect()
}
