//! Theme snippets for merchants who install the widgets by hand.

use serde::Serialize;
use trustloop_core::WIDGET_FILENAME;
use url::Url;

/// The individually embeddable widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Product,
    Collection,
    Cart,
    Homepage,
}

impl WidgetKind {
    pub const ALL: [Self; 4] = [Self::Product, Self::Collection, Self::Cart, Self::Homepage];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Product => "Product Page Widget",
            Self::Collection => "Collection Page Widget",
            Self::Cart => "Cart Page Widget",
            Self::Homepage => "Homepage Carousel",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Product => "Display reviews on your product pages",
            Self::Collection => "Show star ratings on product listings",
            Self::Cart => "Social proof and trust badges in cart",
            Self::Homepage => "Featured reviews carousel for homepage",
        }
    }

    const fn script(self) -> &'static str {
        match self {
            Self::Product => "widget.js",
            Self::Collection => "collection-widget.js",
            Self::Cart => "cart-widget.js",
            Self::Homepage => "homepage-carousel.js",
        }
    }

    const fn comment(self) -> &'static str {
        match self {
            Self::Product => "TrustLoop Product Reviews Widget",
            Self::Collection => "TrustLoop Collection Ratings Widget",
            Self::Cart => "TrustLoop Cart Social Proof Widget",
            Self::Homepage => "TrustLoop Homepage Reviews Carousel",
        }
    }

    /// Mount point the widget renders into, if it needs one.
    const fn container(self) -> Option<&'static str> {
        match self {
            Self::Product => {
                Some(r#"<div id="trustloop-reviews" data-product-id="{{product.id}}"></div>"#)
            }
            Self::Homepage => Some(r#"<div id="trustloop-carousel"></div>"#),
            Self::Collection | Self::Cart => None,
        }
    }
}

/// A copy-paste snippet for one widget.
#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub kind: WidgetKind,
    pub name: &'static str,
    pub description: &'static str,
    pub code: String,
}

fn script_url(origin: &Url, file: &str) -> String {
    origin
        .join(file)
        .map_or_else(|_| format!("{}/{file}", origin.as_str().trim_end_matches('/')), String::from)
}

/// Theme snippet for `kind`, loading its script from `origin`.
#[must_use]
pub fn snippet(kind: WidgetKind, origin: &Url) -> Snippet {
    let mut code = format!("<!-- {} -->\n", kind.comment());
    if let Some(container) = kind.container() {
        code.push_str(container);
        code.push('\n');
    }
    code.push_str(&format!(
        "<script>
  (function() {{
    var script = document.createElement('script');
    script.src = '{}';
    script.async = true;
    document.head.appendChild(script);
  }})();
</script>",
        script_url(origin, kind.script())
    ));

    Snippet {
        kind,
        name: kind.name(),
        description: kind.description(),
        code,
    }
}

/// Snippets for every widget.
#[must_use]
pub fn all_snippets(origin: &Url) -> Vec<Snippet> {
    WidgetKind::ALL
        .iter()
        .map(|&kind| snippet(kind, origin))
        .collect()
}

/// The single tag that loads every widget.
#[must_use]
pub fn all_in_one(origin: &Url) -> String {
    format!(
        r#"<script src="{}" async></script>"#,
        script_url(origin, WIDGET_FILENAME)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://widgets.trustloop.app").unwrap()
    }

    #[test]
    fn test_all_in_one_tag() {
        assert_eq!(
            all_in_one(&origin()),
            r#"<script src="https://widgets.trustloop.app/trustloop-all.js" async></script>"#
        );
    }

    #[test]
    fn test_product_snippet_has_mount_point() {
        let product = snippet(WidgetKind::Product, &origin());
        assert!(product.code.starts_with("<!-- TrustLoop Product Reviews Widget -->\n<div id=\"trustloop-reviews\""));
        assert!(product.code.contains("script.src = 'https://widgets.trustloop.app/widget.js';"));
    }

    #[test]
    fn test_cart_snippet_is_script_only() {
        let cart = snippet(WidgetKind::Cart, &origin());
        assert!(!cart.code.contains("<div"));
        assert!(cart.code.contains("cart-widget.js"));
    }

    #[test]
    fn test_all_snippets_cover_every_widget() {
        let snippets = all_snippets(&origin());
        assert_eq!(snippets.len(), 4);
        assert_eq!(snippets[3].name, "Homepage Carousel");
    }
}
