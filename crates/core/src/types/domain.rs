//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The suffix every normalized shop domain ends with.
pub const MYSHOPIFY_SUFFIX: &str = ".myshopify.com";

const SCHEMES: &[&str] = &["https://", "http://"];

/// A normalized Shopify shop domain (`<handle>.myshopify.com`).
///
/// Merchants type their shop in many shapes: a bare handle, a full admin URL,
/// or the myshopify domain with a trailing path. Normalization maps all of
/// them onto the same value:
///
/// 1. surrounding whitespace and any leading `http://` / `https://` are
///    stripped (repeatedly, ignoring case)
/// 2. the first `.myshopify.com` and everything after it is dropped
/// 3. `.myshopify.com` is appended
///
/// Normalization is total (every string yields a domain) and idempotent.
///
/// ## Examples
///
/// ```
/// use trustloop_core::ShopDomain;
///
/// let a = ShopDomain::normalize("https://foo.myshopify.com/admin");
/// let b = ShopDomain::normalize("foo");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "foo.myshopify.com");
/// assert_eq!(a.handle(), "foo");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Normalize a user-supplied shop value.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let mut rest = raw.trim();
        while let Some(stripped) = strip_scheme(rest) {
            rest = stripped.trim();
        }

        let handle = rest
            .find(MYSHOPIFY_SUFFIX)
            .map_or(rest, |idx| rest.get(..idx).unwrap_or(rest));

        Self(format!("{handle}{MYSHOPIFY_SUFFIX}"))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the shop handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(MYSHOPIFY_SUFFIX).unwrap_or(&self.0)
    }

    /// Whether the handle is a plausible Shopify store handle: non-empty,
    /// ASCII letters, digits and hyphens only.
    ///
    /// Normalization never fails, so callers that build URLs from the domain
    /// must check this first; a handle like `evil.com/x` would otherwise
    /// redirect the request to another host.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let handle = self.handle();
        !handle.is_empty()
            && handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    /// Consumes the domain and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn strip_scheme(s: &str) -> Option<&str> {
    SCHEMES.iter().find_map(|scheme| {
        let head = s.get(..scheme.len())?;
        head.eq_ignore_ascii_case(scheme)
            .then(|| s.get(scheme.len()..))
            .flatten()
    })
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShopDomain {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_handle() {
        assert_eq!(ShopDomain::normalize("foo").as_str(), "foo.myshopify.com");
    }

    #[test]
    fn test_full_admin_url() {
        assert_eq!(
            ShopDomain::normalize("https://foo.myshopify.com/admin").as_str(),
            "foo.myshopify.com"
        );
        assert_eq!(
            ShopDomain::normalize("http://foo.myshopify.com/whatever?x=1").as_str(),
            "foo.myshopify.com"
        );
    }

    #[test]
    fn test_already_normalized() {
        assert_eq!(
            ShopDomain::normalize("demo-store.myshopify.com").as_str(),
            "demo-store.myshopify.com"
        );
    }

    #[test]
    fn test_uppercase_scheme_and_whitespace() {
        assert_eq!(
            ShopDomain::normalize("  HTTPS://foo.myshopify.com  ").as_str(),
            "foo.myshopify.com"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "foo",
            "https://foo.myshopify.com/admin",
            "http://http://foo",
            " http:// foo",
            "foo .myshopify.com",
            "a.myshopify",
            "x.",
            "https://",
            "foo.myshopify.com.myshopify.com",
            "http:/.myshopify.com",
            "custom-domain.example.com",
        ];

        for input in inputs {
            let once = ShopDomain::normalize(input);
            let twice = ShopDomain::normalize(once.as_str());
            assert_eq!(once, twice, "normalize is not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_mixed_case_repeated_suffix_and_whitespace() {
        assert_eq!(
            ShopDomain::normalize("  HTTPS://demo.myshopify.com/admin  ").as_str(),
            "demo.myshopify.com"
        );
        assert_eq!(
            ShopDomain::normalize("HtTp://hTtPs://demo").as_str(),
            "demo.myshopify.com"
        );
        assert_eq!(
            ShopDomain::normalize("\tdemo.myshopify.com.myshopify.com.myshopify.com\n").as_str(),
            "demo.myshopify.com"
        );

        // The suffix match is case-sensitive; an upper-case suffix is kept
        // as part of the handle, and stays put on re-normalization.
        let upper = ShopDomain::normalize("HTTPS://Demo.MYSHOPIFY.COM");
        assert_eq!(upper.as_str(), "Demo.MYSHOPIFY.COM.myshopify.com");
        assert_eq!(ShopDomain::normalize(upper.as_str()), upper);
    }

    #[test]
    fn test_idempotent_across_combined_inputs() {
        let schemes = ["", "http://", "HTTPS://", "Https:// http://", " hTTp://\t"];
        let handles = ["", "demo", "Demo-42", "shop.example.com", "a b"];
        let suffixes = [
            "",
            ".myshopify.com",
            ".myshopify.com.myshopify.com",
            ".MyShopify.com",
            ".myshopify.com/admin?x=1",
        ];
        let padding = ["", " ", "\t\n "];

        for scheme in schemes {
            for handle in handles {
                for suffix in suffixes {
                    for pad in padding {
                        let input = format!("{pad}{scheme}{handle}{suffix}{pad}");
                        let once = ShopDomain::normalize(&input);
                        let twice = ShopDomain::normalize(once.as_str());
                        assert_eq!(once, twice, "normalize is not idempotent for {input:?}");
                        assert!(once.as_str().ends_with(MYSHOPIFY_SUFFIX));
                    }
                }
            }
        }
    }

    #[test]
    fn test_always_ends_with_suffix() {
        for input in ["", "foo", "https://", "foo.myshopify.com/x"] {
            assert!(ShopDomain::normalize(input).as_str().ends_with(MYSHOPIFY_SUFFIX));
        }
    }

    #[test]
    fn test_handle() {
        let domain = ShopDomain::normalize("https://demo.myshopify.com");
        assert_eq!(domain.handle(), "demo");
    }

    #[test]
    fn test_is_well_formed() {
        assert!(ShopDomain::normalize("demo-store").is_well_formed());
        assert!(ShopDomain::normalize("https://Demo42.myshopify.com/admin").is_well_formed());
        assert!(!ShopDomain::normalize("").is_well_formed());
        assert!(!ShopDomain::normalize("evil.com/x").is_well_formed());
        assert!(!ShopDomain::normalize("foo bar").is_well_formed());
    }

    #[test]
    fn test_serde_transparent() {
        let domain = ShopDomain::normalize("demo");
        let json = serde_json::to_string(&domain).expect("serialize");
        assert_eq!(json, "\"demo.myshopify.com\"");
    }
}
