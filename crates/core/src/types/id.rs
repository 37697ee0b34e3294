//! Newtype IDs for Shopify REST resources.
//!
//! Shopify's REST API uses 64-bit integer IDs, but they travel through the
//! dashboard as strings (JavaScript cannot hold every `i64`). The IDs defined
//! here serialize as numbers and accept either form when deserializing.

/// Macro to define a type-safe Shopify ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize` as a JSON number
/// - `Deserialize` from a JSON number or a numeric string
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `Display` and `FromStr`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use trustloop_core::define_id;
/// define_id!(ThemeId);
///
/// let id: ThemeId = serde_json::from_str("\"42\"").unwrap();
/// assert_eq!(id, ThemeId::new(42));
/// assert_eq!(serde_json::to_string(&id).unwrap(), "42");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                #[derive(::serde::Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Number(i64),
                    Text(String),
                }

                match Raw::deserialize(deserializer)? {
                    Raw::Number(n) => Ok(Self(n)),
                    Raw::Text(s) => s.parse().map_err(::serde::de::Error::custom),
                }
            }
        }
    };
}

define_id!(ShopId);
define_id!(ProductId);
define_id!(ScriptTagId);
define_id!(WebhookId);
define_id!(OrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_number() {
        let id: ScriptTagId = serde_json::from_str("123456789012").unwrap();
        assert_eq!(id.as_i64(), 123_456_789_012);
    }

    #[test]
    fn test_deserialize_string() {
        let id: ScriptTagId = serde_json::from_str("\"596726825\"").unwrap();
        assert_eq!(id, ScriptTagId::new(596_726_825));
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<ScriptTagId>("\"abc\"").is_err());
        assert!(serde_json::from_str::<ScriptTagId>("null").is_err());
    }

    #[test]
    fn test_display_and_from_str() {
        let id: OrderId = " 450789469 ".parse().unwrap();
        assert_eq!(id.to_string(), "450789469");
    }
}
