//! Newtype references for type-safe entity identifiers.
//!
//! Use the `define_ref!` macro to create string-backed wrappers that prevent
//! accidentally mixing identifiers from different entity types.

/// Macro to define a type-safe string reference wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use tillpoint_core::define_ref;
/// define_ref!(SkuRef);
/// define_ref!(CouponRef);
///
/// let sku = SkuRef::new("SKU-1");
/// let coupon = CouponRef::new("SKU-1");
///
/// // These are different types, so this won't compile:
/// // let _: SkuRef = coupon;
/// assert_eq!(sku.as_str(), coupon.as_str());
/// ```
#[macro_export]
macro_rules! define_ref {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new reference from anything string-like.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the underlying string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the reference and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard references
define_ref!(ProductRef);
define_ref!(TrackingNumber);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_inner() {
        let product = ProductRef::new("P1");
        assert_eq!(product.to_string(), "P1");
        assert_eq!(product.as_str(), "P1");
    }

    #[test]
    fn test_serializes_transparently() {
        let tracking = TrackingNumber::from("a1b2-c3");
        let json = serde_json::to_string(&tracking).unwrap();
        assert_eq!(json, "\"a1b2-c3\"");

        let parsed: TrackingNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tracking);
    }

    #[test]
    fn test_into_string() {
        let s: String = ProductRef::new("P9").into();
        assert_eq!(s, "P9");
    }
}
