//! Newtype IDs for type-safe entity references.
//!
//! The storefront API identifies every entity with a UUID. Use the
//! `define_id!` macro to create wrappers that prevent accidentally passing a
//! cart item ID where a product ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_uuid()`
/// - `Display` and `FromStr` using the hyphenated UUID form
/// - `From<Uuid>` and `Into<Uuid>` implementations
///
/// # Example
///
/// ```rust
/// # use greenshoes_core::define_id;
/// define_id!(ShoeId);
/// define_id!(BoxId);
///
/// let shoe = ShoeId::new(uuid::Uuid::nil());
/// let parsed: ShoeId = "00000000-0000-0000-0000-000000000000".parse().unwrap();
/// assert_eq!(shoe, parsed);
///
/// // These are different types, so this won't compile:
/// // let _: BoxId = shoe;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Create a new ID from a UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ProductId);
define_id!(ColorId);
define_id!(CartItemId);
define_id!(WishlistItemId);
define_id!(OrderId);
define_id!(AddressId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let id = ProductId::new(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<CartItemId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id: OrderId = "6f1c2a4e-8b9d-4c3e-a1f2-0123456789ab".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6f1c2a4e-8b9d-4c3e-a1f2-0123456789ab\"");
    }
}
