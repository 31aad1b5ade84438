//! Strongly-typed identifiers.
//!
//! Every identifier is a UUIDv7 newtype. Other crates declare their own with
//! [`uuid_newtype!`](crate::uuid_newtype) so a `LocationId` can never be passed
//! where a `TransferId` is expected.

/// Declare a `Copy` UUID newtype with `new`, `Display`, `FromStr` and serde
/// support.
#[macro_export]
macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $vis:vis struct $t:ident;) => {
        $(#[$meta])*
        #[derive(
            Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $t(::uuid::Uuid);

        impl $t {
            /// Time-ordered (UUIDv7) identifier.
            pub fn new() -> Self {
                Self(::uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<::uuid::Uuid> for $t {
            fn from(value: ::uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for ::uuid::Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = <::uuid::Uuid as core::str::FromStr>::from_str(s).map_err(|e| {
                    $crate::DomainError::invalid_id(format!("{}: {}", stringify!($t), e))
                })?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype! {
    /// Tenant (company) boundary.
    pub struct TenantId;
}

uuid_newtype! {
    /// Acting user, e.g. the inspector on a report.
    pub struct UserId;
}

uuid_newtype! {
    /// Identifier of an aggregate root.
    pub struct AggregateId;
}
