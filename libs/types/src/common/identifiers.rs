//! # Typed 32-byte Identifiers
//!
//! Assets, holders, pools and vaults are all addressed by 32-byte values in the
//! host ledger. Wrapping each one in its own type keeps them from being mixed
//! up at compile time: a `HolderId` cannot be passed where a `PoolAddress` is
//! expected even though both are `[u8; 32]` underneath.
//!
//! ## Ordering
//!
//! All identifiers derive `Ord` over their raw bytes. That total order is what
//! decides which asset of a pair is "A" (see [`crate::AssetPair`]).
//!
//! ## Text form
//!
//! Identifiers render as 64 lowercase hex characters. Human-readable serde
//! formats (JSON, TOML) use the hex form; binary formats use the raw bytes.
//!
//! ```rust
//! use types::{AssetId, HolderId};
//!
//! let usdc = AssetId::from_label("USDC");
//! let alice = HolderId::from_label("alice");
//!
//! let parsed: AssetId = usdc.to_hex().parse().unwrap();
//! assert_eq!(parsed, usdc);
//! # let _ = alice;
//! ```

use sha3::{Digest, Keccak256};

/// Length in bytes of every ledger identifier
pub const IDENTIFIER_LEN: usize = 32;

#[doc(hidden)]
pub fn keccak(parts: &[&[u8]]) -> [u8; IDENTIFIER_LEN] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Macro for generating typed 32-byte identifier wrappers
///
/// Generates hex parsing/formatting, byte access, conversions and serde
/// support. The inner array is public so callers holding raw ledger bytes can
/// wrap them without copying.
#[macro_export]
macro_rules! define_typed_wrapper {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub [u8; $crate::IDENTIFIER_LEN]);

        impl $name {
            /// Wrap raw identifier bytes
            #[inline(always)]
            pub const fn new(inner: [u8; $crate::IDENTIFIER_LEN]) -> Self {
                Self(inner)
            }

            /// Borrow the inner bytes
            #[inline(always)]
            pub const fn inner(&self) -> &[u8; $crate::IDENTIFIER_LEN] {
                &self.0
            }

            #[inline(always)]
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Deterministic identifier for a human-readable label
            ///
            /// Used by fixtures and replay scripts, which name assets and
            /// holders instead of spelling out 64 hex characters.
            pub fn from_label(label: &str) -> Self {
                Self($crate::__reexport::keccak(&[
                    stringify!($name).as_bytes(),
                    b":",
                    label.as_bytes(),
                ]))
            }

            /// Parse from hex, with or without a `0x` prefix
            pub fn from_hex(input: &str) -> Result<Self, $crate::ValidationError> {
                let trimmed = input.strip_prefix("0x").unwrap_or(input);
                let bytes = $crate::__reexport::hex::decode(trimmed).map_err(|e| {
                    $crate::ValidationError::InvalidHex {
                        input: input.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                let actual = bytes.len();
                let inner: [u8; $crate::IDENTIFIER_LEN] =
                    bytes
                        .try_into()
                        .map_err(|_| $crate::ValidationError::InvalidLength {
                            expected: $crate::IDENTIFIER_LEN,
                            actual,
                        })?;
                Ok(Self(inner))
            }

            pub fn to_hex(&self) -> String {
                $crate::__reexport::hex::encode(self.0)
            }

            /// First four bytes as hex, for log lines
            pub fn short(&self) -> String {
                $crate::__reexport::hex::encode(&self.0[..4])
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; $crate::IDENTIFIER_LEN]> for $name {
            #[inline(always)]
            fn from(inner: [u8; $crate::IDENTIFIER_LEN]) -> Self {
                Self(inner)
            }
        }

        impl From<$name> for [u8; $crate::IDENTIFIER_LEN] {
            #[inline(always)]
            fn from(wrapper: $name) -> [u8; $crate::IDENTIFIER_LEN] {
                wrapper.0
            }
        }

        impl AsRef<[u8]> for $name {
            #[inline(always)]
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl $crate::__reexport::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::__reexport::serde::Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_hex())
                } else {
                    $crate::__reexport::serde::Serialize::serialize(&self.0, serializer)
                }
            }
        }

        impl<'de> $crate::__reexport::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: $crate::__reexport::serde::Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let text: String =
                        $crate::__reexport::serde::Deserialize::deserialize(deserializer)?;
                    Self::from_hex(&text).map_err($crate::__reexport::serde::de::Error::custom)
                } else {
                    let inner: [u8; $crate::IDENTIFIER_LEN] =
                        $crate::__reexport::serde::Deserialize::deserialize(deserializer)?;
                    Ok(Self(inner))
                }
            }
        }
    };
}

define_typed_wrapper!(
    /// Fungible asset (token mint) identifier
    ///
    /// Claim tokens are assets too: a pool's LP mint is an `AssetId` derived
    /// from the pool address.
    AssetId
);

define_typed_wrapper!(
    /// Account that pays into or receives from a pool
    HolderId
);

define_typed_wrapper!(
    /// Deterministic address of a pool, derived from its canonical pair
    PoolAddress
);

define_typed_wrapper!(
    /// Custodial vault holding one asset on behalf of one pool
    VaultAddress
);
