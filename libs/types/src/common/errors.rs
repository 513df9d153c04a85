//! Error types for identifier parsing and pool parameter validation
//!
//! Every variant here is a validation failure: it is detected before any
//! state is touched and is safe to surface verbatim to the caller.

use thiserror::Error;

/// Errors that can occur while validating identifiers, pairs and fees
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Fee is above 100%
    #[error("invalid fee value {value} bps: must be at most {max} bps")]
    InvalidFeeValue { value: u64, max: u16 },

    /// Both sides of a pair are the same asset
    #[error("asset pair must contain two distinct assets")]
    IdenticalAssets,

    /// Pair was given with the larger identifier first
    #[error("invalid asset ordering: asset_a must sort before asset_b")]
    InvalidAssetOrdering,

    /// Identifier string is not valid hex
    #[error("invalid hex identifier '{input}': {reason}")]
    InvalidHex { input: String, reason: String },

    /// Identifier has the wrong number of bytes
    #[error("invalid identifier length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
