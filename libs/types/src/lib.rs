//! # Pool Ledger Types
//!
//! Shared identifier and parameter types for the liquidity pool ledger.
//!
//! ## Design Philosophy
//!
//! - **Typed Identifiers**: Assets, holders, pools and vaults are distinct 32-byte
//!   types that cannot be swapped by accident
//! - **Canonical Pairs**: A pair is always stored with the smaller identifier as
//!   asset A, so one pair maps to exactly one pool
//! - **Deterministic Addressing**: Pool, vault and claim-token addresses are
//!   keccak256 derivations; no registry is needed to find a pool
//! - **Validated Parameters**: Fees outside `0..=10_000` bps cannot be constructed
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{AssetId, AssetPair, FeeBps};
//!
//! let sol = AssetId::from_label("SOL");
//! let usdc = AssetId::from_label("USDC");
//!
//! // Order of arguments does not matter for `sorted`
//! let pair = AssetPair::sorted(usdc, sol).unwrap();
//! let pool = pair.pool_address();
//!
//! let fee = FeeBps::new(30).unwrap();
//! assert!(FeeBps::new(10_001).is_err());
//! # let _ = (pool, fee);
//! ```
//!
//! ## Integration Points
//!
//! - **amm**: liquidity math operates on raw `u64` amounts but reports pools by
//!   these identifiers
//! - **pool-ledger**: keys its pool map by [`PoolAddress`], custody balances by
//!   ([`HolderId`] / [`VaultAddress`], [`AssetId`])

pub mod common;

pub use common::errors::ValidationError;
pub use common::fee::{FeeBps, MAX_FEE_BPS};
pub use common::identifiers::{AssetId, HolderId, PoolAddress, VaultAddress, IDENTIFIER_LEN};
pub use common::pair::{
    derive_lp_mint, derive_pool_address, derive_vault_address, AssetPair, LIQUIDITY_POOL_SEED,
    LP_MINT_SEED, VAULT_SEED,
};

#[doc(hidden)]
pub mod __reexport {
    pub use crate::common::identifiers::keccak;
    pub use hex;
    pub use serde;
}
