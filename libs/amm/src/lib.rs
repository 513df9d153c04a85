//! # Pool Ledger AMM Library - Exact Liquidity Mathematics
//!
//! ## Purpose
//!
//! Pure calculation layer for a two-asset liquidity pool: how many claim
//! tokens a deposit mints, how much of each asset a deposit commits, and how
//! much of each reserve a redemption pays out. Nothing in this crate holds
//! state or moves tokens; callers pass in the current counters and get back a
//! quote they can settle and commit.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool counters (`reserve_a`, `reserve_b`, `lp_supply`) from the ledger engine
//! - **Output Destinations**: Ledger engine settlement and commit, dry-run quotes, CLI reports
//! - **Policy**: [`DepositPolicy`] names which side of a deposit is authoritative
//!
//! ## Precision
//!
//! - **Integer Only**: `u64` amounts with `u128` intermediates for every product
//! - **Floor Rounding**: Rounding loss always stays in the pool
//! - **Overflow**: Reported as [`LiquidityError::MathOverflow`], never wrapped
//! - **Reporting**: [`Decimal`] is used for spot prices only, never for accounting

pub mod liquidity_math;
pub mod pool_traits;

pub use liquidity_math::{
    DepositPolicy, DepositQuote, LiquidityError, LiquidityMath, PoolReserves, WithdrawalQuote,
};
pub use pool_traits::LiquidityPool;

/// Common types for price reporting
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
