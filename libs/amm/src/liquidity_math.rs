//! Two-asset liquidity math with exact integer arithmetic
//!
//! Every ratio is computed as multiply-then-floor-divide with `u128`
//! intermediates. Floor rounding always favours the pool: a depositor never
//! receives more claim tokens than their contribution is worth, and a
//! redeemer never receives more than their proportional share.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced while quoting deposits and withdrawals
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityError {
    #[error("deposit amount must be greater than zero")]
    ZeroAmount,

    #[error("deposit is too small to mint any claim tokens")]
    InsufficientLiquidityMinted,

    #[error("withdrawal of {lp_amount} claim tokens is too small (minimum {minimum})")]
    WithdrawalTooSmall { lp_amount: u64, minimum: u64 },

    #[error("pool has no liquidity")]
    EmptyPool,

    #[error("redeeming {lp_amount} claim tokens exceeds outstanding supply {lp_supply}")]
    ExceedsSupply { lp_amount: u64, lp_supply: u64 },

    #[error("arithmetic overflow")]
    MathOverflow,
}

pub type Result<T> = std::result::Result<T, LiquidityError>;

/// Which side of a deposit into a funded pool is authoritative
///
/// `AnchorOnA` takes `amount_a` as given and charges whatever amount of B
/// keeps the reserve ratio, even when that exceeds the `amount_b` the caller
/// passed. `CappedByBoth` treats both amounts as upper bounds and scales
/// down whichever side is in excess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositPolicy {
    #[default]
    AnchorOnA,
    CappedByBoth,
}

impl std::fmt::Display for DepositPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepositPolicy::AnchorOnA => f.write_str("anchor_on_a"),
            DepositPolicy::CappedByBoth => f.write_str("capped_by_both"),
        }
    }
}

impl std::str::FromStr for DepositPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "anchor_on_a" => Ok(DepositPolicy::AnchorOnA),
            "capped_by_both" => Ok(DepositPolicy::CappedByBoth),
            other => Err(format!("unknown deposit policy '{}'", other)),
        }
    }
}

/// Reserve and supply counters of one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolReserves {
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub lp_supply: u64,
}

/// Amounts a deposit commits and the claim tokens it mints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositQuote {
    pub committed_a: u64,
    pub committed_b: u64,
    pub lp_minted: u64,
}

/// Amounts a redemption pays out and the claim tokens it burns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalQuote {
    pub payout_a: u64,
    pub payout_b: u64,
    pub lp_burned: u64,
}

impl PoolReserves {
    pub const EMPTY: PoolReserves = PoolReserves {
        reserve_a: 0,
        reserve_b: 0,
        lp_supply: 0,
    };

    pub fn new(reserve_a: u64, reserve_b: u64, lp_supply: u64) -> Self {
        Self {
            reserve_a,
            reserve_b,
            lp_supply,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lp_supply == 0
    }

    /// `reserve_a == 0 <=> reserve_b == 0 <=> lp_supply == 0`
    pub fn is_consistent(&self) -> bool {
        let a_empty = self.reserve_a == 0;
        let b_empty = self.reserve_b == 0;
        let supply_empty = self.lp_supply == 0;
        a_empty == b_empty && b_empty == supply_empty
    }

    /// Counters after committing a deposit
    pub fn after_deposit(&self, quote: &DepositQuote) -> Result<PoolReserves> {
        Ok(PoolReserves {
            reserve_a: self
                .reserve_a
                .checked_add(quote.committed_a)
                .ok_or(LiquidityError::MathOverflow)?,
            reserve_b: self
                .reserve_b
                .checked_add(quote.committed_b)
                .ok_or(LiquidityError::MathOverflow)?,
            lp_supply: self
                .lp_supply
                .checked_add(quote.lp_minted)
                .ok_or(LiquidityError::MathOverflow)?,
        })
    }

    /// Counters after committing a redemption
    pub fn after_withdrawal(&self, quote: &WithdrawalQuote) -> Result<PoolReserves> {
        Ok(PoolReserves {
            reserve_a: self
                .reserve_a
                .checked_sub(quote.payout_a)
                .ok_or(LiquidityError::MathOverflow)?,
            reserve_b: self
                .reserve_b
                .checked_sub(quote.payout_b)
                .ok_or(LiquidityError::MathOverflow)?,
            lp_supply: self
                .lp_supply
                .checked_sub(quote.lp_burned)
                .ok_or(LiquidityError::MathOverflow)?,
        })
    }
}

/// Liquidity math functions
pub struct LiquidityMath;

impl LiquidityMath {
    /// Integer square root, `floor(sqrt(n))`
    ///
    /// Newton iteration from an initial guess of `2^ceil(bits/2)`, which is
    /// always at or above the root, so the sequence decreases monotonically
    /// and stops at the floor.
    pub fn isqrt(n: u128) -> u128 {
        if n < 2 {
            return n;
        }

        let bits = 128 - n.leading_zeros();
        let mut x = 1u128 << bits.div_ceil(2);

        loop {
            let y = (x + n / x) >> 1;
            if y >= x {
                return x;
            }
            x = y;
        }
    }

    /// `floor(a * b / denominator)` with a `u128` intermediate
    pub fn mul_div_floor(a: u64, b: u64, denominator: u64) -> Result<u64> {
        let product = (a as u128) * (b as u128);
        let quotient = product
            .checked_div(denominator as u128)
            .ok_or(LiquidityError::MathOverflow)?;
        u64::try_from(quotient).map_err(|_| LiquidityError::MathOverflow)
    }

    /// Claim tokens minted by the first deposit into an empty pool
    ///
    /// `floor(sqrt(amount_a * amount_b))`: scales with both sides, so a
    /// lopsided first deposit cannot inflate the unit of account.
    pub fn initial_liquidity(amount_a: u64, amount_b: u64) -> Result<u64> {
        if amount_a == 0 || amount_b == 0 {
            return Err(LiquidityError::ZeroAmount);
        }
        let product = (amount_a as u128) * (amount_b as u128);
        // sqrt of a product of two u64 values always fits in u64
        u64::try_from(Self::isqrt(product)).map_err(|_| LiquidityError::MathOverflow)
    }

    /// Quote a deposit of `amount_a` / `amount_b` into `pool`
    ///
    /// # Arguments
    /// * `pool` - Current reserve and supply counters
    /// * `amount_a` - Desired amount of asset A (the anchor under `AnchorOnA`)
    /// * `amount_b` - Desired amount of asset B (ignored as a cap under `AnchorOnA`
    ///   once the pool is funded)
    /// * `policy` - Ratio policy for funded pools
    ///
    /// # Returns
    /// Committed amounts and claim tokens minted. Nothing is mutated.
    pub fn quote_deposit(
        pool: &PoolReserves,
        amount_a: u64,
        amount_b: u64,
        policy: DepositPolicy,
    ) -> Result<DepositQuote> {
        if pool.is_empty() {
            debug_assert!(pool.is_consistent(), "empty supply with funded reserves");
            let lp_minted = Self::initial_liquidity(amount_a, amount_b)?;
            debug!(amount_a, amount_b, lp_minted, "Quoted initial deposit");
            return Ok(DepositQuote {
                committed_a: amount_a,
                committed_b: amount_b,
                lp_minted,
            });
        }

        let quote = match policy {
            DepositPolicy::AnchorOnA => Self::quote_anchored(pool, amount_a)?,
            DepositPolicy::CappedByBoth => Self::quote_capped(pool, amount_a, amount_b)?,
        };

        if quote.lp_minted == 0 {
            return Err(LiquidityError::InsufficientLiquidityMinted);
        }

        debug!(
            %policy,
            requested_a = amount_a,
            requested_b = amount_b,
            committed_a = quote.committed_a,
            committed_b = quote.committed_b,
            lp_minted = quote.lp_minted,
            "Quoted proportional deposit"
        );
        Ok(quote)
    }

    fn quote_anchored(pool: &PoolReserves, amount_a: u64) -> Result<DepositQuote> {
        if amount_a == 0 {
            return Err(LiquidityError::ZeroAmount);
        }

        let required_b = Self::mul_div_floor(amount_a, pool.reserve_b, pool.reserve_a)?;
        let lp_minted = Self::mul_div_floor(pool.lp_supply, amount_a, pool.reserve_a)?;

        Ok(DepositQuote {
            committed_a: amount_a,
            committed_b: required_b,
            lp_minted,
        })
    }

    fn quote_capped(pool: &PoolReserves, amount_a: u64, amount_b: u64) -> Result<DepositQuote> {
        if amount_a == 0 || amount_b == 0 {
            return Err(LiquidityError::ZeroAmount);
        }

        let required_b = Self::mul_div_floor(amount_a, pool.reserve_b, pool.reserve_a)?;
        let (committed_a, committed_b) = if required_b <= amount_b {
            (amount_a, required_b)
        } else {
            let required_a = Self::mul_div_floor(amount_b, pool.reserve_a, pool.reserve_b)?;
            (required_a, amount_b)
        };

        // Mint against the less generous side
        let minted_by_a = Self::mul_div_floor(pool.lp_supply, committed_a, pool.reserve_a)?;
        let minted_by_b = Self::mul_div_floor(pool.lp_supply, committed_b, pool.reserve_b)?;

        Ok(DepositQuote {
            committed_a,
            committed_b,
            lp_minted: minted_by_a.min(minted_by_b),
        })
    }

    /// Quote redeeming `lp_amount` claim tokens from `pool`
    ///
    /// `payout_x = floor(reserve_x * lp_amount / lp_supply)`. Redeeming the
    /// whole supply pays out the whole reserve.
    pub fn quote_withdrawal(
        pool: &PoolReserves,
        lp_amount: u64,
        minimum_withdrawal: u64,
    ) -> Result<WithdrawalQuote> {
        if lp_amount < minimum_withdrawal {
            return Err(LiquidityError::WithdrawalTooSmall {
                lp_amount,
                minimum: minimum_withdrawal,
            });
        }
        if pool.is_empty() {
            return Err(LiquidityError::EmptyPool);
        }
        if lp_amount > pool.lp_supply {
            return Err(LiquidityError::ExceedsSupply {
                lp_amount,
                lp_supply: pool.lp_supply,
            });
        }

        let (payout_a, payout_b) = Self::redemption_value(pool, lp_amount)?;

        if payout_a == 0 || payout_b == 0 {
            return Err(LiquidityError::WithdrawalTooSmall {
                lp_amount,
                minimum: minimum_withdrawal,
            });
        }

        debug!(lp_amount, payout_a, payout_b, "Quoted withdrawal");
        Ok(WithdrawalQuote {
            payout_a,
            payout_b,
            lp_burned: lp_amount,
        })
    }

    /// Reserve share backing `lp_amount` claim tokens, without any minimum
    pub fn redemption_value(pool: &PoolReserves, lp_amount: u64) -> Result<(u64, u64)> {
        if pool.is_empty() {
            return Err(LiquidityError::EmptyPool);
        }
        let payout_a = Self::mul_div_floor(pool.reserve_a, lp_amount, pool.lp_supply)?;
        let payout_b = Self::mul_div_floor(pool.reserve_b, lp_amount, pool.lp_supply)?;
        Ok((payout_a, payout_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: u64 = 1000;

    #[test]
    fn test_isqrt_exact_floor() {
        assert_eq!(LiquidityMath::isqrt(0), 0);
        assert_eq!(LiquidityMath::isqrt(1), 1);
        assert_eq!(LiquidityMath::isqrt(3), 1);
        assert_eq!(LiquidityMath::isqrt(4), 2);
        assert_eq!(LiquidityMath::isqrt(99), 9);
        assert_eq!(LiquidityMath::isqrt(100), 10);

        let max = (u64::MAX as u128) * (u64::MAX as u128);
        assert_eq!(LiquidityMath::isqrt(max), u64::MAX as u128);
        assert_eq!(LiquidityMath::isqrt(u128::MAX), u64::MAX as u128);
    }

    #[test]
    fn test_initial_deposit_uses_geometric_mean() {
        let quote = LiquidityMath::quote_deposit(
            &PoolReserves::EMPTY,
            1_000_000_000,
            2_000_000_000,
            DepositPolicy::AnchorOnA,
        )
        .unwrap();

        assert_eq!(quote.committed_a, 1_000_000_000);
        assert_eq!(quote.committed_b, 2_000_000_000);
        // floor(sqrt(2e18))
        assert_eq!(quote.lp_minted, 1_414_213_562);
    }

    #[test]
    fn test_initial_deposit_requires_both_sides() {
        for (a, b) in [(0, 10), (10, 0), (0, 0)] {
            assert_eq!(
                LiquidityMath::quote_deposit(&PoolReserves::EMPTY, a, b, DepositPolicy::AnchorOnA),
                Err(LiquidityError::ZeroAmount)
            );
        }
    }

    #[test]
    fn test_anchor_on_a_scales_b_up() {
        let pool = PoolReserves::new(1_500_000_000, 3_000_000_000, 2_121_320_343);
        let quote =
            LiquidityMath::quote_deposit(&pool, 100_000_000, 100_000_000, DepositPolicy::AnchorOnA)
                .unwrap();

        assert_eq!(quote.committed_a, 100_000_000);
        assert_eq!(quote.committed_b, 200_000_000);
        assert_eq!(quote.lp_minted, 141_421_356);
    }

    #[test]
    fn test_anchor_on_a_rejects_zero_anchor() {
        let pool = PoolReserves::new(1_000, 2_000, 1_414);
        assert_eq!(
            LiquidityMath::quote_deposit(&pool, 0, 500, DepositPolicy::AnchorOnA),
            Err(LiquidityError::ZeroAmount)
        );
    }

    #[test]
    fn test_dust_deposit_mints_nothing() {
        let pool = PoolReserves::new(1_000_000, 1_000_000, 10);
        assert_eq!(
            LiquidityMath::quote_deposit(&pool, 1, 1, DepositPolicy::AnchorOnA),
            Err(LiquidityError::InsufficientLiquidityMinted)
        );
    }

    #[test]
    fn test_capped_by_both_scales_excess_side_down() {
        let pool = PoolReserves::new(1_500, 3_000, 2_121);

        // B is the binding side: 100 B only covers 50 A
        let quote =
            LiquidityMath::quote_deposit(&pool, 100, 100, DepositPolicy::CappedByBoth).unwrap();
        assert_eq!(quote.committed_a, 50);
        assert_eq!(quote.committed_b, 100);
        assert_eq!(quote.lp_minted, 70);

        // A is the binding side
        let quote =
            LiquidityMath::quote_deposit(&pool, 100, 1_000, DepositPolicy::CappedByBoth).unwrap();
        assert_eq!(quote.committed_a, 100);
        assert_eq!(quote.committed_b, 200);
    }

    #[test]
    fn test_withdrawal_floor_and_full_exit() {
        let pool = PoolReserves::new(1_000_003, 2_000_007, 1_414_218);

        let half = LiquidityMath::quote_withdrawal(&pool, 707_109, MIN).unwrap();
        assert!(half.payout_a * 2 <= pool.reserve_a);
        assert!(half.payout_b * 2 <= pool.reserve_b);

        let all = LiquidityMath::quote_withdrawal(&pool, pool.lp_supply, MIN).unwrap();
        assert_eq!(all.payout_a, pool.reserve_a);
        assert_eq!(all.payout_b, pool.reserve_b);
        assert_eq!(pool.after_withdrawal(&all).unwrap(), PoolReserves::EMPTY);
    }

    #[test]
    fn test_withdrawal_validation_order() {
        let pool = PoolReserves::new(1_000_000, 2_000_000, 1_414_213);

        assert_eq!(
            LiquidityMath::quote_withdrawal(&pool, 999, MIN),
            Err(LiquidityError::WithdrawalTooSmall {
                lp_amount: 999,
                minimum: MIN
            })
        );
        assert_eq!(
            LiquidityMath::quote_withdrawal(&PoolReserves::EMPTY, 5_000, MIN),
            Err(LiquidityError::EmptyPool)
        );
        assert_eq!(
            LiquidityMath::quote_withdrawal(&pool, 1_414_214, MIN),
            Err(LiquidityError::ExceedsSupply {
                lp_amount: 1_414_214,
                lp_supply: 1_414_213
            })
        );
    }

    #[test]
    fn test_withdrawal_rejects_zero_payout_side() {
        // Deep imbalance: a minimum-sized redemption floors B to zero
        let pool = PoolReserves::new(10_000_000_000, 5, 7_071_067);
        assert!(matches!(
            LiquidityMath::quote_withdrawal(&pool, 1_000, MIN),
            Err(LiquidityError::WithdrawalTooSmall { .. })
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(
            LiquidityMath::mul_div_floor(u64::MAX, u64::MAX, 1),
            Err(LiquidityError::MathOverflow)
        );
        assert_eq!(
            LiquidityMath::mul_div_floor(1, 1, 0),
            Err(LiquidityError::MathOverflow)
        );

        let pool = PoolReserves::new(u64::MAX - 1, u64::MAX - 1, u64::MAX - 1);
        let quote = DepositQuote {
            committed_a: 2,
            committed_b: 2,
            lp_minted: 2,
        };
        assert_eq!(pool.after_deposit(&quote), Err(LiquidityError::MathOverflow));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("anchor_on_a".parse::<DepositPolicy>().unwrap(), DepositPolicy::AnchorOnA);
        assert_eq!(
            "capped_by_both".parse::<DepositPolicy>().unwrap(),
            DepositPolicy::CappedByBoth
        );
        assert!("both".parse::<DepositPolicy>().is_err());
        assert_eq!(DepositPolicy::default().to_string(), "anchor_on_a");
    }
}
