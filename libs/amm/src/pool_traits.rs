//! Pool trait for read-side liquidity calculations

use crate::liquidity_math::{
    DepositPolicy, DepositQuote, LiquidityMath, PoolReserves, Result, WithdrawalQuote,
};
use crate::Decimal;

/// Unified read interface over anything that carries pool counters
///
/// Implementors only supply the counters; quoting and pricing are derived
/// from them so every view of a pool uses the same arithmetic.
pub trait LiquidityPool {
    /// Current reserve and supply counters
    fn reserves(&self) -> PoolReserves;

    /// Fee in basis points
    fn fee_bps(&self) -> u16;

    /// Quote a deposit without committing it
    fn quote_deposit(
        &self,
        amount_a: u64,
        amount_b: u64,
        policy: DepositPolicy,
    ) -> Result<DepositQuote> {
        LiquidityMath::quote_deposit(&self.reserves(), amount_a, amount_b, policy)
    }

    /// Quote a redemption without committing it
    fn quote_withdrawal(&self, lp_amount: u64, minimum_withdrawal: u64) -> Result<WithdrawalQuote> {
        LiquidityMath::quote_withdrawal(&self.reserves(), lp_amount, minimum_withdrawal)
    }

    /// Units of B per unit of A
    ///
    /// Reporting only. Accounting never goes through `Decimal`.
    fn spot_price(&self) -> Option<Decimal> {
        let reserves = self.reserves();
        if reserves.reserve_a == 0 {
            return None;
        }
        Decimal::from(reserves.reserve_b).checked_div(Decimal::from(reserves.reserve_a))
    }

    /// Reserve share currently backing `lp_amount` claim tokens
    fn share_of(&self, lp_amount: u64) -> Result<(u64, u64)> {
        LiquidityMath::redemption_value(&self.reserves(), lp_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liquidity_math::LiquidityError;
    use rust_decimal_macros::dec;

    struct FixedPool {
        reserves: PoolReserves,
        fee_bps: u16,
    }

    impl LiquidityPool for FixedPool {
        fn reserves(&self) -> PoolReserves {
            self.reserves
        }

        fn fee_bps(&self) -> u16 {
            self.fee_bps
        }
    }

    #[test]
    fn test_spot_price() {
        let pool = FixedPool {
            reserves: PoolReserves::new(1_500, 3_000, 2_121),
            fee_bps: 30,
        };
        assert_eq!(pool.spot_price(), Some(dec!(2)));
        assert_eq!(pool.fee_bps(), 30);

        let empty = FixedPool {
            reserves: PoolReserves::EMPTY,
            fee_bps: 30,
        };
        assert_eq!(empty.spot_price(), None);
    }

    #[test]
    fn test_share_of() {
        let pool = FixedPool {
            reserves: PoolReserves::new(1_000, 2_000, 100),
            fee_bps: 0,
        };
        assert_eq!(pool.share_of(25).unwrap(), (250, 500));
        assert_eq!(pool.share_of(100).unwrap(), (1_000, 2_000));

        let empty = FixedPool {
            reserves: PoolReserves::EMPTY,
            fee_bps: 0,
        };
        assert_eq!(empty.share_of(1), Err(LiquidityError::EmptyPool));
    }

    #[test]
    fn test_default_quotes_delegate() {
        let pool = FixedPool {
            reserves: PoolReserves::new(1_000_000, 2_000_000, 1_414_213),
            fee_bps: 100,
        };
        let deposit = pool.quote_deposit(500_000, 1, DepositPolicy::AnchorOnA).unwrap();
        assert_eq!(deposit.committed_b, 1_000_000);

        let withdrawal = pool.quote_withdrawal(1_414_213, 1_000).unwrap();
        assert_eq!(withdrawal.payout_a, 1_000_000);
    }
}
