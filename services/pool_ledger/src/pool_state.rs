//! Pool State
//!
//! The authoritative record of one pool and the copies handed to readers.

use amm::{LiquidityPool, PoolReserves};
use serde::{Deserialize, Serialize};
use types::{
    derive_lp_mint, derive_vault_address, AssetId, AssetPair, FeeBps, HolderId, PoolAddress,
    VaultAddress,
};

/// Complete state of a single pool
///
/// Identity fields are fixed at creation; only `reserves` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub address: PoolAddress,
    pub pair: AssetPair,
    pub vault_a: VaultAddress,
    pub vault_b: VaultAddress,
    pub lp_mint: AssetId,
    pub fee: FeeBps,
    pub reserves: PoolReserves,
}

impl Pool {
    /// Create an empty pool with all addresses derived from the pair
    pub fn new(pair: AssetPair, fee: FeeBps) -> Self {
        let address = pair.pool_address();
        Self {
            address,
            pair,
            vault_a: derive_vault_address(&address, &pair.asset_a()),
            vault_b: derive_vault_address(&address, &pair.asset_b()),
            lp_mint: derive_lp_mint(&address),
            fee,
            reserves: PoolReserves::EMPTY,
        }
    }

    /// Addresses match what the pair derives to
    pub fn has_derived_identity(&self) -> bool {
        let expected = Pool::new(self.pair, self.fee);
        self.address == expected.address
            && self.vault_a == expected.vault_a
            && self.vault_b == expected.vault_b
            && self.lp_mint == expected.lp_mint
    }

    /// Panics if the counters contradict each other
    ///
    /// Runs after every commit. A failure here is a ledger bug, not bad input.
    pub fn assert_invariants(&self) {
        assert!(
            self.reserves.is_consistent(),
            "pool {} counters inconsistent: reserve_a={} reserve_b={} lp_supply={}",
            self.address,
            self.reserves.reserve_a,
            self.reserves.reserve_b,
            self.reserves.lp_supply
        );
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            address: self.address,
            asset_a: self.pair.asset_a(),
            asset_b: self.pair.asset_b(),
            vault_a: self.vault_a,
            vault_b: self.vault_b,
            lp_mint: self.lp_mint,
            fee_bps: self.fee.bps(),
            reserve_a: self.reserves.reserve_a,
            reserve_b: self.reserves.reserve_b,
            lp_supply: self.reserves.lp_supply,
        }
    }
}

impl LiquidityPool for Pool {
    fn reserves(&self) -> PoolReserves {
        self.reserves
    }

    fn fee_bps(&self) -> u16 {
        self.fee.bps()
    }
}

/// Point-in-time copy of a pool for readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub address: PoolAddress,
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub vault_a: VaultAddress,
    pub vault_b: VaultAddress,
    pub lp_mint: AssetId,
    pub fee_bps: u16,
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub lp_supply: u64,
}

impl LiquidityPool for PoolSnapshot {
    fn reserves(&self) -> PoolReserves {
        PoolReserves::new(self.reserve_a, self.reserve_b, self.lp_supply)
    }

    fn fee_bps(&self) -> u16 {
        self.fee_bps
    }
}

/// Outcome of a committed deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub sequence: u64,
    pub pool: PoolAddress,
    pub payer: HolderId,
    pub committed_a: u64,
    pub committed_b: u64,
    pub lp_minted: u64,
}

/// Outcome of a committed redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub sequence: u64,
    pub pool: PoolAddress,
    pub holder: HolderId,
    pub payout_a: u64,
    pub payout_b: u64,
    pub lp_burned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::Decimal;

    fn sol_usdc() -> AssetPair {
        AssetPair::sorted(AssetId::from_label("SOL"), AssetId::from_label("USDC")).unwrap()
    }

    #[test]
    fn test_new_pool_is_empty_with_derived_addresses() {
        let pair = sol_usdc();
        let pool = Pool::new(pair, FeeBps::new(30).unwrap());

        assert_eq!(pool.address, pair.pool_address());
        assert_eq!(pool.vault_a, derive_vault_address(&pool.address, &pair.asset_a()));
        assert_ne!(pool.vault_a, pool.vault_b);
        assert_eq!(pool.reserves, PoolReserves::EMPTY);
        assert!(pool.has_derived_identity());
        pool.assert_invariants();
    }

    #[test]
    fn test_tampered_identity_detected() {
        let mut pool = Pool::new(sol_usdc(), FeeBps::ZERO);
        pool.lp_mint = AssetId::from_label("forged");
        assert!(!pool.has_derived_identity());
    }

    #[test]
    #[should_panic(expected = "counters inconsistent")]
    fn test_invariant_violation_panics() {
        let mut pool = Pool::new(sol_usdc(), FeeBps::ZERO);
        pool.reserves = PoolReserves::new(100, 0, 10);
        pool.assert_invariants();
    }

    #[test]
    fn test_snapshot_reports_price_and_share() {
        let mut pool = Pool::new(sol_usdc(), FeeBps::new(30).unwrap());
        pool.reserves = PoolReserves::new(1_000, 4_000, 2_000);

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.fee_bps, 30);
        assert_eq!(snapshot.reserves(), pool.reserves);
        assert_eq!(snapshot.spot_price(), Some(Decimal::from(4)));
        assert_eq!(snapshot.share_of(500).unwrap(), (250, 1_000));
    }
}
