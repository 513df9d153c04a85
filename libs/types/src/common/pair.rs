//! Canonical asset pairs and deterministic pool addressing
//!
//! A pool exists for an unordered pair of assets, but every calculation needs
//! to know which side is "A". The rule is fixed: the asset with the smaller
//! raw identifier is A. Pool, vault and claim-token addresses are all derived
//! from the canonical pair, so the pool for a pair is discoverable without a
//! registry lookup and two orderings of the same pair can never produce two
//! pools.

use crate::common::identifiers::keccak;
use crate::{AssetId, PoolAddress, ValidationError, VaultAddress};
use serde::{Deserialize, Serialize};

/// Seed prefix for pool address derivation
pub const LIQUIDITY_POOL_SEED: &[u8] = b"pool";

/// Seed prefix for vault address derivation
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed prefix for claim-token mint derivation
pub const LP_MINT_SEED: &[u8] = b"lp_mint";

/// Two distinct assets in canonical order (`asset_a < asset_b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "(AssetId, AssetId)", into = "(AssetId, AssetId)")]
pub struct AssetPair {
    asset_a: AssetId,
    asset_b: AssetId,
}

impl AssetPair {
    /// Build a pair that is already in canonical order
    ///
    /// Rejects identical assets and reversed ordering; callers that hold
    /// assets in arbitrary order should use [`AssetPair::sorted`].
    pub fn new(asset_a: AssetId, asset_b: AssetId) -> Result<Self, ValidationError> {
        if asset_a == asset_b {
            return Err(ValidationError::IdenticalAssets);
        }
        if asset_a > asset_b {
            return Err(ValidationError::InvalidAssetOrdering);
        }
        Ok(Self { asset_a, asset_b })
    }

    /// Canonicalize two assets given in any order
    pub fn sorted(x: AssetId, y: AssetId) -> Result<Self, ValidationError> {
        if x <= y {
            Self::new(x, y)
        } else {
            Self::new(y, x)
        }
    }

    pub fn asset_a(&self) -> AssetId {
        self.asset_a
    }

    pub fn asset_b(&self) -> AssetId {
        self.asset_b
    }

    /// Deterministic address of the pool for this pair
    pub fn pool_address(&self) -> PoolAddress {
        derive_pool_address(self)
    }
}

impl TryFrom<(AssetId, AssetId)> for AssetPair {
    type Error = ValidationError;

    fn try_from((asset_a, asset_b): (AssetId, AssetId)) -> Result<Self, Self::Error> {
        Self::new(asset_a, asset_b)
    }
}

impl From<AssetPair> for (AssetId, AssetId) {
    fn from(pair: AssetPair) -> Self {
        (pair.asset_a, pair.asset_b)
    }
}

impl std::fmt::Display for AssetPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.asset_a.short(), self.asset_b.short())
    }
}

/// `keccak256("pool" || asset_a || asset_b)`
pub fn derive_pool_address(pair: &AssetPair) -> PoolAddress {
    PoolAddress::new(keccak(&[
        LIQUIDITY_POOL_SEED,
        pair.asset_a.as_bytes(),
        pair.asset_b.as_bytes(),
    ]))
}

/// `keccak256("vault" || pool || asset)`
pub fn derive_vault_address(pool: &PoolAddress, asset: &AssetId) -> VaultAddress {
    VaultAddress::new(keccak(&[VAULT_SEED, pool.as_bytes(), asset.as_bytes()]))
}

/// `keccak256("lp_mint" || pool)`
pub fn derive_lp_mint(pool: &PoolAddress) -> AssetId {
    AssetId::new(keccak(&[LP_MINT_SEED, pool.as_bytes()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> (AssetId, AssetId) {
        let x = AssetId::from_label("USDC");
        let y = AssetId::from_label("SOL");
        if x < y {
            (x, y)
        } else {
            (y, x)
        }
    }

    #[test]
    fn test_new_requires_canonical_order() {
        let (low, high) = assets();
        assert!(AssetPair::new(low, high).is_ok());
        assert_eq!(
            AssetPair::new(high, low),
            Err(ValidationError::InvalidAssetOrdering)
        );
        assert_eq!(
            AssetPair::new(low, low),
            Err(ValidationError::IdenticalAssets)
        );
    }

    #[test]
    fn test_sorted_is_order_independent() {
        let (low, high) = assets();
        let forward = AssetPair::sorted(low, high).unwrap();
        let backward = AssetPair::sorted(high, low).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.asset_a(), low);
        assert_eq!(forward.pool_address(), backward.pool_address());
    }

    #[test]
    fn test_derived_addresses_are_distinct() {
        let (low, high) = assets();
        let pair = AssetPair::new(low, high).unwrap();
        let pool = pair.pool_address();

        let vault_a = derive_vault_address(&pool, &low);
        let vault_b = derive_vault_address(&pool, &high);
        let lp_mint = derive_lp_mint(&pool);

        assert_ne!(vault_a, vault_b);
        assert_ne!(lp_mint, low);
        assert_ne!(lp_mint, high);
        assert_ne!(pool.inner(), lp_mint.inner());
        assert_eq!(derive_lp_mint(&pool), lp_mint);
    }

    #[test]
    fn test_serde_validates_ordering() {
        let (low, high) = assets();
        let pair = AssetPair::new(low, high).unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(serde_json::from_str::<AssetPair>(&json).unwrap(), pair);

        let reversed = serde_json::to_string(&(high, low)).unwrap();
        assert!(serde_json::from_str::<AssetPair>(&reversed).is_err());
    }

    proptest::proptest! {
        /// Either argument order yields the same pool, and distinct pairs never share one
        #[test]
        fn pool_address_ignores_argument_order(
            x in proptest::array::uniform32(proptest::prelude::any::<u8>()),
            y in proptest::array::uniform32(proptest::prelude::any::<u8>()),
            z in proptest::array::uniform32(proptest::prelude::any::<u8>()),
        ) {
            let (x, y, z) = (AssetId::new(x), AssetId::new(y), AssetId::new(z));
            proptest::prop_assume!(x != y && y != z && x != z);

            let forward = AssetPair::sorted(x, y).unwrap();
            let backward = AssetPair::sorted(y, x).unwrap();
            proptest::prop_assert_eq!(forward.pool_address(), backward.pool_address());
            proptest::prop_assert!(forward.asset_a() < forward.asset_b());

            let other = AssetPair::sorted(x, z).unwrap();
            proptest::prop_assert_ne!(forward.pool_address(), other.pool_address());
        }
    }
}
