//! Ledger error taxonomy
//!
//! Errors from the layers below (parameter validation, liquidity math,
//! custody) are wrapped unchanged so callers can still match on the source,
//! while [`LedgerError::kind`] gives the flat classification used by callers
//! that only care which rule was broken.

use crate::custody::CustodyError;
use crate::traits::StateError;
use amm::LiquidityError;
use thiserror::Error;
use types::{PoolAddress, ValidationError};

/// Any failure of a ledger operation
///
/// A returned error always means nothing was changed: no pool record, no
/// balance and no claim-token supply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("pool {0} already exists")]
    DuplicatePool(PoolAddress),

    #[error("pool {0} not found")]
    PoolNotFound(PoolAddress),

    #[error(transparent)]
    Liquidity(#[from] LiquidityError),

    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Flat classification of [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFeeValue,
    InvalidPair,
    DuplicatePool,
    PoolNotFound,
    ZeroAmount,
    InsufficientLiquidityMinted,
    WithdrawalTooSmall,
    EmptyPool,
    InsufficientFunds,
    InsufficientClaimBalance,
    MathOverflow,
    /// Custody holds less than the pool counters record
    IntegrityViolation,
    Snapshot,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(ValidationError::InvalidFeeValue { .. }) => {
                ErrorKind::InvalidFeeValue
            }
            LedgerError::Validation(_) => ErrorKind::InvalidPair,
            LedgerError::DuplicatePool(_) => ErrorKind::DuplicatePool,
            LedgerError::PoolNotFound(_) => ErrorKind::PoolNotFound,
            LedgerError::Liquidity(err) => match err {
                LiquidityError::ZeroAmount => ErrorKind::ZeroAmount,
                LiquidityError::InsufficientLiquidityMinted => {
                    ErrorKind::InsufficientLiquidityMinted
                }
                LiquidityError::WithdrawalTooSmall { .. } => ErrorKind::WithdrawalTooSmall,
                LiquidityError::EmptyPool => ErrorKind::EmptyPool,
                // Redeeming more than exists is the same claim shortfall the
                // holder would hit at custody
                LiquidityError::ExceedsSupply { .. } => ErrorKind::InsufficientClaimBalance,
                LiquidityError::MathOverflow => ErrorKind::MathOverflow,
            },
            LedgerError::Custody(err) => match err {
                CustodyError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
                CustodyError::VaultShortfall { .. } => ErrorKind::IntegrityViolation,
                CustodyError::InsufficientClaimBalance { .. } => {
                    ErrorKind::InsufficientClaimBalance
                }
                CustodyError::Overflow { .. } => ErrorKind::MathOverflow,
            },
            LedgerError::State(_) => ErrorKind::Snapshot,
        }
    }

    /// Caller supplied a bad argument; retrying the same call cannot succeed
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidFeeValue
                | ErrorKind::InvalidPair
                | ErrorKind::DuplicatePool
                | ErrorKind::PoolNotFound
                | ErrorKind::ZeroAmount
                | ErrorKind::InsufficientLiquidityMinted
                | ErrorKind::WithdrawalTooSmall
                | ErrorKind::EmptyPool
                | ErrorKind::MathOverflow
        )
    }

    /// Caller lacks the balance the operation needs
    pub fn is_resource(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InsufficientFunds | ErrorKind::InsufficientClaimBalance
        )
    }

    /// Ledger and custody disagree; not the caller's fault
    pub fn is_integrity(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::IntegrityViolation | ErrorKind::Snapshot
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use types::{AssetId, HolderId};

    #[test]
    fn test_exceeds_supply_classified_as_claim_shortfall() {
        let err = LedgerError::from(LiquidityError::ExceedsSupply {
            lp_amount: 5_000,
            lp_supply: 4_000,
        });
        assert_eq!(err.kind(), ErrorKind::InsufficientClaimBalance);
        assert!(err.is_resource());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_fee_and_pair_validation_kinds() {
        let fee = LedgerError::from(ValidationError::InvalidFeeValue {
            value: 10_001,
            max: 10_000,
        });
        assert_eq!(fee.kind(), ErrorKind::InvalidFeeValue);
        assert!(fee.is_validation());

        let pair = LedgerError::from(ValidationError::IdenticalAssets);
        assert_eq!(pair.kind(), ErrorKind::InvalidPair);
    }

    #[test]
    fn test_custody_kinds() {
        let funds = LedgerError::from(CustodyError::InsufficientFunds {
            holder: HolderId::from_label("alice"),
            asset: AssetId::from_label("SOL"),
            available: 10,
            required: 20,
        });
        assert_eq!(funds.kind(), ErrorKind::InsufficientFunds);
        assert!(funds.is_resource());
        assert!(funds.to_string().contains("insufficient funds"));
    }

    #[test]
    fn test_vault_shortfall_is_integrity_not_resource() {
        let shortfall = LedgerError::from(CustodyError::VaultShortfall {
            vault: types::VaultAddress::from_label("vault"),
            asset: AssetId::from_label("SOL"),
            available: 0,
            required: 1_000,
        });
        assert_eq!(shortfall.kind(), ErrorKind::IntegrityViolation);
        assert!(shortfall.is_integrity());
        assert!(!shortfall.is_resource());
        assert!(!shortfall.is_validation());
    }
}
