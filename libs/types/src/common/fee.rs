//! Pool fee in basis points

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// 10,000 bps = 100%
pub const MAX_FEE_BPS: u16 = 10_000;

/// Validated fee, `0..=10_000` basis points
///
/// Fixed when a pool is created. The ledger stores it but no liquidity
/// operation consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct FeeBps(u16);

impl FeeBps {
    pub const ZERO: FeeBps = FeeBps(0);

    pub fn new(bps: u64) -> Result<Self, ValidationError> {
        if bps > MAX_FEE_BPS as u64 {
            return Err(ValidationError::InvalidFeeValue {
                value: bps,
                max: MAX_FEE_BPS,
            });
        }
        Ok(Self(bps as u16))
    }

    #[inline]
    pub const fn bps(self) -> u16 {
        self.0
    }
}

impl TryFrom<u64> for FeeBps {
    type Error = ValidationError;

    fn try_from(bps: u64) -> Result<Self, Self::Error> {
        Self::new(bps)
    }
}

impl From<FeeBps> for u64 {
    fn from(fee: FeeBps) -> Self {
        fee.0 as u64
    }
}

impl std::fmt::Display for FeeBps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}bps", self.0)
    }
}
