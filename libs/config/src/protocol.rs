//! Ledger constants
//!
//! Values observed in the deployed program. The engine reads the tunable ones
//! through [`crate::EngineSettings`]; these are the defaults.

/// Smallest redemption, in claim-token base units
///
/// Below this a floor-divided payout can round to zero on one side while
/// still costing a full settlement.
pub const MINIMUM_LIQUIDITY_WITHDRAWAL: u64 = 1000;

/// Deposit policy used when none is configured
pub const DEFAULT_DEPOSIT_POLICY: &str = "anchor_on_a";

/// Prefix for environment overrides (`POOL_LEDGER_ENGINE__...`)
pub const ENV_PREFIX: &str = "POOL_LEDGER";

/// Separator between nested keys in environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/pool_ledger.toml";
