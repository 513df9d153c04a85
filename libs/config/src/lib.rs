//! # Pool Ledger Configuration
//!
//! Centralized constants and configuration loading for the pool ledger,
//! keeping defaults in one place instead of scattered through the engine.
//!
//! ## Features
//!
//! - **Protocol Constants**: Minimum withdrawal, default deposit policy
//! - **Layered Loading**: Built-in defaults, then a TOML file, then
//!   `POOL_LEDGER_*` environment variables
//! - **Path Expansion**: `${VAR}` and `~` in the snapshot path
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledger_config::{load_config, protocol};
//!
//! let config = load_config(None).unwrap();
//! assert!(config.engine.minimum_liquidity_withdrawal >= 1);
//!
//! let floor = protocol::MINIMUM_LIQUIDITY_WITHDRAWAL;
//! # let _ = floor;
//! ```

pub mod protocol;
pub mod service_config;

// Re-export commonly used types
pub use protocol::*;
pub use service_config::{
    load_config, EngineSettings, LedgerConfig, LogFormat, LoggingSettings, StorageSettings,
};
