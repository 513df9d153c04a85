//! # Pool Ledger - Two-Asset Liquidity Pool Accounting
//!
//! ## Purpose
//!
//! Authoritative ledger for two-asset liquidity pools. Depositors commit both
//! assets into a shared reserve and receive claim tokens proportional to what
//! they contributed; redeeming claim tokens pays out the same proportion of
//! each reserve. All accounting is exact integer arithmetic with floor
//! rounding in the pool's favour.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `initialize`, `add_liquidity`, `withdraw_liquidity` calls
//! - **Token Movement**: Delegated to a [`TokenCustody`] implementation as one
//!   all-or-nothing [`Settlement`] per operation
//! - **State Persistence**: bincode snapshots through the [`Stateful`] trait
//! - **Configuration**: [`LedgerOptions`] built from `ledger_config::EngineSettings`
//!
//! ## Architecture Role
//!
//! ```text
//! Caller → [PoolLedger] → quote (amm) → Settlement → [TokenCustody]
//!              ↓                                         ↓
//!        pool mutex held                         all movements or none
//!              ↓                                         ↓
//!        commit counters  ←──────────── success ─────────┘
//! ```
//!
//! ## Concurrency
//!
//! Pools live in a `DashMap` of `Arc<Mutex<Pool>>`. A mutating call holds the
//! pool's mutex from quote to commit; different pools never contend. Pool
//! creation goes through the map's entry API, so concurrent `initialize` calls
//! for one pair produce exactly one pool.

pub mod custody;
pub mod error;
pub mod ledger;
pub mod pool_state;
pub mod replay;
pub mod telemetry;
pub mod traits;

pub use custody::{CustodyError, InMemoryCustody, Movement, Owner, Settlement, TokenCustody};
pub use error::{ErrorKind, LedgerError, Result};
pub use ledger::{LedgerOptions, LedgerStats, PoolLedger, SnapshotSummary};
pub use pool_state::{DepositReceipt, Pool, PoolSnapshot, WithdrawalReceipt};
pub use replay::{ReplayReport, ReplayScript, ReplayStep, Replayer, StepOutcome};

// Re-export core traits for convenience
pub use traits::{SequenceTracker, SequencedStateful, StateError, Stateful};
