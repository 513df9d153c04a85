//! Pool Ledger
//!
//! Owns every pool record and runs the three mutating operations. Each
//! mutation holds the pool's mutex across quote, settlement and commit, so
//! two deposits into one pool can never price against the same counters.
//! Implements the Stateful trait for snapshot and restore.
//!
//! Lock order is commit gate, then pool, then sequence tracker, then stats.
//! Mutations share the gate; a snapshot takes it exclusively so it sees no
//! half-recorded commit.

use crate::custody::{Owner, Settlement, TokenCustody};
use crate::error::{LedgerError, Result};
use crate::pool_state::{DepositReceipt, Pool, PoolSnapshot, WithdrawalReceipt};
use crate::traits::{SequenceTracker, SequencedStateful, StateError, Stateful};
use amm::{DepositPolicy, DepositQuote, LiquidityPool, WithdrawalQuote};
use anyhow::Context;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ledger_config::{protocol::MINIMUM_LIQUIDITY_WITHDRAWAL, EngineSettings};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::{AssetId, AssetPair, FeeBps, HolderId, PoolAddress};

/// Engine parameters fixed for the lifetime of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    pub minimum_withdrawal: u64,
    pub deposit_policy: DepositPolicy,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            minimum_withdrawal: MINIMUM_LIQUIDITY_WITHDRAWAL,
            deposit_policy: DepositPolicy::AnchorOnA,
        }
    }
}

impl LedgerOptions {
    pub fn from_settings(settings: &EngineSettings) -> anyhow::Result<Self> {
        let deposit_policy = settings
            .deposit_policy
            .parse::<DepositPolicy>()
            .map_err(anyhow::Error::msg)
            .context("Invalid engine.deposit_policy")?;
        Ok(Self {
            minimum_withdrawal: settings.minimum_liquidity_withdrawal,
            deposit_policy,
        })
    }
}

/// Operation counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub pools_created: u64,
    pub deposits: u64,
    pub withdrawals: u64,
    pub lp_minted_total: u128,
    pub lp_burned_total: u128,
}

/// The pool ledger engine
pub struct PoolLedger {
    pools: DashMap<PoolAddress, Arc<Mutex<Pool>>>,
    custody: Arc<dyn TokenCustody>,
    options: LedgerOptions,
    stats: RwLock<LedgerStats>,
    sequence_tracker: Mutex<SequenceTracker>,
    commit_gate: RwLock<()>,
}

impl PoolLedger {
    pub fn new(custody: Arc<dyn TokenCustody>) -> Self {
        Self::with_options(custody, LedgerOptions::default())
    }

    pub fn with_options(custody: Arc<dyn TokenCustody>, options: LedgerOptions) -> Self {
        Self {
            pools: DashMap::new(),
            custody,
            options,
            stats: RwLock::new(LedgerStats::default()),
            sequence_tracker: Mutex::new(SequenceTracker::new()),
            commit_gate: RwLock::new(()),
        }
    }

    pub fn options(&self) -> LedgerOptions {
        self.options
    }

    pub fn custody(&self) -> &Arc<dyn TokenCustody> {
        &self.custody
    }

    /// Create the pool for `asset_a`/`asset_b`
    ///
    /// The pair must already be in canonical order. Fee is checked before the
    /// pair so an out-of-range fee is always reported as such.
    pub fn initialize(
        &self,
        asset_a: AssetId,
        asset_b: AssetId,
        fee_bps: u64,
    ) -> Result<PoolAddress> {
        let fee = FeeBps::new(fee_bps).inspect_err(|e| warn!("Rejected initialize: {}", e))?;
        let pair = AssetPair::new(asset_a, asset_b)
            .inspect_err(|e| warn!("Rejected initialize: {}", e))?;
        self.create_pool(pair, fee)
    }

    /// Create the pool for an already canonical pair
    pub fn initialize_pair(&self, pair: AssetPair, fee_bps: u64) -> Result<PoolAddress> {
        let fee = FeeBps::new(fee_bps).inspect_err(|e| warn!("Rejected initialize: {}", e))?;
        self.create_pool(pair, fee)
    }

    fn create_pool(&self, pair: AssetPair, fee: FeeBps) -> Result<PoolAddress> {
        let pool = Pool::new(pair, fee);
        let address = pool.address;
        let _commit = self.commit_gate.read();

        match self.pools.entry(address) {
            Entry::Occupied(_) => {
                warn!("Rejected initialize: pool {} already exists", address.short());
                Err(LedgerError::DuplicatePool(address))
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(pool)));
                self.stats.write().pools_created += 1;
                info!(
                    "Created pool {} for {} (fee {})",
                    address.short(),
                    pair,
                    fee
                );
                Ok(address)
            }
        }
    }

    /// Deposit into a pool and mint claim tokens to `payer`
    pub fn add_liquidity(
        &self,
        pool: &PoolAddress,
        amount_a: u64,
        amount_b: u64,
        payer: HolderId,
    ) -> Result<DepositReceipt> {
        let _commit = self.commit_gate.read();
        let handle = self.handle(pool)?;
        let mut state = handle.lock();

        let quote = state
            .quote_deposit(amount_a, amount_b, self.options.deposit_policy)
            .inspect_err(|e| warn!("Rejected deposit into {}: {}", pool.short(), e))?;
        let next = state.reserves.after_deposit(&quote)?;

        let settlement = Settlement::new()
            .transfer_in(payer, state.vault_a, state.pair.asset_a(), quote.committed_a)
            .transfer_in(payer, state.vault_b, state.pair.asset_b(), quote.committed_b)
            .mint(state.lp_mint, payer, quote.lp_minted);
        self.custody
            .settle(&settlement)
            .inspect_err(|e| warn!("Rejected deposit into {}: {}", pool.short(), e))?;

        state.reserves = next;
        state.assert_invariants();
        let sequence = self.sequence_tracker.lock().advance();
        {
            let mut stats = self.stats.write();
            stats.deposits += 1;
            stats.lp_minted_total += quote.lp_minted as u128;
        }
        drop(state);

        info!(
            sequence,
            committed_a = quote.committed_a,
            committed_b = quote.committed_b,
            lp_minted = quote.lp_minted,
            "Deposit into {} by {}",
            pool.short(),
            payer.short()
        );

        Ok(DepositReceipt {
            sequence,
            pool: *pool,
            payer,
            committed_a: quote.committed_a,
            committed_b: quote.committed_b,
            lp_minted: quote.lp_minted,
        })
    }

    /// Burn `lp_amount` claim tokens from `holder` and pay out their share
    pub fn withdraw_liquidity(
        &self,
        pool: &PoolAddress,
        lp_amount: u64,
        holder: HolderId,
    ) -> Result<WithdrawalReceipt> {
        let _commit = self.commit_gate.read();
        let handle = self.handle(pool)?;
        let mut state = handle.lock();

        let quote = state
            .quote_withdrawal(lp_amount, self.options.minimum_withdrawal)
            .inspect_err(|e| warn!("Rejected withdrawal from {}: {}", pool.short(), e))?;
        let next = state.reserves.after_withdrawal(&quote)?;

        let settlement = Settlement::new()
            .burn(state.lp_mint, holder, quote.lp_burned)
            .transfer_out(state.vault_a, holder, state.pair.asset_a(), quote.payout_a)
            .transfer_out(state.vault_b, holder, state.pair.asset_b(), quote.payout_b);
        self.custody
            .settle(&settlement)
            .inspect_err(|e| warn!("Rejected withdrawal from {}: {}", pool.short(), e))?;

        let full_exit = lp_amount == state.reserves.lp_supply;
        state.reserves = next;
        state.assert_invariants();
        if full_exit {
            assert!(
                state.reserves.reserve_a == 0 && state.reserves.reserve_b == 0,
                "full withdrawal left residue in pool {}",
                pool
            );
        }
        let sequence = self.sequence_tracker.lock().advance();
        {
            let mut stats = self.stats.write();
            stats.withdrawals += 1;
            stats.lp_burned_total += quote.lp_burned as u128;
        }
        drop(state);

        info!(
            sequence,
            payout_a = quote.payout_a,
            payout_b = quote.payout_b,
            lp_burned = quote.lp_burned,
            "Withdrawal from {} by {}",
            pool.short(),
            holder.short()
        );

        Ok(WithdrawalReceipt {
            sequence,
            pool: *pool,
            holder,
            payout_a: quote.payout_a,
            payout_b: quote.payout_b,
            lp_burned: quote.lp_burned,
        })
    }

    /// What [`PoolLedger::add_liquidity`] would commit right now
    ///
    /// Does not check the payer's balances.
    pub fn quote_add_liquidity(
        &self,
        pool: &PoolAddress,
        amount_a: u64,
        amount_b: u64,
    ) -> Result<DepositQuote> {
        let handle = self.handle(pool)?;
        let state = handle.lock();
        let quote = state.quote_deposit(amount_a, amount_b, self.options.deposit_policy)?;
        state.reserves.after_deposit(&quote)?;
        debug!("Quoted deposit into {}: {:?}", pool.short(), quote);
        Ok(quote)
    }

    /// What [`PoolLedger::withdraw_liquidity`] would pay out right now
    ///
    /// Does not check the holder's claim balance.
    pub fn quote_withdraw_liquidity(
        &self,
        pool: &PoolAddress,
        lp_amount: u64,
    ) -> Result<WithdrawalQuote> {
        let handle = self.handle(pool)?;
        let state = handle.lock();
        let quote = state.quote_withdrawal(lp_amount, self.options.minimum_withdrawal)?;
        debug!("Quoted withdrawal from {}: {:?}", pool.short(), quote);
        Ok(quote)
    }

    pub fn pool(&self, address: &PoolAddress) -> Option<PoolSnapshot> {
        self.pools.get(address).map(|entry| entry.value().lock().snapshot())
    }

    pub fn pool_for_pair(&self, pair: &AssetPair) -> Option<PoolSnapshot> {
        self.pool(&pair.pool_address())
    }

    /// All pools ordered by address
    pub fn pools(&self) -> Vec<PoolSnapshot> {
        let mut pools: Vec<PoolSnapshot> = self
            .pools
            .iter()
            .map(|entry| entry.value().lock().snapshot())
            .collect();
        pools.sort_by_key(|pool| pool.address);
        pools
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn stats(&self) -> LedgerStats {
        self.stats.read().clone()
    }

    /// Clone the pool handle so the map shard is released before locking
    fn handle(&self, pool: &PoolAddress) -> Result<Arc<Mutex<Pool>>> {
        self.pools
            .get(pool)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                warn!("Pool {} not found", pool.short());
                LedgerError::PoolNotFound(*pool)
            })
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    pools: Vec<Pool>,
    stats: LedgerStats,
    last_sequence: u64,
}

impl SnapshotData {
    fn validate(&self) -> std::result::Result<(), StateError> {
        let mut seen = HashSet::with_capacity(self.pools.len());
        for pool in &self.pools {
            let reject = |reason: &str| StateError::ValidationFailed {
                reason: format!("pool {}: {}", pool.address, reason),
            };
            if !seen.insert(pool.address) {
                return Err(reject("duplicate entry"));
            }
            if !pool.has_derived_identity() {
                return Err(reject("addresses do not match the asset pair"));
            }
            if !pool.reserves.is_consistent() {
                return Err(reject("reserves and supply disagree on emptiness"));
            }
        }

        if self.stats.pools_created != self.pools.len() as u64 {
            return Err(StateError::ValidationFailed {
                reason: format!(
                    "{} pools recorded as created, {} present",
                    self.stats.pools_created,
                    self.pools.len()
                ),
            });
        }
        let outstanding: u128 = self
            .pools
            .iter()
            .map(|pool| pool.reserves.lp_supply as u128)
            .sum();
        let recorded = self
            .stats
            .lp_minted_total
            .checked_sub(self.stats.lp_burned_total);
        if recorded != Some(outstanding) {
            return Err(StateError::ValidationFailed {
                reason: format!(
                    "claim supply {} does not match {} minted less {} burned",
                    outstanding, self.stats.lp_minted_total, self.stats.lp_burned_total
                ),
            });
        }
        Ok(())
    }

    /// Vault balances and claim-token supply must match the pool counters
    fn verify_custody(&self, custody: &dyn TokenCustody) -> std::result::Result<(), StateError> {
        for pool in &self.pools {
            let checks = [
                (
                    "vault A",
                    custody.balance(&Owner::Vault(pool.vault_a), &pool.pair.asset_a()),
                    pool.reserves.reserve_a,
                ),
                (
                    "vault B",
                    custody.balance(&Owner::Vault(pool.vault_b), &pool.pair.asset_b()),
                    pool.reserves.reserve_b,
                ),
                (
                    "claim supply",
                    custody.supply(&pool.lp_mint),
                    pool.reserves.lp_supply,
                ),
            ];
            for (what, held, recorded) in checks {
                if held != recorded {
                    return Err(StateError::ValidationFailed {
                        reason: format!(
                            "pool {}: custody {} is {}, snapshot records {}",
                            pool.address, what, held, recorded
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Decoded contents of a snapshot, for offline inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub pools: Vec<PoolSnapshot>,
    pub stats: LedgerStats,
    pub last_sequence: u64,
}

impl SnapshotSummary {
    /// Decode and check a snapshot without binding it to a custody
    pub fn decode(snapshot: &[u8]) -> Result<Self> {
        let snapshot_data: SnapshotData =
            bincode::deserialize(snapshot).map_err(StateError::from)?;
        snapshot_data.validate()?;

        let mut pools: Vec<PoolSnapshot> =
            snapshot_data.pools.iter().map(Pool::snapshot).collect();
        pools.sort_by_key(|pool| pool.address);
        Ok(Self {
            pools,
            stats: snapshot_data.stats,
            last_sequence: snapshot_data.last_sequence,
        })
    }
}

impl Stateful for PoolLedger {
    type Error = LedgerError;

    fn snapshot(&self) -> Result<Vec<u8>> {
        let _quiesced = self.commit_gate.write();
        let snapshot_data = SnapshotData {
            pools: self
                .pools
                .iter()
                .map(|entry| entry.value().lock().clone())
                .collect(),
            stats: self.stats.read().clone(),
            last_sequence: self.sequence_tracker.lock().last_sequence(),
        };

        bincode::serialize(&snapshot_data)
            .map_err(|e| LedgerError::State(StateError::from(e)))
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<()> {
        let snapshot_data: SnapshotData =
            bincode::deserialize(snapshot).map_err(StateError::from)?;
        snapshot_data
            .validate()
            .and_then(|()| snapshot_data.verify_custody(self.custody.as_ref()))
            .inspect_err(|e| warn!("Rejected snapshot: {}", e))?;

        self.pools.clear();
        for pool in snapshot_data.pools {
            self.pools.insert(pool.address, Arc::new(Mutex::new(pool)));
        }
        *self.stats.write() = snapshot_data.stats;
        self.sequence_tracker
            .lock()
            .set_last_sequence(snapshot_data.last_sequence);

        info!(
            "Restored {} pools at sequence {}",
            self.pools.len(),
            snapshot_data.last_sequence
        );
        Ok(())
    }
}

impl SequencedStateful for PoolLedger {
    fn last_sequence(&self) -> u64 {
        self.sequence_tracker.lock().last_sequence()
    }
}
