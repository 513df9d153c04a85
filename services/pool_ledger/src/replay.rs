//! Scripted replay against an in-memory custody
//!
//! Scripts name assets and holders by label (`"SOL"`, `"alice"`) or by
//! `0x`-prefixed hex. A rejected step is recorded in the report and the
//! replay continues with the next step.

use crate::custody::{InMemoryCustody, Owner, TokenCustody};
use crate::ledger::{LedgerOptions, LedgerStats, PoolLedger};
use crate::pool_state::{DepositReceipt, PoolSnapshot, WithdrawalReceipt};
use crate::LedgerError;
use amm::{Decimal, LiquidityPool};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use types::{AssetId, AssetPair, HolderId, PoolAddress};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayScript {
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse replay script {:?}", path))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayStep {
    /// Credit external funds to a holder
    Fund {
        holder: String,
        asset: String,
        amount: u64,
    },
    /// Create a pool; asset order does not matter
    Initialize { assets: [String; 2], fee_bps: u64 },
    /// Deposit, keyed by asset; the engine decides which side is A
    AddLiquidity {
        payer: String,
        deposit: BTreeMap<String, u64>,
    },
    WithdrawLiquidity {
        holder: String,
        assets: [String; 2],
        lp_amount: u64,
    },
}

impl ReplayStep {
    fn name(&self) -> &'static str {
        match self {
            ReplayStep::Fund { .. } => "fund",
            ReplayStep::Initialize { .. } => "initialize",
            ReplayStep::AddLiquidity { .. } => "add_liquidity",
            ReplayStep::WithdrawLiquidity { .. } => "withdraw_liquidity",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Funded { balance: u64 },
    Initialized { pool: PoolAddress },
    Deposited(DepositReceipt),
    Withdrew(WithdrawalReceipt),
    Rejected { kind: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
    pub label: String,
    pub spot_price: Option<Decimal>,
    #[serde(flatten)]
    pub pool: PoolSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub pools: Vec<PoolReport>,
    /// Holder label -> asset label -> balance
    pub balances: BTreeMap<String, BTreeMap<String, u64>>,
    pub stats: LedgerStats,
}

impl ReplayReport {
    pub fn rejected(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Rejected { .. }))
            .count()
    }
}

/// Runs scripts against a fresh ledger
pub struct Replayer {
    custody: Arc<InMemoryCustody>,
    ledger: PoolLedger,
    assets: BTreeMap<String, AssetId>,
    holders: BTreeMap<String, HolderId>,
}

impl Replayer {
    pub fn new(options: LedgerOptions) -> Self {
        let custody = Arc::new(InMemoryCustody::new());
        let ledger = PoolLedger::with_options(custody.clone(), options);
        Self {
            custody,
            ledger,
            assets: BTreeMap::new(),
            holders: BTreeMap::new(),
        }
    }

    pub fn ledger(&self) -> &PoolLedger {
        &self.ledger
    }

    pub fn run(&mut self, script: &ReplayScript) -> ReplayReport {
        let mut steps = Vec::with_capacity(script.steps.len());

        for (index, step) in script.steps.iter().enumerate() {
            let outcome = match self.apply(step) {
                Ok(outcome) => outcome,
                Err(err) => {
                    let kind = err
                        .downcast_ref::<LedgerError>()
                        .map(|e| format!("{:?}", e.kind()))
                        .unwrap_or_else(|| "InvalidStep".to_string());
                    warn!("Step {} ({}) rejected: {:#}", index, step.name(), err);
                    StepOutcome::Rejected {
                        kind,
                        error: format!("{:#}", err),
                    }
                }
            };
            steps.push(StepReport {
                index,
                op: step.name(),
                outcome,
            });
        }

        let report = ReplayReport {
            steps,
            pools: self.pool_reports(),
            balances: self.balances(),
            stats: self.ledger.stats(),
        };
        info!(
            "Replayed {} steps ({} rejected) across {} pools",
            report.steps.len(),
            report.rejected(),
            report.pools.len()
        );
        report
    }

    fn apply(&mut self, step: &ReplayStep) -> Result<StepOutcome> {
        match step {
            ReplayStep::Fund {
                holder,
                asset,
                amount,
            } => {
                let holder = self.holder(holder)?;
                let asset = self.asset(asset)?;
                self.custody
                    .credit(holder, asset, *amount)
                    .map_err(LedgerError::from)?;
                Ok(StepOutcome::Funded {
                    balance: self.custody.holder_balance(holder, asset),
                })
            }
            ReplayStep::Initialize { assets, fee_bps } => {
                let pair = self.pair(assets)?;
                let pool = self.ledger.initialize_pair(pair, *fee_bps)?;
                Ok(StepOutcome::Initialized { pool })
            }
            ReplayStep::AddLiquidity { payer, deposit } => {
                let amounts = deposit
                    .iter()
                    .map(|(label, amount)| Ok((self.asset(label)?, *amount)))
                    .collect::<Result<BTreeMap<AssetId, u64>>>()?;
                let assets: Vec<AssetId> = amounts.keys().copied().collect();
                let [x, y] = assets[..] else {
                    bail!("deposit must name exactly two assets");
                };
                let pair = AssetPair::sorted(x, y).map_err(LedgerError::from)?;
                let amount_a = amounts[&pair.asset_a()];
                let amount_b = amounts[&pair.asset_b()];
                let payer = self.holder(payer)?;
                let receipt =
                    self.ledger
                        .add_liquidity(&pair.pool_address(), amount_a, amount_b, payer)?;
                Ok(StepOutcome::Deposited(receipt))
            }
            ReplayStep::WithdrawLiquidity {
                holder,
                assets,
                lp_amount,
            } => {
                let pair = self.pair(assets)?;
                let holder = self.holder(holder)?;
                let receipt =
                    self.ledger
                        .withdraw_liquidity(&pair.pool_address(), *lp_amount, holder)?;
                Ok(StepOutcome::Withdrew(receipt))
            }
        }
    }

    fn asset(&mut self, label: &str) -> Result<AssetId> {
        let asset = match label.strip_prefix("0x") {
            Some(_) => AssetId::from_hex(label).map_err(LedgerError::from)?,
            None => AssetId::from_label(label),
        };
        self.assets.entry(label.to_string()).or_insert(asset);
        Ok(asset)
    }

    fn holder(&mut self, label: &str) -> Result<HolderId> {
        let holder = match label.strip_prefix("0x") {
            Some(_) => HolderId::from_hex(label).map_err(LedgerError::from)?,
            None => HolderId::from_label(label),
        };
        self.holders.entry(label.to_string()).or_insert(holder);
        Ok(holder)
    }

    fn pair(&mut self, assets: &[String; 2]) -> Result<AssetPair> {
        let x = self.asset(&assets[0])?;
        let y = self.asset(&assets[1])?;
        let pair = AssetPair::sorted(x, y).map_err(LedgerError::from)?;
        Ok(pair)
    }

    fn label_of(&self, asset: &AssetId) -> String {
        self.assets
            .iter()
            .find(|(_, id)| *id == asset)
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| asset.short())
    }

    fn pool_label(&self, pool: &PoolSnapshot) -> String {
        format!("{}/{}", self.label_of(&pool.asset_a), self.label_of(&pool.asset_b))
    }

    fn pool_reports(&self) -> Vec<PoolReport> {
        self.ledger
            .pools()
            .into_iter()
            .map(|pool| PoolReport {
                label: self.pool_label(&pool),
                spot_price: pool.spot_price(),
                pool,
            })
            .collect()
    }

    fn balances(&self) -> BTreeMap<String, BTreeMap<String, u64>> {
        let pools = self.ledger.pools();
        let mut tracked: Vec<(String, AssetId)> = self
            .assets
            .iter()
            .map(|(label, asset)| (label.clone(), *asset))
            .collect();
        tracked.extend(
            pools
                .iter()
                .map(|pool| (format!("LP({})", self.pool_label(pool)), pool.lp_mint)),
        );

        self.holders
            .iter()
            .map(|(label, holder)| {
                let owner = Owner::Holder(*holder);
                let held = tracked
                    .iter()
                    .map(|(asset_label, asset)| {
                        (asset_label.clone(), self.custody.balance(&owner, asset))
                    })
                    .filter(|(_, balance)| *balance > 0)
                    .collect();
                (label.clone(), held)
            })
            .collect()
    }
}
