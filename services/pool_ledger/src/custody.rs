//! Token custody seam
//!
//! The ledger never touches balances directly. Every operation describes the
//! token movements it needs as a [`Settlement`] and hands it to a
//! [`TokenCustody`] implementation, which must apply all movements or none.
//! Pool counters are only committed after custody accepts the settlement.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use types::{AssetId, HolderId, VaultAddress};

/// Anything that can hold a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Owner {
    Holder(HolderId),
    Vault(VaultAddress),
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Holder(holder) => write!(f, "holder {}", holder.short()),
            Owner::Vault(vault) => write!(f, "vault {}", vault.short()),
        }
    }
}

/// One token movement inside a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Movement {
    /// Holder pays into a pool vault
    TransferIn {
        from: HolderId,
        vault: VaultAddress,
        asset: AssetId,
        amount: u64,
    },
    /// Pool vault pays out to a holder
    TransferOut {
        vault: VaultAddress,
        to: HolderId,
        asset: AssetId,
        amount: u64,
    },
    /// New claim tokens credited to a holder
    Mint {
        lp_mint: AssetId,
        to: HolderId,
        amount: u64,
    },
    /// Claim tokens removed from a holder
    Burn {
        lp_mint: AssetId,
        from: HolderId,
        amount: u64,
    },
}

/// Ordered movements applied as a unit
///
/// Zero-amount movements are dropped when the settlement is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    movements: Vec<Movement>,
}

impl Settlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfer_in(self, from: HolderId, vault: VaultAddress, asset: AssetId, amount: u64) -> Self {
        self.push(amount, Movement::TransferIn { from, vault, asset, amount })
    }

    pub fn transfer_out(self, vault: VaultAddress, to: HolderId, asset: AssetId, amount: u64) -> Self {
        self.push(amount, Movement::TransferOut { vault, to, asset, amount })
    }

    pub fn mint(self, lp_mint: AssetId, to: HolderId, amount: u64) -> Self {
        self.push(amount, Movement::Mint { lp_mint, to, amount })
    }

    pub fn burn(self, lp_mint: AssetId, from: HolderId, amount: u64) -> Self {
        self.push(amount, Movement::Burn { lp_mint, from, amount })
    }

    fn push(mut self, amount: u64, movement: Movement) -> Self {
        if amount > 0 {
            self.movements.push(movement);
        }
        self
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}

/// Custody failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("insufficient funds: holder {} has {available} of asset {}, needs {required}", .holder.short(), .asset.short())]
    InsufficientFunds {
        holder: HolderId,
        asset: AssetId,
        available: u64,
        required: u64,
    },

    #[error("insufficient claim balance: holder {} has {available} claim tokens, needs {required}", .holder.short())]
    InsufficientClaimBalance {
        holder: HolderId,
        lp_mint: AssetId,
        available: u64,
        required: u64,
    },

    #[error("vault {} holds {available} of asset {}, cannot pay {required}", .vault.short(), .asset.short())]
    VaultShortfall {
        vault: VaultAddress,
        asset: AssetId,
        available: u64,
        required: u64,
    },

    #[error("balance overflow for asset {}", .asset.short())]
    Overflow { asset: AssetId },
}

/// Balance keeper for holders, pool vaults and claim-token supplies
pub trait TokenCustody: Send + Sync {
    /// Balance of `asset` held by `owner`
    fn balance(&self, owner: &Owner, asset: &AssetId) -> u64;

    /// Outstanding supply of a mintable asset; zero for anything never minted
    fn supply(&self, asset: &AssetId) -> u64;

    /// Apply every movement in order, or none of them
    fn settle(&self, settlement: &Settlement) -> Result<(), CustodyError>;
}

#[derive(Debug, Default)]
struct Books {
    balances: HashMap<(Owner, AssetId), u64>,
    supplies: HashMap<AssetId, u64>,
}

/// Uncommitted balance changes for one settlement
struct Staged<'a> {
    books: &'a Books,
    balances: HashMap<(Owner, AssetId), u64>,
    supplies: HashMap<AssetId, u64>,
}

impl<'a> Staged<'a> {
    fn new(books: &'a Books) -> Self {
        Self {
            books,
            balances: HashMap::new(),
            supplies: HashMap::new(),
        }
    }

    fn balance(&self, key: &(Owner, AssetId)) -> u64 {
        self.balances
            .get(key)
            .or_else(|| self.books.balances.get(key))
            .copied()
            .unwrap_or(0)
    }

    fn supply(&self, asset: &AssetId) -> u64 {
        self.supplies
            .get(asset)
            .or_else(|| self.books.supplies.get(asset))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, owner: Owner, asset: AssetId, amount: u64) -> Result<(), CustodyError> {
        let key = (owner, asset);
        let next = self
            .balance(&key)
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { asset })?;
        self.balances.insert(key, next);
        Ok(())
    }

    /// Debit, or report how much is actually there
    fn debit(&mut self, owner: Owner, asset: AssetId, amount: u64) -> Result<(), u64> {
        let key = (owner, asset);
        let available = self.balance(&key);
        let next = available.checked_sub(amount).ok_or(available)?;
        self.balances.insert(key, next);
        Ok(())
    }

    fn apply(&mut self, movement: &Movement) -> Result<(), CustodyError> {
        match *movement {
            Movement::TransferIn { from, vault, asset, amount } => {
                self.debit(Owner::Holder(from), asset, amount).map_err(|available| {
                    CustodyError::InsufficientFunds {
                        holder: from,
                        asset,
                        available,
                        required: amount,
                    }
                })?;
                self.credit(Owner::Vault(vault), asset, amount)
            }
            Movement::TransferOut { vault, to, asset, amount } => {
                self.debit(Owner::Vault(vault), asset, amount).map_err(|available| {
                    CustodyError::VaultShortfall {
                        vault,
                        asset,
                        available,
                        required: amount,
                    }
                })?;
                self.credit(Owner::Holder(to), asset, amount)
            }
            Movement::Mint { lp_mint, to, amount } => {
                let supply = self
                    .supply(&lp_mint)
                    .checked_add(amount)
                    .ok_or(CustodyError::Overflow { asset: lp_mint })?;
                self.credit(Owner::Holder(to), lp_mint, amount)?;
                self.supplies.insert(lp_mint, supply);
                Ok(())
            }
            Movement::Burn { lp_mint, from, amount } => {
                self.debit(Owner::Holder(from), lp_mint, amount).map_err(|available| {
                    CustodyError::InsufficientClaimBalance {
                        holder: from,
                        lp_mint,
                        available,
                        required: amount,
                    }
                })?;
                // Supply always covers what any one holder owns
                let supply = self.supply(&lp_mint).saturating_sub(amount);
                self.supplies.insert(lp_mint, supply);
                Ok(())
            }
        }
    }

    fn commit(self) -> (HashMap<(Owner, AssetId), u64>, HashMap<AssetId, u64>) {
        (self.balances, self.supplies)
    }
}

/// In-process custody backed by hash maps
///
/// Used by the CLI and tests. Settlements are staged against a read-only view
/// and merged only when every movement succeeds.
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    books: Mutex<Books>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give a holder external funds
    pub fn credit(&self, holder: HolderId, asset: AssetId, amount: u64) -> Result<(), CustodyError> {
        let mut books = self.books.lock();
        let balance = books.balances.entry((Owner::Holder(holder), asset)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { asset })?;
        Ok(())
    }

    pub fn holder_balance(&self, holder: HolderId, asset: AssetId) -> u64 {
        self.balance(&Owner::Holder(holder), &asset)
    }
}

impl TokenCustody for InMemoryCustody {
    fn balance(&self, owner: &Owner, asset: &AssetId) -> u64 {
        self.books
            .lock()
            .balances
            .get(&(*owner, *asset))
            .copied()
            .unwrap_or(0)
    }

    fn supply(&self, asset: &AssetId) -> u64 {
        self.books.lock().supplies.get(asset).copied().unwrap_or(0)
    }

    fn settle(&self, settlement: &Settlement) -> Result<(), CustodyError> {
        let mut books = self.books.lock();

        let (balances, supplies) = {
            let mut staged = Staged::new(&books);
            for movement in settlement.movements() {
                staged.apply(movement)?;
            }
            staged.commit()
        };

        books.balances.extend(balances);
        books.supplies.extend(supplies);
        Ok(())
    }
}
