//! Ledger Property Tests
//!
//! Random interleavings of deposits and withdrawals by several holders. After
//! every step, accepted or rejected, the pool counters, the custody books and
//! the ledger stats must still agree.

use pool_ledger::{InMemoryCustody, Owner, PoolLedger, TokenCustody};
use proptest::prelude::*;
use std::sync::Arc;
use types::{AssetId, AssetPair, HolderId, PoolAddress};

const HOLDERS: usize = 3;
const FUNDING: u64 = 1_000_000_000_000;

#[derive(Debug, Clone)]
enum Op {
    Deposit {
        holder: usize,
        amount_a: u64,
        amount_b: u64,
    },
    Withdraw {
        holder: usize,
        fraction_bps: u64,
    },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..HOLDERS, 1u64..10_000_000, 1u64..10_000_000).prop_map(
            |(holder, amount_a, amount_b)| Op::Deposit {
                holder,
                amount_a,
                amount_b,
            }
        ),
        (0..HOLDERS, 1u64..=10_000).prop_map(|(holder, fraction_bps)| Op::Withdraw {
            holder,
            fraction_bps,
        }),
    ]
}

struct World {
    custody: Arc<InMemoryCustody>,
    ledger: PoolLedger,
    pair: AssetPair,
    pool: PoolAddress,
    holders: Vec<HolderId>,
}

impl World {
    fn new() -> Self {
        let custody = Arc::new(InMemoryCustody::new());
        let ledger = PoolLedger::new(custody.clone());
        let pair =
            AssetPair::sorted(AssetId::from_label("SOL"), AssetId::from_label("USDC")).unwrap();
        let pool = ledger.initialize_pair(pair, 30).unwrap();
        let holders: Vec<HolderId> = (0..HOLDERS)
            .map(|i| HolderId::from_label(&format!("holder-{i}")))
            .collect();
        for holder in &holders {
            custody.credit(*holder, pair.asset_a(), FUNDING).unwrap();
            custody.credit(*holder, pair.asset_b(), FUNDING).unwrap();
        }
        Self {
            custody,
            ledger,
            pair,
            pool,
            holders,
        }
    }

    fn apply(&self, op: &Op) -> bool {
        match *op {
            Op::Deposit {
                holder,
                amount_a,
                amount_b,
            } => self
                .ledger
                .add_liquidity(&self.pool, amount_a, amount_b, self.holders[holder])
                .is_ok(),
            Op::Withdraw {
                holder,
                fraction_bps,
            } => {
                let holder = self.holders[holder];
                let lp_mint = self.ledger.pool(&self.pool).unwrap().lp_mint;
                let owned = self.custody.holder_balance(holder, lp_mint);
                let lp_amount = ((owned as u128 * fraction_bps as u128) / 10_000) as u64;
                self.ledger
                    .withdraw_liquidity(&self.pool, lp_amount, holder)
                    .is_ok()
            }
        }
    }

    fn check_books(&self) -> Result<(), TestCaseError> {
        let pool = self.ledger.pool(&self.pool).unwrap();
        let stats = self.ledger.stats();

        // Vaults hold exactly the reserves
        prop_assert_eq!(
            self.custody.balance(&Owner::Vault(pool.vault_a), &pool.asset_a),
            pool.reserve_a
        );
        prop_assert_eq!(
            self.custody.balance(&Owner::Vault(pool.vault_b), &pool.asset_b),
            pool.reserve_b
        );

        // Supply is mints minus burns, in the engine and at custody
        prop_assert_eq!(self.custody.supply(&pool.lp_mint), pool.lp_supply);
        prop_assert_eq!(
            stats.lp_minted_total - stats.lp_burned_total,
            pool.lp_supply as u128
        );
        let held: u64 = self
            .holders
            .iter()
            .map(|holder| self.custody.holder_balance(*holder, pool.lp_mint))
            .sum();
        prop_assert_eq!(held, pool.lp_supply);

        // No asset is created or destroyed
        for asset in [self.pair.asset_a(), self.pair.asset_b()] {
            let outside: u64 = self
                .holders
                .iter()
                .map(|holder| self.custody.holder_balance(*holder, asset))
                .sum();
            let vault = if asset == pool.asset_a {
                pool.reserve_a
            } else {
                pool.reserve_b
            };
            prop_assert_eq!(outside as u128 + vault as u128, HOLDERS as u128 * FUNDING as u128);
        }

        prop_assert!(
            (pool.reserve_a == 0) == (pool.reserve_b == 0)
                && (pool.reserve_b == 0) == (pool.lp_supply == 0)
        );
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: books agree after any sequence of operations
    #[test]
    fn books_stay_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let world = World::new();
        for op in &ops {
            let before = world.ledger.pool(&world.pool).unwrap();
            let accepted = world.apply(op);
            if !accepted {
                // Rejected operations change nothing
                prop_assert_eq!(world.ledger.pool(&world.pool).unwrap(), before);
            }
            world.check_books()?;
        }
    }

    /// Property: while the pool stays funded, anchor-side (A) backing per
    /// claim token never falls. B is derived from A and rounded down, so its
    /// backing may drift by rounding and is not asserted here.
    #[test]
    fn anchor_backing_per_claim_never_decreases(ops in prop::collection::vec(op(), 1..40)) {
        let world = World::new();
        for op in &ops {
            let before = world.ledger.pool(&world.pool).unwrap();
            world.apply(op);
            let after = world.ledger.pool(&world.pool).unwrap();

            if before.lp_supply > 0 && after.lp_supply > 0 {
                prop_assert!(
                    after.reserve_a as u128 * before.lp_supply as u128
                        >= before.reserve_a as u128 * after.lp_supply as u128
                );
            }
        }
    }

    /// Property: a round trip never returns more than was put in
    #[test]
    fn round_trip_never_profits(
        seed_a in 1_000_000u64..1_000_000_000,
        seed_b in 1_000_000u64..1_000_000_000,
        amount_a in 1_000u64..100_000_000,
    ) {
        let world = World::new();
        let (alice, bob) = (world.holders[0], world.holders[1]);
        world.ledger.add_liquidity(&world.pool, seed_a, seed_b, alice).unwrap();

        let Ok(deposit) = world.ledger.add_liquidity(&world.pool, amount_a, 0, bob) else {
            return Ok(());
        };
        let Ok(withdrawal) = world.ledger.withdraw_liquidity(&world.pool, deposit.lp_minted, bob) else {
            return Ok(());
        };

        prop_assert!(withdrawal.payout_a <= deposit.committed_a);
        prop_assert!(withdrawal.payout_b <= deposit.committed_b);
        world.check_books()?;
    }
}
