//! Turning provider records into leaderboard entries.
//!
//! Ownership APIs already report balances and are passed through. Transfer
//! histories are replayed: every transfer of the target token debits its
//! sender (unless it is a mint) and credits its receiver.

use std::collections::BTreeMap;

use alloy::primitives::{Address, I256};
use holdboard_common::{address_key, LeaderboardEntry, OwnerBalance, TokenId, TransferEvent};
use tracing::{debug, info, warn};

use crate::config::Config;

#[derive(Clone, Debug)]
pub struct ReconcileRules {
    pub token_id: TokenId,
    pub omit_burn_address: bool,
    pub fail_on_negative_balance: bool,
}

impl From<&Config> for ReconcileRules {
    fn from(config: &Config) -> Self {
        Self {
            token_id: config.token_id,
            omit_burn_address: config.omit_burn_address,
            fail_on_negative_balance: config.fail_on_negative_balance,
        }
    }
}

/// Records a provider hands out, and how they become leaderboard entries.
pub trait Reconcile: Sized {
    fn reconcile(records: Vec<Self>, rules: &ReconcileRules)
        -> crate::Result<Vec<LeaderboardEntry>>;
}

impl Reconcile for OwnerBalance {
    fn reconcile(
        records: Vec<Self>,
        rules: &ReconcileRules,
    ) -> crate::Result<Vec<LeaderboardEntry>> {
        records
            .into_iter()
            .filter(|record| {
                if record.balance.is_zero() {
                    debug!(owner = %address_key(&record.owner), "dropping owner with zero balance");
                    return false;
                }
                !(rules.omit_burn_address && record.owner == Address::ZERO)
            })
            .map(|record| {
                LeaderboardEntry::new(&record.owner, record.balance).map_err(crate::Error::from)
            })
            .collect()
    }
}

impl Reconcile for TransferEvent {
    fn reconcile(
        records: Vec<Self>,
        rules: &ReconcileRules,
    ) -> crate::Result<Vec<LeaderboardEntry>> {
        let ledger = Ledger::replay(records, rules.token_id)?;
        ledger.into_entries(rules)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: usize,
    pub matched: usize,
    pub mints: usize,
    pub burns: usize,
}

/// Running balances per holder, ordered by address.
#[derive(Debug, Default)]
pub struct Ledger {
    balances: BTreeMap<Address, I256>,
    pub stats: ReplayStats,
}

impl Ledger {
    pub fn replay<I>(events: I, token_id: TokenId) -> crate::Result<Self>
    where
        I: IntoIterator<Item = TransferEvent>,
    {
        let mut ledger = Ledger::default();
        for event in events {
            ledger.apply(&event, token_id)?;
        }

        info!(
            events = ledger.stats.events,
            matched = ledger.stats.matched,
            mints = ledger.stats.mints,
            burns = ledger.stats.burns,
            holders = ledger.balances.len(),
            "Replayed transfer history."
        );
        Ok(ledger)
    }

    fn apply(&mut self, event: &TransferEvent, token_id: TokenId) -> crate::Result<()> {
        self.stats.events += 1;
        if event.token_id != token_id {
            return Ok(());
        }
        self.stats.matched += 1;

        let amount = I256::try_from(event.amount).map_err(|_| crate::Error::BalanceOverflow {
            address: address_key(&event.to),
        })?;

        if event.is_mint() {
            self.stats.mints += 1;
        } else {
            self.adjust(event.from, amount, I256::checked_sub)?;
        }

        // Burns credit the zero address as well; see `ReconcileRules::omit_burn_address`.
        if event.is_burn() {
            self.stats.burns += 1;
        }
        self.adjust(event.to, amount, I256::checked_add)
    }

    fn adjust(
        &mut self,
        address: Address,
        amount: I256,
        op: fn(I256, I256) -> Option<I256>,
    ) -> crate::Result<()> {
        let balance = self.balances.entry(address).or_insert(I256::ZERO);
        *balance = op(*balance, amount).ok_or_else(|| crate::Error::BalanceOverflow {
            address: address_key(&address),
        })?;
        Ok(())
    }

    pub fn balance_of(&self, address: &Address) -> I256 {
        self.balances.get(address).copied().unwrap_or(I256::ZERO)
    }

    /// Strictly positive balances as entries. Negative ones are reported.
    pub fn into_entries(self, rules: &ReconcileRules) -> crate::Result<Vec<LeaderboardEntry>> {
        let mut negative = None;
        let mut entries = Vec::new();

        for (address, balance) in self.balances {
            if balance.is_negative() {
                warn!(
                    address = %address_key(&address),
                    %balance,
                    "Holder ended with a negative balance, upstream history is inconsistent."
                );
                negative.get_or_insert((address, balance));
                continue;
            }
            if !balance.is_positive() {
                continue;
            }
            if rules.omit_burn_address && address == Address::ZERO {
                debug!("leaving the zero address out of the leaderboard");
                continue;
            }
            entries.push(LeaderboardEntry::new(&address, balance.into_raw())?);
        }

        if let Some((address, balance)) = negative {
            if rules.fail_on_negative_balance {
                return Err(crate::Error::NegativeBalance {
                    address: address_key(&address),
                    balance: balance.to_string(),
                });
            }
        }

        Ok(entries)
    }
}
