//! Balance table: the journal projected into one signed total per container.

use core::borrow::Borrow;
use core::hash::Hash;
use std::collections::HashMap;

use tally_core::Quantity;
use tally_events::{EventEnvelope, Projection};

use crate::ledger::TransferRecorded;
use crate::transfer::ContainerId;

/// Cached balance per container, updated once per journal entry.
///
/// A container that was never named has a balance of zero; absence is not an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceTable {
    balances: HashMap<ContainerId, Quantity>,
}

impl BalanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance, zero when the container has never been referenced.
    pub fn get<Q>(&self, account: &Q) -> Quantity
    where
        ContainerId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.balances.get(account).copied().unwrap_or(Quantity::ZERO)
    }

    pub fn contains<Q>(&self, account: &Q) -> bool
    where
        ContainerId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.balances.contains_key(account)
    }

    /// Sum of every cached balance.
    ///
    /// Exact for any table the ledger built itself; clamps at the range
    /// limits instead of panicking otherwise.
    pub fn total(&self) -> Quantity {
        self.checked_total().unwrap_or_else(|| {
            self.balances
                .values()
                .fold(Quantity::ZERO, |acc, v| acc.saturating_add(*v))
        })
    }

    /// Sum of every cached balance, `None` if a partial sum overflows.
    pub fn checked_total(&self) -> Option<Quantity> {
        Quantity::checked_sum(self.balances.values().copied())
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Unordered view of the cached balances.
    pub fn iter(&self) -> impl Iterator<Item = (&ContainerId, Quantity)> {
        self.balances.iter().map(|(k, v)| (k, *v))
    }

    /// Snapshot ordered by container name, for display.
    pub fn sorted(&self) -> Vec<(&ContainerId, Quantity)> {
        let mut rows: Vec<_> = self.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, account: &str, value: Quantity) {
        self.balances.insert(ContainerId::from(account), value);
    }
}

impl Projection for BalanceTable {
    type Ev = TransferRecorded;

    // The ledger rejects any transfer that would push a balance out of range,
    // so saturation is only reachable by replaying foreign events. The audit
    // flags it when it happens.
    fn apply(&mut self, envelope: &EventEnvelope<TransferRecorded>) {
        let transfer = &envelope.payload().transfer;
        let amount = transfer.amount();

        if transfer.is_self_transfer() {
            self.balances.entry(transfer.from().clone()).or_default();
            return;
        }
        let from = self.balances.entry(transfer.from().clone()).or_default();
        *from = from.saturating_sub(amount);
        let to = self.balances.entry(transfer.to().clone()).or_default();
        *to = to.saturating_add(amount);
    }

    fn clear(&mut self) {
        self.balances.clear();
    }
}
