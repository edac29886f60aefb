//! Independent audit of the balance table.
//!
//! Balances are recomputed here by walking the journal from the first entry,
//! and only then compared with the cached table. Nothing in this module reads
//! a cached balance before the comparison step, and nothing here shares code
//! with the incremental update in `balance.rs`.

use std::collections::BTreeMap;

use serde::Serialize;

use tally_core::{DomainError, DomainResult, Quantity};

use crate::balance::BalanceTable;
use crate::journal::Journal;
use crate::transfer::ContainerId;

/// One journal entry's effect on one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delta {
    /// Journal position of the entry.
    pub sequence: u64,
    /// Positive when the account received, negative when it gave.
    pub amount: Quantity,
}

/// Recomputed history of a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountAudit {
    pub account: ContainerId,
    pub gained: Quantity,
    pub lost: Quantity,
    /// Per-entry deltas in journal order.
    pub deltas: Vec<Delta>,
    /// `gained - lost`, derived from the journal.
    pub expected: Quantity,
    /// Value held in the balance table.
    pub actual: Quantity,
}

impl AccountAudit {
    fn new(account: ContainerId) -> Self {
        Self {
            account,
            gained: Quantity::ZERO,
            lost: Quantity::ZERO,
            deltas: Vec::new(),
            expected: Quantity::ZERO,
            actual: Quantity::ZERO,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.expected == self.actual
    }
}

/// Result of replaying the journal against the balance table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// One audit per journal account, ordered by name.
    pub audits: Vec<AccountAudit>,
    /// Cached balances for containers the journal never mentions.
    pub orphans: Vec<(ContainerId, Quantity)>,
    pub entries: u64,
    /// Sum of all recomputed balances.
    pub journal_total: Quantity,
    /// Sum of all cached balances.
    pub cached_total: Quantity,
    /// False when a recomputed sum left the representable range and was
    /// clamped; none of the figures above can then be trusted.
    pub in_range: bool,
}

impl VerificationReport {
    /// True when every cached balance matches the journal and both totals are zero.
    pub fn is_consistent(&self) -> bool {
        self.in_range
            && self.audits.iter().all(AccountAudit::is_consistent)
            && self.orphans.iter().all(|(_, balance)| balance.is_zero())
            && self.journal_total.is_zero()
            && self.cached_total.is_zero()
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &AccountAudit> {
        self.audits.iter().filter(|a| !a.is_consistent())
    }

    pub fn audit_for(&self, account: &str) -> Option<&AccountAudit> {
        self.audits.iter().find(|a| a.account.as_str() == account)
    }

    /// Turn an inconsistent report into an invariant violation.
    pub fn into_result(self) -> DomainResult<Self> {
        if self.is_consistent() {
            return Ok(self);
        }
        let mut problems: Vec<String> = self
            .mismatches()
            .map(|a| format!("{} cached {} but journal gives {}", a.account, a.actual, a.expected))
            .collect();
        problems.extend(
            self.orphans
                .iter()
                .filter(|(_, balance)| !balance.is_zero())
                .map(|(account, balance)| format!("{account} cached {balance} but never journaled")),
        );
        if !self.cached_total.is_zero() {
            problems.push(format!("cached balances sum to {}", self.cached_total));
        }
        if !self.in_range {
            problems.push("sums exceed the representable quantity range".to_string());
        }
        Err(DomainError::invariant(problems.join("; ")))
    }
}

/// Running sum that clamps instead of panicking and remembers that it did.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    in_range: bool,
}

impl Accumulator {
    fn add(&mut self, acc: &mut Quantity, value: Quantity) {
        match acc.checked_add(value) {
            Some(sum) => *acc = sum,
            None => {
                self.in_range = false;
                *acc = acc.saturating_add(value);
            }
        }
    }

    fn sub(&mut self, lhs: Quantity, rhs: Quantity) -> Quantity {
        lhs.checked_sub(rhs).unwrap_or_else(|| {
            self.in_range = false;
            lhs.saturating_sub(rhs)
        })
    }
}

/// Replay `journal` and cross-check every account against `balances`.
pub fn verify(journal: &Journal, balances: &BalanceTable) -> VerificationReport {
    let mut audits: BTreeMap<ContainerId, AccountAudit> = BTreeMap::new();
    let mut sums = Accumulator { in_range: true };

    for entry in journal {
        let sequence = entry.sequence_number();
        let transfer = &entry.payload().transfer;
        let amount = transfer.amount();

        let to = audits
            .entry(transfer.to().clone())
            .or_insert_with(|| AccountAudit::new(transfer.to().clone()));
        sums.add(&mut to.gained, amount);
        to.deltas.push(Delta { sequence, amount });

        let from = audits
            .entry(transfer.from().clone())
            .or_insert_with(|| AccountAudit::new(transfer.from().clone()));
        sums.add(&mut from.lost, amount);
        from.deltas.push(Delta {
            sequence,
            amount: -amount,
        });
    }

    let mut journal_total = Quantity::ZERO;
    for audit in audits.values_mut() {
        audit.expected = sums.sub(audit.gained, audit.lost);
        audit.actual = balances.get(&audit.account);
        sums.add(&mut journal_total, audit.expected);
    }

    let mut orphans: Vec<(ContainerId, Quantity)> = balances
        .iter()
        .filter(|(account, _)| !audits.contains_key(*account))
        .map(|(account, balance)| (account.clone(), balance))
        .collect();
    orphans.sort();

    let report = VerificationReport {
        audits: audits.into_values().collect(),
        orphans,
        entries: journal.len() as u64,
        journal_total,
        cached_total: balances.checked_total().unwrap_or_else(|| {
            sums.in_range = false;
            balances.total()
        }),
        in_range: sums.in_range,
    };

    if !report.is_consistent() {
        tracing::error!(
            mismatches = report.mismatches().count(),
            orphans = report.orphans.len(),
            cached_total = %report.cached_total,
            "balance table diverged from journal"
        );
    }

    report
}
