//! Append-only journal: the ledger's source of truth.

use std::collections::BTreeSet;

use tally_core::{AggregateId, Quantity};
use tally_events::EventEnvelope;

use crate::ledger::TransferRecorded;
use crate::transfer::{ContainerId, Transfer};

/// Aggregate type recorded on every journal envelope.
pub const AGGREGATE_TYPE: &str = "ledger";

/// A journal entry: the recorded transfer plus its stream metadata.
pub type JournalEntry = EventEnvelope<TransferRecorded>;

/// Ordered sequence of recorded transfers.
///
/// Entries are appended with consecutive sequence numbers starting at 1 and
/// are never edited. Only the owning ledger appends or clears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    /// Sum of `|amount|` over all entries, clamped at `Quantity::MAX`.
    volume: Quantity,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `event` at the next position and append it.
    pub(crate) fn append(&mut self, ledger: AggregateId, event: TransferRecorded) -> &JournalEntry {
        let sequence = self.next_sequence();
        self.volume = self.volume.saturating_add(event.transfer.amount().abs());
        self.entries.push(EventEnvelope::new(
            event.entry_id,
            ledger,
            AGGREGATE_TYPE,
            sequence,
            event,
        ));
        &self.entries[self.entries.len() - 1]
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.volume = Quantity::ZERO;
    }

    /// Sequence number the next appended entry will get.
    pub fn next_sequence(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    /// Total quantity moved by all entries, regardless of direction.
    ///
    /// Any sum of balances or per-account gains and losses over this journal
    /// is bounded by this value, so while it stays representable none of
    /// those sums can overflow.
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a 1-based sequence number.
    pub fn get(&self, sequence: u64) -> Option<&JournalEntry> {
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.last()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, JournalEntry> {
        self.entries.iter()
    }

    /// Transfers in insertion order.
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.entries.iter().map(|e| &e.payload().transfer)
    }

    /// Every container named as source or destination, deduplicated.
    ///
    /// Derived from the entries, not from balances, so a container whose
    /// balance nets to zero is still listed.
    pub fn accounts(&self) -> BTreeSet<ContainerId> {
        let mut accounts = BTreeSet::new();
        for transfer in self.transfers() {
            accounts.insert(transfer.from().clone());
            accounts.insert(transfer.to().clone());
        }
        accounts
    }
}

impl<'a> IntoIterator for &'a Journal {
    type Item = &'a JournalEntry;
    type IntoIter = std::slice::Iter<'a, JournalEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
