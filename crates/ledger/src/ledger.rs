use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, EntryId, Quantity,
};
use tally_events::{Event, Projection, execute};

use crate::balance::BalanceTable;
use crate::journal::Journal;
use crate::rules::TransferRules;
use crate::transfer::{ContainerId, Transfer};
use crate::verify::{self, VerificationReport};

/// Ledger identifier (aggregate id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(pub AggregateId);

impl LedgerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LedgerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Command: RecordTransfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTransfer {
    pub ledger_id: LedgerId,
    pub entry_id: EntryId,
    pub transfer: Transfer,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResetLedger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetLedger {
    pub ledger_id: LedgerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RecordTransfer(RecordTransfer),
    Reset(ResetLedger),
}

/// Event: TransferRecorded. The payload of every journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecorded {
    pub ledger_id: LedgerId,
    pub entry_id: EntryId,
    pub transfer: Transfer,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LedgerReset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReset {
    pub ledger_id: LedgerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    TransferRecorded(TransferRecorded),
    LedgerReset(LedgerReset),
}

impl Event for TransferRecorded {
    fn event_type(&self) -> &'static str {
        "ledger.transfer.recorded"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::TransferRecorded(e) => e.event_type(),
            LedgerEvent::LedgerReset(_) => "ledger.reset",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::TransferRecorded(e) => e.occurred_at,
            LedgerEvent::LedgerReset(e) => e.occurred_at,
        }
    }
}

/// What a successful `record_transfer` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Journal position of the new entry (1-based).
    pub sequence: u64,
    pub transfer: Transfer,
    /// Source balance after the transfer.
    pub from_balance: Quantity,
    /// Destination balance after the transfer.
    pub to_balance: Quantity,
}

/// Aggregate root: Ledger.
///
/// Owns the journal and the balance table as one unit. Every mutation goes
/// through `apply`, which touches both or neither, so outside observers never
/// see one without the other.
#[derive(Debug, Clone)]
pub struct Ledger {
    id: LedgerId,
    journal: Journal,
    balances: BalanceTable,
    rules: TransferRules,
    version: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Fresh ledger with a new id and permissive rules.
    pub fn new() -> Self {
        Self::empty(LedgerId::new(AggregateId::new()))
    }

    pub fn with_rules(rules: impl Into<TransferRules>) -> Self {
        Self::empty(LedgerId::new(AggregateId::new())).rules(rules)
    }

    /// Empty aggregate for rehydration.
    pub fn empty(id: LedgerId) -> Self {
        Self {
            id,
            journal: Journal::new(),
            balances: BalanceTable::new(),
            rules: TransferRules::permissive(),
            version: 0,
        }
    }

    /// Replace the transfer rules. Already recorded entries are not re-checked.
    pub fn rules(mut self, rules: impl Into<TransferRules>) -> Self {
        self.rules = rules.into();
        self
    }

    /// Rebuild a ledger by applying previously emitted events in order.
    pub fn from_events<'a>(
        id: LedgerId,
        rules: impl Into<TransferRules>,
        events: impl IntoIterator<Item = &'a LedgerEvent>,
    ) -> Self {
        let mut ledger = Self::empty(id).rules(rules);
        for event in events {
            ledger.apply(event);
        }
        ledger
    }

    pub fn id_typed(&self) -> LedgerId {
        self.id
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn balances(&self) -> &BalanceTable {
        &self.balances
    }

    pub fn transfer_rules(&self) -> &TransferRules {
        &self.rules
    }

    pub fn transfer_count(&self) -> usize {
        self.journal.len()
    }

    /// Decide and apply a command in one step.
    ///
    /// On error nothing has changed.
    pub fn execute(&mut self, command: &LedgerCommand) -> DomainResult<Vec<LedgerEvent>> {
        execute(self, command)
    }

    /// Record a transfer of `amount` from `from` to `to`.
    ///
    /// Runs the transfer rules first, then the range check; if either rejects,
    /// the journal and balances are left untouched.
    pub fn record_transfer(
        &mut self,
        description: impl Into<String>,
        from: impl Into<ContainerId>,
        to: impl Into<ContainerId>,
        amount: Quantity,
    ) -> DomainResult<TransferReceipt> {
        let transfer = Transfer::new(description, from, to, amount);
        let sequence = self.journal.next_sequence();

        self.execute(&LedgerCommand::RecordTransfer(RecordTransfer {
            ledger_id: self.id,
            entry_id: EntryId::new(),
            transfer: transfer.clone(),
            occurred_at: Utc::now(),
        }))?;

        let from_balance = self.balances.get(transfer.from());
        let to_balance = self.balances.get(transfer.to());
        Ok(TransferReceipt {
            sequence,
            transfer,
            from_balance,
            to_balance,
        })
    }

    /// Like [`Ledger::record_transfer`], for an amount that arrives as text.
    ///
    /// Text that is not a plain decimal number fails with
    /// [`DomainError::InvalidAmount`] before anything is recorded.
    pub fn record_transfer_str(
        &mut self,
        description: impl Into<String>,
        from: impl Into<ContainerId>,
        to: impl Into<ContainerId>,
        amount: &str,
    ) -> DomainResult<TransferReceipt> {
        let amount: Quantity = amount.parse().inspect_err(|e| {
            tracing::warn!(ledger = %self.id, error = %e, "rejected transfer with invalid amount");
        })?;
        self.record_transfer(description, from, to, amount)
    }

    /// Current balance of `account`, zero if it was never referenced.
    pub fn balance(&self, account: &str) -> Quantity {
        self.balances.get(account)
    }

    /// Every container that appears in the journal, in name order.
    pub fn accounts(&self) -> BTreeSet<ContainerId> {
        self.journal.accounts()
    }

    /// Sum of all cached balances. Zero for a healthy ledger.
    pub fn verify_conservation(&self) -> Quantity {
        self.balances.total()
    }

    /// Recompute every balance from the journal and compare with the cache.
    pub fn verification_report(&self) -> VerificationReport {
        verify::verify(&self.journal, &self.balances)
    }

    /// Empty the journal and the balance table together.
    pub fn reset(&mut self) {
        let discarded = self.journal.len();
        self.apply(&LedgerEvent::LedgerReset(LedgerReset {
            ledger_id: self.id,
            occurred_at: Utc::now(),
        }));
        tracing::info!(ledger = %self.id, discarded, "ledger reset");
    }
}

impl AggregateRoot for Ledger {
    type Id = LedgerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Ledger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::TransferRecorded(e) => {
                let entry = self.journal.append(self.id.0, e.clone());
                self.balances.apply(entry);
                tracing::debug!(
                    ledger = %self.id,
                    sequence = entry.sequence_number(),
                    from = %e.transfer.from(),
                    to = %e.transfer.to(),
                    amount = %e.transfer.amount(),
                    "transfer recorded"
                );
            }
            LedgerEvent::LedgerReset(_) => {
                self.journal.clear();
                self.balances.clear();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RecordTransfer(cmd) => self.handle_record(cmd),
            LedgerCommand::Reset(cmd) => self.handle_reset(cmd),
        }
    }
}

impl Ledger {
    fn ensure_ledger_id(&self, ledger_id: LedgerId) -> Result<(), DomainError> {
        if self.id != ledger_id {
            return Err(DomainError::invariant("ledger_id mismatch"));
        }
        Ok(())
    }

    /// Refuse a transfer whose effect would leave the representable range.
    ///
    /// Keeping the journal volume in range bounds every balance, every partial
    /// sum of balances and every audit accumulator, whatever order they are
    /// summed in.
    fn ensure_in_range(&self, transfer: &Transfer) -> Result<(), DomainError> {
        let amount = transfer.amount();
        let overflow = || {
            tracing::warn!(
                ledger = %self.id,
                from = %transfer.from(),
                to = %transfer.to(),
                amount = %amount,
                volume = %self.journal.volume(),
                "rejected transfer past the quantity range"
            );
            DomainError::overflow(format!(
                "moving {amount} from {} to {} exceeds the ledger's quantity range",
                transfer.from(),
                transfer.to()
            ))
        };

        self.journal
            .volume()
            .checked_add(amount.abs())
            .ok_or_else(overflow)?;
        if !transfer.is_self_transfer() {
            self.balances
                .get(transfer.from())
                .checked_sub(amount)
                .ok_or_else(overflow)?;
            self.balances
                .get(transfer.to())
                .checked_add(amount)
                .ok_or_else(overflow)?;
        }
        Ok(())
    }

    fn handle_record(&self, cmd: &RecordTransfer) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_ledger_id(cmd.ledger_id)?;
        self.rules.check(&cmd.transfer, &self.balances)?;
        self.ensure_in_range(&cmd.transfer)?;

        Ok(vec![LedgerEvent::TransferRecorded(TransferRecorded {
            ledger_id: cmd.ledger_id,
            entry_id: cmd.entry_id,
            transfer: cmd.transfer.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reset(&self, cmd: &ResetLedger) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_ledger_id(cmd.ledger_id)?;

        Ok(vec![LedgerEvent::LedgerReset(LedgerReset {
            ledger_id: cmd.ledger_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
