//! Double-entry quantity ledger.
//!
//! Records transfers of a fungible quantity between named containers in an
//! append-only journal, keeps a balance per container, and can prove from the
//! journal alone that the cached balances are right and sum to zero.
//!
//! Pure domain logic only: no IO, no persistence.

pub mod balance;
pub mod journal;
pub mod ledger;
pub mod report;
pub mod rules;
pub mod shared;
pub mod transfer;
pub mod verify;

pub use balance::BalanceTable;
pub use journal::{Journal, JournalEntry};
pub use ledger::{
    Ledger, LedgerCommand, LedgerEvent, LedgerId, LedgerReset, RecordTransfer, ResetLedger,
    TransferReceipt, TransferRecorded,
};
pub use report::ReportStyle;
pub use rules::{RejectSelfTransfer, RequirePositiveAmount, RulePolicy, TransferRule, TransferRules};
pub use shared::SharedLedger;
pub use transfer::{ContainerId, Transfer};
pub use verify::{AccountAudit, Delta, VerificationReport};
