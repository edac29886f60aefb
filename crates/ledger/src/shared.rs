//! Thread-safe handle for hosts that share one ledger between threads.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_core::{AggregateRoot, DomainResult, ExpectedVersion, Quantity};

use crate::ledger::{Ledger, TransferReceipt};
use crate::transfer::ContainerId;
use crate::verify::VerificationReport;

/// Cloneable handle to a ledger behind a single lock.
///
/// Each write (record or reset) runs entirely under the write lock, so the
/// journal append and balance update of one transfer are never interleaved
/// with another writer or observed half-done by a reader.
///
/// A poisoned lock is recovered rather than propagated. A write changes the
/// ledger only after the transfer rules and the range check have passed, and
/// the journal append and balance update that follow use saturating
/// arithmetic, so no write can panic between those two steps.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_transfer(
        &self,
        description: impl Into<String>,
        from: impl Into<ContainerId>,
        to: impl Into<ContainerId>,
        amount: Quantity,
    ) -> DomainResult<TransferReceipt> {
        self.write().record_transfer(description, from, to, amount)
    }

    pub fn record_transfer_str(
        &self,
        description: impl Into<String>,
        from: impl Into<ContainerId>,
        to: impl Into<ContainerId>,
        amount: &str,
    ) -> DomainResult<TransferReceipt> {
        self.write().record_transfer_str(description, from, to, amount)
    }

    /// Record only if nobody else has written since the caller read `expected`.
    pub fn record_transfer_expecting(
        &self,
        expected: ExpectedVersion,
        description: impl Into<String>,
        from: impl Into<ContainerId>,
        to: impl Into<ContainerId>,
        amount: Quantity,
    ) -> DomainResult<TransferReceipt> {
        let mut ledger = self.write();
        expected.check(ledger.version())?;
        ledger.record_transfer(description, from, to, amount)
    }

    pub fn reset(&self) {
        self.write().reset();
    }

    pub fn version(&self) -> u64 {
        self.read().version()
    }

    pub fn balance(&self, account: &str) -> Quantity {
        self.read().balance(account)
    }

    pub fn accounts(&self) -> BTreeSet<ContainerId> {
        self.read().accounts()
    }

    pub fn verify_conservation(&self) -> Quantity {
        self.read().verify_conservation()
    }

    pub fn verification_report(&self) -> VerificationReport {
        self.read().verification_report()
    }

    /// Run `f` against a consistent view of the ledger.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.read())
    }
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        Self::new(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tally_core::DomainError;

    #[test]
    fn concurrent_writers_preserve_conservation() {
        let shared = SharedLedger::new(Ledger::new());
        let names = ["A", "B", "C", "D"];

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for n in 0..250 {
                        let from = names[(i + n) % names.len()];
                        let to = names[(i + n + 1) % names.len()];
                        shared
                            .record_transfer("t", from, to, Quantity::from(n as i64))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.version(), 1000);
        assert_eq!(shared.verify_conservation(), Quantity::ZERO);
        assert!(shared.verification_report().is_consistent());
        assert_eq!(shared.with_ledger(|l| l.transfer_count()), 1000);
    }

    #[test]
    fn stale_expected_version_is_a_conflict() {
        let shared = SharedLedger::from(Ledger::new());
        let seen = shared.version();
        shared.record_transfer("first", "A", "B", Quantity::from(1)).unwrap();

        let err = shared
            .record_transfer_expecting(ExpectedVersion::Exact(seen), "late", "A", "B", Quantity::from(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(shared.balance("B"), Quantity::from(1));

        shared
            .record_transfer_expecting(ExpectedVersion::Exact(1), "fresh", "A", "B", Quantity::from(1))
            .unwrap();
        assert_eq!(shared.balance("B"), Quantity::from(2));
    }

    #[test]
    fn out_of_range_transfer_fails_cleanly_and_keeps_the_handle_usable() {
        let shared = SharedLedger::new(Ledger::new());
        let max = "79228162514264337593543950335";
        shared.record_transfer_str("first", "A", "B", max).unwrap();

        let err = shared.record_transfer_str("second", "A", "B", max).unwrap_err();
        assert!(matches!(err, DomainError::Overflow(_)));

        assert_eq!(shared.with_ledger(|l| l.transfer_count()), 1);
        assert_eq!(shared.balance("A"), Quantity::MIN);
        assert_eq!(shared.balance("B"), Quantity::MAX);
        assert_eq!(shared.verify_conservation(), Quantity::ZERO);
        assert!(shared.verification_report().is_consistent());
    }

    #[test]
    fn reset_through_handle_is_visible_to_clones() {
        let shared = SharedLedger::new(Ledger::new());
        let other = shared.clone();
        shared.record_transfer_str("t", "A", "B", "3").unwrap();
        other.reset();
        assert!(shared.accounts().is_empty());
        assert_eq!(shared.balance("B"), Quantity::ZERO);
    }
}
