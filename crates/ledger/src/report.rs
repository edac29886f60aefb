//! Plain-text renderings of ledger state.
//!
//! Every function here is a pure function of its arguments: same ledger,
//! same text. Sorting happens on copies and never feeds back into the ledger.

use std::fmt::Write as _;

use tally_core::Quantity;

use crate::journal::Journal;
use crate::ledger::{Ledger, TransferReceipt};
use crate::verify::VerificationReport;

/// Presentation options shared by all reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStyle {
    /// Appended after quantities, e.g. `liters`.
    pub unit: Option<String>,
}

impl ReportStyle {
    pub fn with_unit(unit: impl Into<String>) -> Self {
        Self {
            unit: Some(unit.into()),
        }
    }

    fn qty(&self, value: Quantity) -> String {
        match &self.unit {
            Some(unit) => format!("{value} {unit}"),
            None => value.to_string(),
        }
    }
}

/// `Total in system: <sum>`.
pub fn conservation_summary(ledger: &Ledger, style: &ReportStyle) -> String {
    format!("Total in system: {}\n", style.qty(ledger.verify_conservation()))
}

/// Every cached balance, one per line, by container name.
pub fn balance_listing(ledger: &Ledger, style: &ReportStyle) -> String {
    let mut out = String::from("Current Balances:\n");
    for (account, balance) in ledger.balances().sorted() {
        let _ = writeln!(out, "  {account}: {}", style.qty(balance));
    }
    out
}

/// Per-account replay with itemised deltas, expected and cached values.
pub fn verification_text(report: &VerificationReport, style: &ReportStyle) -> String {
    let mut out = String::new();
    for audit in &report.audits {
        let deltas = audit
            .deltas
            .iter()
            .map(|d| {
                if d.amount.is_negative() {
                    d.amount.to_string()
                } else {
                    format!("+{}", d.amount)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "{}: started with 0, gained {}, lost {} ({}) = {}",
            audit.account,
            audit.gained,
            audit.lost,
            deltas,
            style.qty(audit.expected)
        );
        let _ = writeln!(out, "{} actual: {}", audit.account, style.qty(audit.actual));
        if !audit.is_consistent() {
            let difference = match audit.actual.checked_sub(audit.expected) {
                Some(d) => style.qty(d),
                None => "more than the representable range".to_string(),
            };
            let _ = writeln!(
                out,
                "{} MISMATCH: cached value differs from journal by {difference}",
                audit.account
            );
        }
        out.push('\n');
    }
    for (account, balance) in &report.orphans {
        let _ = writeln!(
            out,
            "{account} ORPHAN: cached {} with no journal entries\n",
            style.qty(*balance)
        );
    }
    if !report.in_range {
        out.push_str("OVERFLOW: sums exceed the representable quantity range\n\n");
    }
    out
}

/// Numbered list of every journal entry in order.
pub fn transaction_history(journal: &Journal, style: &ReportStyle) -> String {
    let mut out = String::new();
    for entry in journal {
        let transfer = &entry.payload().transfer;
        let _ = writeln!(
            out,
            "{}. {}: {} from {} to {}",
            entry.sequence_number(),
            transfer.description(),
            style.qty(transfer.amount()),
            transfer.from(),
            transfer.to()
        );
    }
    out
}

/// Confirmation printed after a transfer is recorded.
pub fn transfer_receipt(receipt: &TransferReceipt, style: &ReportStyle) -> String {
    let t = &receipt.transfer;
    format!(
        "✓ {}\n  {}: -{} (now {})\n  {}: +{} (now {})\n",
        t.description(),
        t.from(),
        t.amount(),
        style.qty(receipt.from_balance),
        t.to(),
        t.amount(),
        style.qty(receipt.to_balance)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    use crate::transfer::ContainerId;
    use crate::verify::{AccountAudit, Delta};

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.record_transfer("fill", "Reservoir", "Tank", Quantity::from(10)).unwrap();
        ledger.record_transfer("spill", "Tank", "Floor", Quantity::from(3)).unwrap();
        ledger
    }

    #[test]
    fn unit_is_optional() {
        let ledger = ledger();
        assert_eq!(
            conservation_summary(&ledger, &ReportStyle::default()),
            "Total in system: 0\n"
        );
        assert_eq!(
            conservation_summary(&ledger, &ReportStyle::with_unit("kg")),
            "Total in system: 0 kg\n"
        );
    }

    #[test]
    fn balances_are_listed_by_name() {
        assert_snapshot!(balance_listing(&ledger(), &ReportStyle::default()), @r"
        Current Balances:
          Floor: 3
          Reservoir: -10
          Tank: 7
        ");
    }

    #[test]
    fn history_is_numbered_in_journal_order() {
        let ledger = ledger();
        assert_eq!(
            transaction_history(ledger.journal(), &ReportStyle::with_unit("L")),
            "1. fill: 10 L from Reservoir to Tank\n2. spill: 3 L from Tank to Floor\n"
        );
    }

    #[test]
    fn deltas_are_signed_by_their_effect() {
        let mut ledger = Ledger::new();
        ledger.record_transfer("reverse", "A", "B", Quantity::from(-2)).unwrap();
        let text = verification_text(&ledger.verification_report(), &ReportStyle::default());
        assert_eq!(
            text,
            "A: started with 0, gained 0, lost -2 (+2) = 2\nA actual: 2\n\n\
             B: started with 0, gained -2, lost 0 (-2) = -2\nB actual: -2\n\n"
        );
    }

    #[test]
    fn out_of_range_audit_is_printed_without_overflowing() {
        let report = VerificationReport {
            audits: vec![AccountAudit {
                account: ContainerId::from("A"),
                gained: Quantity::MAX,
                lost: Quantity::ZERO,
                deltas: vec![Delta { sequence: 1, amount: Quantity::MAX }],
                expected: Quantity::MAX,
                actual: Quantity::MIN,
            }],
            orphans: Vec::new(),
            entries: 1,
            journal_total: Quantity::MAX,
            cached_total: Quantity::MIN,
            in_range: false,
        };
        let text = verification_text(&report, &ReportStyle::default());
        assert!(text.contains("A MISMATCH: cached value differs from journal by more than the representable range\n"));
        assert!(text.ends_with("OVERFLOW: sums exceed the representable quantity range\n\n"));
    }

    #[test]
    fn receipt_shows_both_sides() {
        let mut ledger = ledger();
        let receipt = ledger
            .record_transfer("top up", "Reservoir", "Tank", Quantity::from(5))
            .unwrap();
        assert_eq!(
            transfer_receipt(&receipt, &ReportStyle::with_unit("L")),
            "✓ top up\n  Reservoir: -5 (now -15 L)\n  Tank: +5 (now 12 L)\n"
        );
    }
}
