//! Command-line harness around the tally ledger.
//!
//! The harness owns one ledger per invocation, feeds it transfers, and prints
//! the ledger's reports. Nothing here maintains ledger invariants.

pub mod config;
pub mod script;

use std::io::Write;

use anyhow::{Context, Result, bail};

use tally_core::Quantity;
use tally_ledger::report::{
    balance_listing, conservation_summary, transaction_history, transfer_receipt,
    verification_text,
};
use tally_ledger::{Ledger, ReportStyle, TransferRules};

use crate::config::Config;

/// Output options for a single invocation.
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub style: ReportStyle,
    /// Print the verification report as JSON instead of the text reports.
    pub json: bool,
}

impl Output {
    pub fn from_config(config: &Config, json: bool) -> Self {
        Self {
            style: ReportStyle {
                unit: config.unit.clone(),
            },
            json,
        }
    }
}

/// The water tank walkthrough: every drop comes from somewhere and goes somewhere.
pub const DEMO_TRANSFERS: [(&str, &str, &str, i64); 4] = [
    ("Fill Tank A from reservoir", "External_Reservoir", "Tank_A", 100),
    ("Transfer from Tank A to Tank B", "Tank_A", "Tank_B", 30),
    ("Pump water into Tank A", "Water_Pump_Source", "Tank_A", 20),
    ("Tank B leaks to ground", "Tank_B", "Environment", 5),
];

pub fn run_demo(out: &mut impl Write, rules: TransferRules, output: &Output) -> Result<()> {
    let mut ledger = Ledger::with_rules(rules);
    let style = &output.style;

    if !output.json {
        writeln!(out, "=== Water Tank System Demo ===")?;
        writeln!(out)?;
    }

    for (description, from, to, amount) in DEMO_TRANSFERS {
        let receipt = ledger
            .record_transfer(description, from, to, Quantity::from(amount))
            .with_context(|| format!("demo transfer {description:?} was rejected"))?;
        if !output.json {
            writeln!(out, "{}", transfer_receipt(&receipt, style))?;
            write!(out, "{}", conservation_summary(&ledger, style))?;
            writeln!(out, "{}", balance_listing(&ledger, style))?;
        }
    }

    finish(out, &ledger, output)
}

pub fn run_script(
    out: &mut impl Write,
    source: &str,
    rules: TransferRules,
    output: &Output,
) -> Result<()> {
    let lines = script::parse(source)?;
    let mut ledger = Ledger::with_rules(rules);
    let style = &output.style;

    let mut receipts = Vec::new();
    let applied = script::apply(&mut ledger, &lines, |r| {
        if !output.json {
            receipts.push(transfer_receipt(r, style));
        }
    });
    for receipt in &receipts {
        writeln!(out, "{receipt}")?;
    }
    let count = applied?;
    tracing::info!(transfers = count, "script applied");

    finish(out, &ledger, output)
}

/// Final reports shared by every command; fails if verification does.
fn finish(out: &mut impl Write, ledger: &Ledger, output: &Output) -> Result<()> {
    let report = ledger.verification_report();
    let style = &output.style;

    if output.json {
        serde_json::to_writer_pretty(&mut *out, &report)
            .context("failed to write verification report")?;
        writeln!(out)?;
    } else {
        write!(out, "{}", balance_listing(ledger, style))?;
        writeln!(out)?;
        writeln!(out, "=== Verification ===")?;
        write!(out, "{}", verification_text(&report, style))?;
        writeln!(out, "=== Conservation Check ===")?;
        write!(out, "{}", conservation_summary(ledger, style))?;
        writeln!(out)?;
        writeln!(out, "=== Transaction History ===")?;
        write!(out, "{}", transaction_history(ledger.journal(), style))?;
    }

    if let Err(e) = report.into_result() {
        bail!("verification failed: {e}");
    }
    Ok(())
}
