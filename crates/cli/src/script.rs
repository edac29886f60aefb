//! Transfer scripts: one transfer per line, `description | from | to | amount`.
//!
//! Blank lines and lines starting with `#` are skipped. The amount stays text
//! here; the ledger parses it, so a bad amount is reported as the ledger's own
//! `InvalidAmount`.

use thiserror::Error;

use tally_core::DomainError;
use tally_ledger::{Ledger, TransferReceipt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub description: String,
    pub from: String,
    pub to: String,
    pub amount: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: expected `description | from | to | amount`, found {fields} field(s)")]
    Malformed { line: usize, fields: usize },

    #[error("line {line}: empty {field}")]
    EmptyField { line: usize, field: &'static str },

    #[error("line {line}: {source}")]
    Rejected {
        line: usize,
        #[source]
        source: DomainError,
    },
}

/// Parse a whole script. Stops at the first malformed line.
pub fn parse(input: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut lines = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split('|').map(str::trim).collect();
        let [description, from, to, amount] = fields.as_slice() else {
            return Err(ScriptError::Malformed {
                line,
                fields: fields.len(),
            });
        };
        for (field, value) in [("source", from), ("destination", to)] {
            if value.is_empty() {
                return Err(ScriptError::EmptyField { line, field });
            }
        }

        lines.push(ScriptLine {
            line,
            description: description.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.to_string(),
        });
    }
    Ok(lines)
}

/// Record every line in order, stopping at the first rejection.
///
/// Lines recorded before a rejection stay recorded.
pub fn apply(
    ledger: &mut Ledger,
    lines: &[ScriptLine],
    mut on_recorded: impl FnMut(&TransferReceipt),
) -> Result<usize, ScriptError> {
    for l in lines {
        let receipt = ledger
            .record_transfer_str(
                l.description.as_str(),
                l.from.as_str(),
                l.to.as_str(),
                &l.amount,
            )
            .map_err(|source| ScriptError::Rejected {
                line: l.line,
                source,
            })?;
        on_recorded(&receipt);
    }
    Ok(lines.len())
}
