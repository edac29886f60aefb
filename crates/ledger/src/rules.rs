//! Transfer rules: the validation hook run before a transfer is recorded.
//!
//! Rules only ever reject. They see the transfer and the balances as they are
//! before the transfer, and run in order; the first failure wins and nothing
//! is recorded. Container-kind specific policies (capacity, allocation) plug
//! in here by implementing [`TransferRule`], without touching the journal or
//! balance logic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tally_core::{DomainError, DomainResult};

use crate::balance::BalanceTable;
use crate::transfer::Transfer;

/// A single precondition on recorded transfers.
pub trait TransferRule: core::fmt::Debug + Send + Sync {
    /// Short stable name, used in logs.
    fn name(&self) -> &'static str;

    fn check(&self, transfer: &Transfer, balances: &BalanceTable) -> DomainResult<()>;
}

/// Rejects transfers whose source and destination are the same container.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectSelfTransfer;

impl TransferRule for RejectSelfTransfer {
    fn name(&self) -> &'static str {
        "reject_self_transfer"
    }

    fn check(&self, transfer: &Transfer, _balances: &BalanceTable) -> DomainResult<()> {
        if transfer.is_self_transfer() {
            return Err(DomainError::validation(format!(
                "source and destination are both {}",
                transfer.from()
            )));
        }
        Ok(())
    }
}

/// Rejects zero and negative amounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequirePositiveAmount;

impl TransferRule for RequirePositiveAmount {
    fn name(&self) -> &'static str {
        "require_positive_amount"
    }

    fn check(&self, transfer: &Transfer, _balances: &BalanceTable) -> DomainResult<()> {
        if !transfer.amount().is_positive() {
            return Err(DomainError::validation(format!(
                "amount must be positive, got {}",
                transfer.amount()
            )));
        }
        Ok(())
    }
}

/// Named rule presets, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulePolicy {
    /// Accept every well-typed transfer.
    #[default]
    Permissive,
    /// Reject self-transfers and non-positive amounts.
    Strict,
}

impl core::fmt::Display for RulePolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RulePolicy::Permissive => f.write_str("permissive"),
            RulePolicy::Strict => f.write_str("strict"),
        }
    }
}

impl core::str::FromStr for RulePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(RulePolicy::Permissive),
            "strict" => Ok(RulePolicy::Strict),
            other => Err(DomainError::validation(format!(
                "unknown rule policy {other:?} (expected \"permissive\" or \"strict\")"
            ))),
        }
    }
}

/// Ordered set of rules a ledger applies to every transfer.
#[derive(Debug, Clone, Default)]
pub struct TransferRules {
    rules: Vec<Arc<dyn TransferRule>>,
}

impl TransferRules {
    /// No rules: every transfer is accepted.
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self::permissive()
            .with(RejectSelfTransfer)
            .with(RequirePositiveAmount)
    }

    pub fn from_policy(policy: RulePolicy) -> Self {
        match policy {
            RulePolicy::Permissive => Self::permissive(),
            RulePolicy::Strict => Self::strict(),
        }
    }

    /// Append a rule; it runs after the ones already present.
    pub fn with(mut self, rule: impl TransferRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn check(&self, transfer: &Transfer, balances: &BalanceTable) -> DomainResult<()> {
        for rule in &self.rules {
            rule.check(transfer, balances).inspect_err(|e| {
                tracing::warn!(rule = rule.name(), error = %e, "transfer rejected by rule");
            })?;
        }
        Ok(())
    }
}

impl From<RulePolicy> for TransferRules {
    fn from(policy: RulePolicy) -> Self {
        Self::from_policy(policy)
    }
}
