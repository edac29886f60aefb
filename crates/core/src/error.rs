//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, ledger-level failures (input parsing,
/// transfer rules, range limits, invariants). Process concerns such as I/O belong to the
/// binary that embeds the ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An amount could not be interpreted as a numeric quantity.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A transfer was rejected by a transfer rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A ledger invariant was violated (e.g. cached balances diverged from the journal).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A result would leave the representable quantity range.
    #[error("quantity overflow: {0}")]
    Overflow(String),

    /// A conflict occurred (e.g. stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::Overflow(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_their_kind() {
        assert_eq!(
            DomainError::invalid_amount("\"ten\"").to_string(),
            "invalid amount: \"ten\""
        );
        assert_eq!(
            DomainError::invariant("sum is 3").to_string(),
            "invariant violated: sum is 3"
        );
    }
}
