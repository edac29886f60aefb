use core::borrow::Borrow;

use serde::{Deserialize, Serialize};

use tally_core::{Quantity, ValueObject};

/// Name of a container (tank, bin, pool...).
///
/// There is no registration step: a container exists from the first transfer
/// that names it. Ordering is lexicographic on the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ContainerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&ContainerId> for ContainerId {
    fn from(value: &ContainerId) -> Self {
        value.clone()
    }
}

impl Borrow<str> for ContainerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One movement of quantity from `from` to `to` (immutable).
///
/// No checks happen here: self-transfers and negative amounts are valid
/// values. Whether a ledger accepts them is decided by its transfer rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    description: String,
    from: ContainerId,
    to: ContainerId,
    amount: Quantity,
}

impl Transfer {
    pub fn new(
        description: impl Into<String>,
        from: impl Into<ContainerId>,
        to: impl Into<ContainerId>,
        amount: Quantity,
    ) -> Self {
        Self {
            description: description.into(),
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn from(&self) -> &ContainerId {
        &self.from
    }

    pub fn to(&self) -> &ContainerId {
        &self.to
    }

    pub fn amount(&self) -> Quantity {
        self.amount
    }

    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }

    /// Net effect of this transfer on `account` (zero if not involved).
    pub fn delta_for(&self, account: &str) -> Quantity {
        match (self.from.as_str() == account, self.to.as_str() == account) {
            (true, false) => -self.amount,
            (false, true) => self.amount,
            _ => Quantity::ZERO,
        }
    }
}

impl ValueObject for Transfer {}
