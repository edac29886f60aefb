//! Exact signed quantity of the tracked resource.
//!
//! Never use floating point for ledger arithmetic: conservation is checked by
//! summing balances to exactly zero. This type wraps `rust_decimal::Decimal`.

use core::ops::Neg;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// A signed amount of the tracked quantity (liters, units, slots...).
///
/// Unit-less by design: the ledger never converts between units, the caller
/// decides what one unit means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);
    /// Largest representable quantity.
    pub const MAX: Quantity = Quantity(Decimal::MAX);
    /// Smallest representable quantity.
    pub const MIN: Quantity = Quantity(Decimal::MIN);

    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Strictly less than zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// `None` when the sum leaves the representable range.
    #[must_use]
    pub fn checked_add(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` when the difference leaves the representable range.
    #[must_use]
    pub fn checked_sub(self, rhs: Quantity) -> Option<Quantity> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    #[must_use]
    pub fn saturating_add(self, rhs: Quantity) -> Quantity {
        Self(self.0.saturating_add(rhs.0))
    }

    #[must_use]
    pub fn saturating_sub(self, rhs: Quantity) -> Quantity {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Exact sum of `values`, or `None` if any partial sum overflows.
    pub fn checked_sum(values: impl IntoIterator<Item = Quantity>) -> Option<Quantity> {
        values
            .into_iter()
            .try_fold(Quantity::ZERO, Quantity::checked_add)
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Boundary parser: untyped text becomes a `Quantity` or an `InvalidAmount`.
///
/// Surrounding whitespace is ignored; anything else that is not a plain
/// decimal number (empty input, words, `NaN`, exponents) is rejected. So is
/// any number that would need rounding to fit, either because it has more
/// than 28 fractional digits or more significant digits than a `Decimal`
/// holds.
impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_amount("amount is empty"));
        }
        Decimal::from_str_exact(trimmed).map(Self).map_err(|e| {
            DomainError::invalid_amount(format!("{trimmed:?} is not an exact quantity ({e})"))
        })
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

// Subtract from zero rather than flipping the sign bit, so negating zero never
// yields a "-0" when displayed. The decimal range is symmetric, so this never
// overflows.
impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity(Decimal::ZERO - self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_integers_and_decimals() {
        assert_eq!("100".parse::<Quantity>().unwrap(), Quantity::from(100));
        assert_eq!(" 12.5 ".parse::<Quantity>().unwrap(), Quantity::new(dec!(12.5)));
        assert_eq!("-7".parse::<Quantity>().unwrap(), Quantity::from(-7));
    }

    #[test]
    fn rejects_non_numeric_input() {
        for raw in ["", "   ", "ten", "12abc", "NaN", "1e3", "--5", "79228162514264337593543950336"] {
            let err = raw.parse::<Quantity>().unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidAmount(_)),
                "{raw:?} should be an invalid amount, got {err:?}"
            );
        }
    }

    #[test]
    fn rejects_input_that_would_be_rounded() {
        for raw in [
            "0.00000000000000000000000000001",
            "1.000000000000000000000000000009",
            "-0.00000000000000000000000000001",
        ] {
            let err = raw.parse::<Quantity>().unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidAmount(_)),
                "{raw:?} should be rejected as too precise, got {err:?}"
            );
        }
    }

    #[test]
    fn accepts_the_extremes_exactly() {
        assert_eq!("79228162514264337593543950335".parse::<Quantity>().unwrap(), Quantity::MAX);
        assert_eq!("-79228162514264337593543950335".parse::<Quantity>().unwrap(), Quantity::MIN);
        assert_eq!(
            "0.0000000000000000000000000001".parse::<Quantity>().unwrap(),
            Quantity::new(Decimal::new(1, 28))
        );
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(Quantity::MAX.checked_add(Quantity::from(1)), None);
        assert_eq!(Quantity::MIN.checked_sub(Quantity::from(1)), None);
        assert_eq!(Quantity::from(2).checked_sub(Quantity::from(5)), Some(Quantity::from(-3)));
        assert_eq!(Quantity::MAX.saturating_add(Quantity::MAX), Quantity::MAX);
        assert_eq!(Quantity::MIN.saturating_sub(Quantity::MAX), Quantity::MIN);
        assert_eq!(-Quantity::MAX, Quantity::MIN);
    }

    #[test]
    fn checked_sum_fails_on_any_overflowing_prefix() {
        assert_eq!(Quantity::checked_sum([Quantity::MAX, Quantity::MAX, Quantity::MIN]), None);
        assert_eq!(
            Quantity::checked_sum([Quantity::MAX, Quantity::MIN, Quantity::MAX]),
            Some(Quantity::MAX)
        );
        assert_eq!(Quantity::checked_sum([]), Some(Quantity::ZERO));
    }

    #[test]
    fn equal_by_value_regardless_of_scale() {
        assert_eq!(Quantity::new(dec!(12.5)), Quantity::new(dec!(12.50)));
    }

    #[test]
    fn negating_zero_displays_plain_zero() {
        assert_eq!((-Quantity::ZERO).to_string(), "0");
        assert_eq!((-Quantity::from(5)).to_string(), "-5");
    }

    #[test]
    fn sign_predicates() {
        assert!(Quantity::from(1).is_positive());
        assert!(Quantity::from(-1).is_negative());
        assert!(!Quantity::ZERO.is_positive());
        assert!(!Quantity::ZERO.is_negative());
    }

    proptest! {
        #[test]
        fn sum_of_value_and_its_negation_is_zero(raw in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..6) {
            let q = Quantity::new(Decimal::new(raw, scale));
            prop_assert_eq!(q.checked_add(-q), Some(Quantity::ZERO));
        }
    }
}
