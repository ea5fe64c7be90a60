//! Fixed-point currency amounts stored at minor-unit precision.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{prelude::FromPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of decimal places every [`Money`] value is normalised to.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Signed currency amount backed by a decimal, never by binary floating point.
///
/// Construction always rounds to [`MINOR_UNIT_SCALE`] places (midpoint away from
/// zero), so two values that display the same compare equal.
///
/// The operators saturate at the decimal range instead of panicking. Paths that
/// persist a result use [`Money::checked_add`] and [`Money::checked_sub`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(MINOR_UNIT_SCALE);
        Money(rounded)
    }

    /// Builds an amount from an integer count of minor units (cents).
    pub fn from_minor(units: i64) -> Self {
        Self::new(Decimal::new(units, MINOR_UNIT_SCALE))
    }

    /// Builds an amount from a whole number of major units.
    pub fn from_major(units: i64) -> Self {
        Self::new(Decimal::from(units))
    }

    /// Converts a user-entered float, rejecting NaN and infinities.
    pub fn try_from_f64(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        Decimal::from_f64(value)
            .map(Self::new)
            .ok_or(AmountError::OutOfRange)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns `self` when strictly positive, otherwise an [`AmountError`].
    pub fn ensure_positive(self) -> Result<Self, AmountError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(AmountError::NotPositive(self))
        }
    }

    pub fn checked_add(self, rhs: Money) -> Result<Self, AmountError> {
        self.0
            .checked_add(rhs.0)
            .map(Self::new)
            .ok_or(AmountError::OutOfRange)
    }

    pub fn checked_sub(self, rhs: Money) -> Result<Self, AmountError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self::new)
            .ok_or(AmountError::OutOfRange)
    }

    /// Applies a percentage adjustment: `self * (1 + pct / 100)`, saturating.
    pub fn adjust_by_percent(&self, pct: Decimal) -> Self {
        let factor = Decimal::ONE.saturating_add(pct / Decimal::ONE_HUNDRED);
        Self::new(self.0.saturating_mul(factor))
    }

    /// Share of `total` represented by `self`, in percent. Zero when `total` is zero.
    pub fn percent_of(&self, total: Money) -> Decimal {
        if total.is_zero() {
            return Decimal::ZERO;
        }
        self.0
            .checked_div(total.0)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(if self.is_negative() == total.is_negative() {
                Decimal::MAX
            } else {
                Decimal::MIN
            })
    }

    /// Splits the amount evenly into `parts` portions, rounding to minor units.
    pub fn divide(&self, parts: u32) -> Self {
        if parts == 0 {
            return *self;
        }
        Self::new(self.0 / Decimal::from(parts))
    }

    pub fn multiply(&self, factor: i64) -> Self {
        Self::new(self.0.saturating_mul(Decimal::from(factor)))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl FromStr for Money {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money::new)
            .map_err(|_| AmountError::Unparseable(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer).map(Money::new)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::new(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// Reasons an amount is rejected before it can reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    NotFinite,
    NotPositive(Money),
    OutOfRange,
    Unparseable(String),
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::NotFinite => f.write_str("amount must be a finite number"),
            AmountError::NotPositive(value) => {
                write!(f, "amount must be greater than zero (got {value})")
            }
            AmountError::OutOfRange => f.write_str("amount is out of range"),
            AmountError::Unparseable(raw) => write!(f, "`{raw}` is not a valid amount"),
        }
    }
}

impl std::error::Error for AmountError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_to_minor_units() {
        let value = Money::new(Decimal::new(23655, 3));
        assert_eq!(value.to_string(), "23.66");
        assert_eq!(Money::from_major(5000).to_string(), "5000.00");
    }

    #[test]
    fn float_inputs_do_not_accumulate_error() {
        let total: Money = [0.1, 0.2]
            .iter()
            .map(|v| Money::try_from_f64(*v).unwrap())
            .sum();
        assert_eq!(total, Money::from_minor(30));
    }

    #[test]
    fn rejects_non_finite_floats() {
        assert_eq!(Money::try_from_f64(f64::NAN), Err(AmountError::NotFinite));
        assert_eq!(
            Money::try_from_f64(f64::INFINITY),
            Err(AmountError::NotFinite)
        );
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(Money::ZERO.ensure_positive().is_err());
        assert!(Money::from_major(-5).ensure_positive().is_err());
        assert!(Money::from_minor(1).ensure_positive().is_ok());
    }

    #[test]
    fn percentage_adjustment_can_eliminate_amount() {
        let groceries = Money::from_minor(23650);
        assert_eq!(
            groceries.adjust_by_percent(Decimal::from(-100)),
            Money::ZERO
        );
        assert_eq!(
            groceries.adjust_by_percent(Decimal::from(50)),
            Money::from_minor(35475)
        );
    }

    #[test]
    fn deserializes_from_numbers_and_strings() {
        let from_number: Money = serde_json::from_str("236.5").unwrap();
        let from_string: Money = serde_json::from_str("\"236.50\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"236.50\"");
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max.checked_add(Money::from_major(1)), Err(AmountError::OutOfRange));
        assert_eq!(
            Money::new(Decimal::MIN).checked_sub(Money::from_major(1)),
            Err(AmountError::OutOfRange)
        );
        assert_eq!(
            Money::from_major(10).checked_sub(Money::from_major(25)),
            Ok(Money::from_major(-15))
        );
    }

    #[test]
    fn operators_saturate_instead_of_panicking() {
        let max = Money::new(Decimal::MAX);
        assert_eq!(max + max, max);
        assert_eq!(max.multiply(12), max);
        let huge_pct = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        assert_eq!(Money::from_major(5000).adjust_by_percent(huge_pct), max);
        assert_eq!(max.percent_of(Money::from_minor(1)), Decimal::MAX);
    }
}
