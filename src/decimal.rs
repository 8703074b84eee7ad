use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// days per year used for daily interest rates (mean gregorian year)
pub const DAYS_PER_YEAR: Decimal = dec!(365.2425);

/// Money type with 8 decimal places of internal precision
///
/// amounts handed to the ledger collaborator are additionally rounded to
/// the product's minor currency unit digits, half-even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(8))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(8)))
    }

    /// create from integer amount (dollars, euros, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents etc)
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        let d = Decimal::from(amount) / Decimal::from(10_u64.pow(scale));
        Money(d.round_dp(8))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// round to the product's minor currency unit digits, half-even
    pub fn round_minor_units(&self, digits: u32) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(digits, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// check if positive
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// check if negative
    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }

    /// absolute value
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// minimum of two values
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// calculate percentage (e.g., 5% of 100)
    pub fn percentage(&self, rate: Decimal) -> Self {
        Money((self.0 * rate / Decimal::from(100)).round_dp(8))
    }

    /// apply a fractional rate (e.g., a compounded period rate)
    pub fn apply_rate(&self, rate: Rate) -> Self {
        Money((self.0 * rate.as_decimal()).round_dp(8))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(8))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(8);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(8))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(8);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(8))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(8))
    }
}

/// rate type for interest rates, percentages, and ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// create from decimal (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 5 for 5%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// create from basis points (e.g., 500 for 5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    /// get as decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percentage
    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }

    /// get as basis points
    pub fn as_bps(&self) -> Decimal {
        self.0 * Decimal::from(10000)
    }

    /// daily rate from annual rate over the mean gregorian year,
    /// half-even at the requested precision
    pub fn daily_rate(&self, precision: u32) -> Rate {
        Rate((self.0 / DAYS_PER_YEAR)
            .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven))
    }

    /// effective rate over a run of days: (1 + r)^days - 1
    ///
    /// a zero rate yields an exact zero at the requested precision, never
    /// a rounding artifact.
    pub fn compounded_over_days(&self, days: u32, precision: u32) -> Rate {
        if self.0.is_zero() {
            return Rate(Decimal::new(0, precision));
        }
        let mut factor = Decimal::ONE;
        let base = Decimal::ONE + self.0;
        for _ in 0..days {
            factor *= base;
        }
        Rate((factor - Decimal::ONE)
            .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679"); // rounded to 8 places
    }

    #[test]
    fn test_minor_unit_rounding_is_half_even() {
        assert_eq!(
            Money::from_str_exact("2.125").unwrap().round_minor_units(2),
            Money::from_str_exact("2.12").unwrap()
        );
        assert_eq!(
            Money::from_str_exact("2.135").unwrap().round_minor_units(2),
            Money::from_str_exact("2.14").unwrap()
        );
    }

    #[test]
    fn test_daily_rate_uses_mean_gregorian_year() {
        let annual = Rate::from_percentage(10);
        let daily = annual.daily_rate(20);
        let expected = (dec!(0.10) / dec!(365.2425))
            .round_dp_with_strategy(20, RoundingStrategy::MidpointNearestEven);
        assert_eq!(daily.as_decimal(), expected);
    }

    #[test]
    fn test_zero_rate_compounds_to_exact_zero() {
        let compounded = Rate::ZERO.compounded_over_days(30, 10);
        assert!(compounded.as_decimal().is_zero());
        assert_eq!(compounded.as_decimal().scale(), 10);
    }

    #[test]
    fn test_compounding_is_multiplicative() {
        let daily = Rate::from_decimal(dec!(0.001));
        let three_days = daily.compounded_over_days(3, 12);
        // (1.001)^3 - 1 = 0.003003001
        assert_eq!(three_days.as_decimal(), dec!(0.003003001));
        assert!(three_days.as_decimal() > dec!(0.003));
    }

    #[test]
    fn test_signed_money_predicates() {
        let credit = Money::from_major(-10);
        assert!(credit.is_negative());
        assert!(!credit.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert!(!Money::ZERO.is_positive());
        assert_eq!(-credit, Money::from_major(10));
    }
}
