//! Decimal money amounts.
//!
//! All arithmetic on prices, line totals and balances goes through [`Money`],
//! which wraps a [`Decimal`] so that `0.1 + 0.2` stays `0.3`. Amounts are kept
//! at full precision and rounded to cents only for display and comparison.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A money amount in the store's currency.
///
/// The currency itself is a deployment setting (one store, one currency), so
/// only the amount is carried here. Serializes as a decimal string
/// (`"12.50"`); deserializes from either a JSON string or number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from minor units (e.g. pesewas or cents).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// Parse user input leniently.
    ///
    /// Surrounding whitespace and thousands separators are ignored. Anything
    /// that still does not parse yields zero.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Self {
        let cleaned: String = input
            .trim()
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        Decimal::from_str(&cleaned).map_or(Self::ZERO, Self)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The amount rounded half away from zero to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Clamp negative amounts to zero.
    #[must_use]
    pub fn non_negative(self) -> Self {
        if self.is_negative() { Self::ZERO } else { self }
    }

    /// Format with two decimals and thousands separators, e.g. `1,234.50`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.rounded().0.abs();
        let text = format!("{rounded:.2}");
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.rounded().is_negative() { "-" } else { "" };
        format!("{sign}{grouped}.{frac}")
    }

    /// Format with a currency symbol prefix, e.g. `GH₵ 1,234.50`.
    #[must_use]
    pub fn with_symbol(&self, symbol: &str) -> String {
        if symbol.is_empty() {
            self.display()
        } else {
            format!("{symbol} {}", self.display())
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded().0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient() {
        assert_eq!(Money::parse_lenient("1,250.50"), Money::from_minor(125_050));
        assert_eq!(Money::parse_lenient("  42 "), Money::from_minor(4200));
        assert_eq!(Money::parse_lenient("abc"), Money::ZERO);
        assert_eq!(Money::parse_lenient(""), Money::ZERO);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_minor(123_456_789).display(), "1,234,567.89");
        assert_eq!(Money::from_minor(99).display(), "0.99");
        assert_eq!(Money::from_minor(-150_000).display(), "-1,500.00");
        assert_eq!(Money::from_minor(100_000).with_symbol("GH₵"), "GH₵ 1,000.00");
    }

    #[test]
    fn test_decimal_addition_is_exact() {
        let a = Money::parse_lenient("0.1");
        let b = Money::parse_lenient("0.2");
        assert_eq!(a + b, Money::parse_lenient("0.3"));
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Money = serde_json::from_str("19.99").unwrap();
        let from_string: Money = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_string(&from_string).unwrap(), "\"19.99\"");
    }

    #[test]
    fn test_non_negative_clamps() {
        assert_eq!(Money::from_minor(-5).non_negative(), Money::ZERO);
        assert_eq!(Money::from_minor(5).non_negative(), Money::from_minor(5));
    }
}
