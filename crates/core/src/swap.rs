//! Swap balance calculation.
//!
//! In a swap the customer hands over a device (valued by staff) plus an
//! optional cash top-up in exchange for a store product:
//!
//! ```text
//! balance = (customer_value + topup) - company_price
//! ```
//!
//! A swap can go through only when the balance is within one cent of zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Balances with an absolute value below this are treated as zero.
pub const BALANCE_TOLERANCE: Money = Money::new(Decimal::from_parts(1, 0, 0, false, 2));

/// Outcome of a balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    /// `|balance| < 0.01`.
    Balanced,
    /// The customer is giving more than the product is worth.
    Overpayment,
    /// The customer is giving less than the product is worth.
    Shortfall,
}

impl BalanceStatus {
    /// Message shown next to the balance.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Overpayment => "Overpayment, adjust values",
            Self::Shortfall => "Increase customer value or top-up",
        }
    }

    /// CSS class used by the swap page.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Balanced => "text-green-600",
            Self::Overpayment => "text-amber-600",
            Self::Shortfall => "text-red-600",
        }
    }
}

/// A computed swap balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapBalance {
    pub company_price: Money,
    pub customer_value: Money,
    pub topup: Money,
    pub balance: Money,
}

impl SwapBalance {
    /// Compute the balance. Negative inputs are clamped to zero.
    #[must_use]
    pub fn calculate(company_price: Money, customer_value: Money, topup: Money) -> Self {
        let company_price = company_price.non_negative();
        let customer_value = customer_value.non_negative();
        let topup = topup.non_negative();

        Self {
            company_price,
            customer_value,
            topup,
            balance: (customer_value + topup) - company_price,
        }
    }

    /// Compute the balance from raw form text; unparsable fields count as 0.
    #[must_use]
    pub fn from_inputs(company_price: &str, customer_value: &str, topup: &str) -> Self {
        Self::calculate(
            Money::parse_lenient(company_price),
            Money::parse_lenient(customer_value),
            Money::parse_lenient(topup),
        )
    }

    /// Classify the balance.
    #[must_use]
    pub fn status(&self) -> BalanceStatus {
        if self.balance.abs() < BALANCE_TOLERANCE {
            BalanceStatus::Balanced
        } else if self.balance.is_negative() {
            BalanceStatus::Shortfall
        } else {
            BalanceStatus::Overpayment
        }
    }

    /// `abs(balance)` to two decimal places, as displayed.
    #[must_use]
    pub fn display_amount(&self) -> String {
        self.balance.abs().to_string()
    }

    /// Whether checkout is allowed.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.status() == BalanceStatus::Balanced
    }
}

/// JSON shape returned by `POST /api/swap/balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub balance: Money,
    pub display_amount: String,
    pub status: BalanceStatus,
    pub message: String,
    /// Text colour class for the balance readout.
    pub css_class: String,
}

impl From<&SwapBalance> for BalanceReport {
    fn from(balance: &SwapBalance) -> Self {
        let status = balance.status();
        Self {
            balance: balance.balance.rounded(),
            display_amount: balance.display_amount(),
            status,
            message: status.message().to_string(),
            css_class: status.css_class().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::parse_lenient(s)
    }

    #[test]
    fn test_balanced_example() {
        let b = SwapBalance::from_inputs("500", "450", "50");
        assert_eq!(b.balance, Money::ZERO);
        assert_eq!(b.status(), BalanceStatus::Balanced);
        assert_eq!(b.display_amount(), "0.00");
        assert_eq!(b.status().message(), "Balanced");
    }

    #[test]
    fn test_shortfall_example() {
        let b = SwapBalance::from_inputs("500", "300", "50");
        assert_eq!(b.balance, money("-150"));
        assert_eq!(b.status(), BalanceStatus::Shortfall);
        assert_eq!(b.display_amount(), "150.00");
        assert_eq!(b.status().message(), "Increase customer value or top-up");
    }

    #[test]
    fn test_overpayment() {
        let b = SwapBalance::from_inputs("500", "520", "0");
        assert_eq!(b.status(), BalanceStatus::Overpayment);
        assert_eq!(b.display_amount(), "20.00");
        assert_eq!(b.status().message(), "Overpayment, adjust values");
    }

    #[test]
    fn test_tolerance_boundary() {
        assert_eq!(
            SwapBalance::from_inputs("100", "100.009", "").status(),
            BalanceStatus::Balanced
        );
        assert_eq!(
            SwapBalance::from_inputs("100", "100.01", "").status(),
            BalanceStatus::Overpayment
        );
        assert_eq!(
            SwapBalance::from_inputs("100.01", "100", "").status(),
            BalanceStatus::Shortfall
        );
    }

    #[test]
    fn test_unparsable_and_negative_inputs_count_as_zero() {
        let b = SwapBalance::from_inputs("abc", "-40", "");
        assert_eq!(b.company_price, Money::ZERO);
        assert_eq!(b.customer_value, Money::ZERO);
        assert!(b.is_balanced());
    }

    #[test]
    fn test_formula_holds_over_a_grid() {
        for price in [0_i64, 1, 999, 50_000] {
            for value in [0_i64, 7, 49_950] {
                for topup in [0_i64, 50, 1_000] {
                    let b = SwapBalance::calculate(
                        Money::from_minor(price),
                        Money::from_minor(value),
                        Money::from_minor(topup),
                    );
                    assert_eq!(b.balance, Money::from_minor(value + topup - price));
                }
            }
        }
    }

    #[test]
    fn test_report_rounds_balance() {
        let report = BalanceReport::from(&SwapBalance::from_inputs("10", "10.555", "0"));
        assert_eq!(report.balance, money("0.56"));
        assert_eq!(report.status, BalanceStatus::Overpayment);
        assert_eq!(report.css_class, "text-amber-600");
    }
}
