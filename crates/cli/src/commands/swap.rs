//! Swap balance check.
//!
//! ```bash
//! sellapp-cli swap-balance --price 500 --customer-value 300 --topup 50
//! # Balance: -150.00 (Shortfall: Increase customer value or top-up)
//! ```

use sellapp_core::swap::{BalanceReport, SwapBalance};

/// Print the balance and its classification.
#[allow(clippy::print_stdout)]
pub fn balance(price: &str, customer_value: &str, topup: &str) {
    println!("{}", describe(&SwapBalance::from_inputs(price, customer_value, topup)));
}

fn describe(balance: &SwapBalance) -> String {
    let report = BalanceReport::from(balance);
    format!(
        "Balance: {} ({:?}: {})",
        report.balance, report.status, report.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_worked_examples() {
        assert_eq!(
            describe(&SwapBalance::from_inputs("500", "450", "50")),
            "Balance: 0.00 (Balanced: Balanced)"
        );
        assert_eq!(
            describe(&SwapBalance::from_inputs("500", "300", "50")),
            "Balance: -150.00 (Shortfall: Increase customer value or top-up)"
        );
        assert_eq!(
            describe(&SwapBalance::from_inputs("500", "abc", "600")),
            "Balance: 100.00 (Overpayment: Overpayment, adjust values)"
        );
    }
}
