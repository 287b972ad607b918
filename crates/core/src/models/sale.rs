//! Sale completion payloads.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{CustomerId, Money, ProductId};

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    MobileMoney,
    BankTransfer,
}

/// One line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
    pub total: Money,
}

/// Body of `POST /api/pos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub items: Vec<SaleLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    #[serde(default)]
    pub discount: Money,
    pub total: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SaleRequest {
    /// Build a sale from the cart.
    ///
    /// The discount is clamped to the subtotal so the total never goes
    /// negative. Returns `None` for an empty cart.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        customer_id: Option<CustomerId>,
        payment_method: PaymentMethod,
        discount: Money,
        amount_paid: Option<Money>,
    ) -> Option<Self> {
        if cart.is_empty() {
            return None;
        }

        let items = cart
            .items()
            .map(|item| SaleLine {
                product_id: item.product_id,
                quantity: item.quantity(),
                price: item.price,
                total: item.total(),
            })
            .collect();
        let subtotal = cart.subtotal();
        let discount = discount.non_negative().min(subtotal);

        Some(Self {
            items,
            customer_id,
            payment_method,
            subtotal,
            discount,
            total: subtotal - discount,
            amount_paid,
            notes: None,
        })
    }

    /// Change due to the customer, if they paid more than the total.
    #[must_use]
    pub fn change_due(&self) -> Money {
        self.amount_paid
            .map_or(Money::ZERO, |paid| (paid - self.total).non_negative())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CatalogEntry;

    fn cart() -> Cart {
        let mut cart = Cart::default();
        cart.add(
            &CatalogEntry {
                product_id: ProductId::new(1),
                name: "Tecno Spark 20".to_string(),
                price: Money::from_minor(150_000),
                available_stock: 5,
            },
            2,
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_from_cart_totals() {
        let sale = SaleRequest::from_cart(
            &cart(),
            None,
            PaymentMethod::MobileMoney,
            Money::from_minor(10_000),
            Some(Money::from_minor(300_000)),
        )
        .unwrap();
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.subtotal, Money::from_minor(300_000));
        assert_eq!(sale.total, Money::from_minor(290_000));
        assert_eq!(sale.change_due(), Money::from_minor(10_000));
    }

    #[test]
    fn test_discount_is_clamped() {
        let sale = SaleRequest::from_cart(
            &cart(),
            None,
            PaymentMethod::Cash,
            Money::from_minor(999_999_999),
            None,
        )
        .unwrap();
        assert_eq!(sale.total, Money::ZERO);
    }

    #[test]
    fn test_empty_cart_builds_nothing() {
        assert!(
            SaleRequest::from_cart(&Cart::default(), None, PaymentMethod::Cash, Money::ZERO, None)
                .is_none()
        );
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::MobileMoney).unwrap(),
            "\"mobile_money\""
        );
    }
}
