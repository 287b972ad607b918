//! Swap transaction payloads.

use serde::{Deserialize, Serialize};

use crate::swap::SwapBalance;
use crate::types::{CustomerId, Money, ProductId};

/// The device the customer hands over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDevice {
    pub brand: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Body of `POST /api/swaps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub customer_id: CustomerId,
    pub company_product_id: ProductId,
    pub company_price: Money,
    pub customer_device: CustomerDevice,
    pub customer_value: Money,
    pub topup: Money,
    pub balance: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SwapRequest {
    /// Assemble a request from a computed balance.
    #[must_use]
    pub fn new(
        customer_id: CustomerId,
        company_product_id: ProductId,
        customer_device: CustomerDevice,
        balance: &SwapBalance,
        notes: Option<String>,
    ) -> Self {
        Self {
            customer_id,
            company_product_id,
            company_price: balance.company_price,
            customer_device,
            customer_value: balance.customer_value,
            topup: balance.topup,
            balance: balance.balance,
            notes,
        }
    }
}
