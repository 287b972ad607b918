//! Products sold at the POS.

use serde::{Deserialize, Serialize};

use super::Extra;
use crate::catalog::Listable;
use crate::types::{Money, ProductId};

/// A product as returned by `GET /api/pos/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, alias = "brand_name")]
    pub brand: Option<String>,
    #[serde(default, alias = "category_name")]
    pub category: Option<String>,
    #[serde(alias = "selling_price")]
    pub price: Money,
    /// Units on hand.
    #[serde(default, alias = "quantity")]
    pub stock: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Product {
    /// Whether at least one unit is on hand.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Listable for Product {
    fn name(&self) -> &str {
        &self.name
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.brand.as_deref());
        fields
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    fn price(&self) -> Option<Money> {
        Some(self.price)
    }

    fn stock(&self) -> Option<u32> {
        Some(self.stock)
    }

    fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}
