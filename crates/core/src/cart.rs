//! Per-session POS cart.
//!
//! The cart maps a product ID to one line, kept in the order products were
//! first added. Line totals are derived from price and quantity on every
//! mutation, so `total == price * quantity` holds for every line at all
//! times, and a line whose quantity reaches zero is removed rather than kept
//! at zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Product;
use crate::types::{Money, ProductId};

/// Cart mutation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// More units requested than are on hand.
    #[error("Insufficient stock: only {available} available")]
    InsufficientStock {
        /// Units on hand.
        available: u32,
    },

    /// Adding zero units is meaningless.
    #[error("Quantity must be at least 1")]
    ZeroQuantity,
}

/// What the cart needs to know about a product to add it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub available_stock: u32,
}

impl From<&Product> for CatalogEntry {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            available_stock: product.stock,
        }
    }
}

/// One cart line.
///
/// `quantity` and `total` are private so they can only change together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    quantity: u32,
    total: Money,
    pub available_stock: u32,
}

impl CartItem {
    fn new(entry: &CatalogEntry, quantity: u32) -> Self {
        Self {
            product_id: entry.product_id,
            name: entry.name.clone(),
            price: entry.price,
            quantity,
            total: entry.price * quantity,
            available_stock: entry.available_stock,
        }
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total = self.price * quantity;
    }

    /// Units of this product in the cart.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `price * quantity`.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}

/// The cart held in the session.
///
/// Stored as a list rather than a keyed map so it serializes to plain JSON
/// in the session; carts are a handful of lines, so lookups are linear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.product_id == product_id)
    }

    /// Add `quantity` units, merging with an existing line.
    ///
    /// The stock snapshot on the line is refreshed from `entry`.
    ///
    /// # Errors
    ///
    /// [`CartError::ZeroQuantity`] for zero units, or
    /// [`CartError::InsufficientStock`] if the resulting quantity exceeds
    /// the available stock. The cart is unchanged on error.
    pub fn add(&mut self, entry: &CatalogEntry, quantity: u32) -> Result<&CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let index = self.position(entry.product_id);
        let existing = index
            .and_then(|i| self.items.get(i))
            .map_or(0, CartItem::quantity);
        let wanted = existing.saturating_add(quantity);
        if wanted > entry.available_stock {
            return Err(CartError::InsufficientStock {
                available: entry.available_stock,
            });
        }

        let index = index.unwrap_or_else(|| {
            self.items.push(CartItem::new(entry, 0));
            self.items.len() - 1
        });
        let item = self
            .items
            .get_mut(index)
            .ok_or(CartError::NotInCart(entry.product_id))?;
        item.name.clone_from(&entry.name);
        item.price = entry.price;
        item.available_stock = entry.available_stock;
        item.set_quantity(wanted);
        Ok(item)
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// Returns the updated line, or `None` if it was removed.
    ///
    /// # Errors
    ///
    /// [`CartError::NotInCart`] if the product has no line, or
    /// [`CartError::InsufficientStock`] if `quantity` exceeds the line's
    /// stock snapshot.
    pub fn update(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Option<&CartItem>, CartError> {
        if quantity == 0 {
            self.remove(product_id)?;
            return Ok(None);
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        if quantity > item.available_stock {
            return Err(CartError::InsufficientStock {
                available: item.available_stock,
            });
        }
        item.set_quantity(quantity);
        Ok(Some(item))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// [`CartError::NotInCart`] if the product has no line.
    pub fn remove(&mut self, product_id: ProductId) -> Result<CartItem, CartError> {
        let index = self
            .position(product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        Ok(self.items.remove(index))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Lines in the order they were first added.
    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter()
    }

    /// Look up one line.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(CartItem::quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::total).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(id: i64, price_minor: i64, stock: u32) -> CatalogEntry {
        CatalogEntry {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::from_minor(price_minor),
            available_stock: stock,
        }
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::default();
        cart.add(&entry(1, 1999, 10), 2).unwrap();
        let line = cart.add(&entry(1, 1999, 10), 3).unwrap();
        assert_eq!(line.quantity(), 5);
        assert_eq!(line.total(), Money::from_minor(9995));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_update_keeps_total_invariant() {
        let mut cart = Cart::default();
        cart.add(&entry(1, 333, 10), 1).unwrap();
        let line = cart.update(ProductId::new(1), 7).unwrap().unwrap();
        assert_eq!(line.total(), line.price * 7);
        assert_eq!(line.total().to_string(), "23.31");
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add(&entry(1, 500, 10), 2).unwrap();
        cart.add(&entry(2, 700, 10), 1).unwrap();
        assert!(cart.update(ProductId::new(1), 0).unwrap().is_none());
        assert!(cart.get(ProductId::new(1)).is_none());
        assert_eq!(cart.items().count(), 1);
    }

    #[test]
    fn test_stock_limits_leave_cart_unchanged() {
        let mut cart = Cart::default();
        cart.add(&entry(1, 500, 3), 2).unwrap();
        assert_eq!(
            cart.add(&entry(1, 500, 3), 2),
            Err(CartError::InsufficientStock { available: 3 })
        );
        assert_eq!(
            cart.update(ProductId::new(1), 4),
            Err(CartError::InsufficientStock { available: 3 })
        );
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity(), 2);
    }

    #[test]
    fn test_missing_lines_and_zero_adds() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.remove(ProductId::new(9)),
            Err(CartError::NotInCart(ProductId::new(9)))
        );
        assert_eq!(
            cart.update(ProductId::new(9), 1),
            Err(CartError::NotInCart(ProductId::new(9)))
        );
        assert_eq!(cart.add(&entry(1, 500, 3), 0), Err(CartError::ZeroQuantity));
    }

    #[test]
    fn test_subtotal_and_clear() {
        let mut cart = Cart::default();
        cart.add(&entry(1, 1000, 5), 2).unwrap();
        cart.add(&entry(2, 250, 5), 4).unwrap();
        assert_eq!(cart.subtotal(), Money::from_minor(3000));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::ZERO);
    }

    #[test]
    fn test_session_serialization_round_trip() {
        let mut cart = Cart::default();
        cart.add(&entry(3, 1250, 5), 2).unwrap();
        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }
}
