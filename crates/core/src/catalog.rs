//! Filtering and sorting of page-sized lists.
//!
//! Product and customer lists are small, so every change is a linear scan
//! followed by a stable sort. Anything implementing [`Listable`] can be
//! filtered.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// A record that can be searched and sorted in a list view.
pub trait Listable {
    /// Display name, used for name sorting.
    fn name(&self) -> &str;

    /// Fields matched by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    fn category(&self) -> Option<&str> {
        None
    }

    fn brand(&self) -> Option<&str> {
        None
    }

    fn price(&self) -> Option<Money> {
        None
    }

    fn stock(&self) -> Option<u32> {
        None
    }

    /// Creation timestamp as an ISO-8601 string.
    fn created_at(&self) -> Option<&str> {
        None
    }
}

/// Sort orders accepted in the `sort` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    StockAsc,
    StockDesc,
    Newest,
}

impl SortOrder {
    /// All orders, for building dropdowns.
    pub const ALL: [Self; 7] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::StockAsc,
        Self::StockDesc,
        Self::Newest,
    ];

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::StockAsc => "stock_asc",
            Self::StockDesc => "stock_desc",
            Self::Newest => "newest",
        }
    }

    /// Dropdown label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
            Self::PriceAsc => "Price (low to high)",
            Self::PriceDesc => "Price (high to low)",
            Self::StockAsc => "Stock (low to high)",
            Self::StockDesc => "Stock (high to low)",
            Self::Newest => "Newest first",
        }
    }

    /// Parse a query value, falling back to [`SortOrder::NameAsc`].
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    fn compare<T: Listable>(self, a: &T, b: &T) -> Ordering {
        match self {
            Self::NameAsc => cmp_names(a, b),
            Self::NameDesc => cmp_names(b, a),
            Self::PriceAsc => a.price().cmp(&b.price()),
            Self::PriceDesc => b.price().cmp(&a.price()),
            Self::StockAsc => a.stock().cmp(&b.stock()),
            Self::StockDesc => b.stock().cmp(&a.stock()),
            // Undated records sort last.
            Self::Newest => match (a.created_at(), b.created_at()) {
                (Some(x), Some(y)) => y.cmp(x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

fn cmp_names<T: Listable>(a: &T, b: &T) -> Ordering {
    a.name().to_lowercase().cmp(&b.name().to_lowercase())
}

/// Filter and sort parameters for a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, alias = "q")]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl ListQuery {
    /// Build from raw query-string values.
    #[must_use]
    pub fn from_params(
        search: Option<&str>,
        category: Option<&str>,
        brand: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        Self {
            search: non_blank(search),
            category: non_blank(category).filter(|c| !c.eq_ignore_ascii_case("all")),
            brand: non_blank(brand).filter(|b| !b.eq_ignore_ascii_case("all")),
            sort: SortOrder::parse_or_default(sort),
        }
    }

    /// Whether `item` passes every filter.
    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        let text_ok = self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            item.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        });
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|wanted| item.category().is_some_and(|c| c.eq_ignore_ascii_case(wanted)));
        let brand_ok = self
            .brand
            .as_deref()
            .is_none_or(|wanted| item.brand().is_some_and(|b| b.eq_ignore_ascii_case(wanted)));

        text_ok && category_ok && brand_ok
    }

    /// Filter then stable-sort a list.
    pub fn apply<T: Listable + Clone>(&self, items: &[T]) -> Vec<T> {
        let mut out: Vec<T> = items.iter().filter(|i| self.matches(*i)).cloned().collect();
        out.sort_by(|a, b| self.sort.compare(a, b));
        out
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Distinct categories and brands for filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

impl Facets {
    /// Collect sorted, de-duplicated facet values.
    pub fn from_items<T: Listable>(items: &[T]) -> Self {
        let categories: BTreeSet<&str> = items.iter().filter_map(Listable::category).collect();
        let brands: BTreeSet<&str> = items.iter().filter_map(Listable::brand).collect();
        Self {
            categories: categories.into_iter().map(String::from).collect(),
            brands: brands.into_iter().map(String::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::types::ProductId;

    fn product(id: i64, name: &str, brand: &str, category: &str, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            brand: Some(brand.to_string()),
            category: Some(category.to_string()),
            price: Money::from_minor(price),
            stock,
            created_at: Some(format!("2026-01-{id:02}T09:00:00Z")),
            extra: serde_json::Map::new(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Galaxy A15", "Samsung", "Phones", 180_000, 4),
            product(2, "iPhone 13", "Apple", "Phones", 650_000, 1),
            product(3, "USB-C Charger", "Oraimo", "Accessories", 12_000, 40),
            product(4, "Galaxy Buds", "Samsung", "Accessories", 90_000, 0),
        ]
    }

    #[test]
    fn test_price_asc_is_non_decreasing() {
        let query = ListQuery::from_params(None, None, None, Some("price_asc"));
        let sorted = query.apply(&catalog());
        assert!(sorted.windows(2).all(|w| match w {
            [a, b] => a.price <= b.price,
            _ => true,
        }));
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn test_text_filter_matches_name_or_brand_case_insensitively() {
        let query = ListQuery::from_params(Some("SAMSUNG"), None, None, None);
        let names: Vec<String> = query.apply(&catalog()).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Galaxy A15", "Galaxy Buds"]);

        let query = ListQuery::from_params(Some("charg"), None, None, None);
        assert_eq!(query.apply(&catalog()).len(), 1);
    }

    #[test]
    fn test_category_and_brand_filters() {
        let query = ListQuery::from_params(None, Some("accessories"), Some("Samsung"), None);
        let hits = query.apply(&catalog());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().map(|p| p.id), Some(ProductId::new(4)));

        let all = ListQuery::from_params(Some("  "), Some("all"), Some("All"), None);
        assert_eq!(all.apply(&catalog()).len(), 4);
    }

    #[test]
    fn test_other_sort_orders() {
        let ids = |sort: &str| -> Vec<i64> {
            ListQuery::from_params(None, None, None, Some(sort))
                .apply(&catalog())
                .iter()
                .map(|p| p.id.as_i64())
                .collect()
        };
        assert_eq!(ids("name_asc"), vec![1, 4, 2, 3]);
        assert_eq!(ids("stock_desc"), vec![3, 1, 2, 4]);
        assert_eq!(ids("newest"), vec![4, 3, 2, 1]);
        assert_eq!(ids("bogus"), ids("name_asc"));
    }

    #[test]
    fn test_facets_are_sorted_and_unique() {
        let facets = Facets::from_items(&catalog());
        assert_eq!(facets.categories, vec!["Accessories", "Phones"]);
        assert_eq!(facets.brands, vec!["Apple", "Oraimo", "Samsung"]);
    }
}
