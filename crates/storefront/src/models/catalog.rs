//! Catalog records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use saakie_core::catalog::{PRODUCTS_PER_PAGE, ProductSort};

/// The category a product belongs to, as embedded in product responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub images: Vec<String>,
    pub stock: i32,
    pub featured: bool,
    pub category: CategorySummary,
    pub created_at: DateTime<Utc>,
}

/// Validated catalog query. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Category id or slug.
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    pub sort: ProductSort,
    pub page: u32,
}

impl ProductFilter {
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(PRODUCTS_PER_PAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl ProductPage {
    #[must_use]
    pub fn new(products: Vec<Product>, page: u32, total: u64) -> Self {
        Self {
            products,
            page,
            per_page: PRODUCTS_PER_PAGE,
            total,
            total_pages: total.div_ceil(u64::from(PRODUCTS_PER_PAGE)),
        }
    }
}
