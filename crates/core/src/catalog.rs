//! Catalog browsing options.

use serde::{Deserialize, Serialize};

/// Products shown per catalog page.
pub const PRODUCTS_PER_PAGE: u32 = 12;

/// Catalog ordering, named the way the storefront's query string spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    #[default]
    Newest,
}

impl ProductSort {
    /// `ORDER BY` clause for the `products` table. Ties fall back to id so
    /// pagination is stable.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id ASC",
            Self::NameAsc => "name ASC, id ASC",
            Self::NameDesc => "name DESC, id ASC",
            Self::Newest => "created_at DESC, id ASC",
        }
    }
}
