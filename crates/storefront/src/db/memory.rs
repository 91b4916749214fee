//! In-process stores used by route tests.
//!
//! Filtering, sorting, and paging follow the `PostgreSQL` queries: category
//! by id or slug, inclusive price bounds, case-insensitive search over name
//! and description, and id as the tie-breaker.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use saakie_core::ExternalUserId;
use saakie_core::catalog::{PRODUCTS_PER_PAGE, ProductSort};

use super::{AccountStore, CatalogStore, RepositoryError};
use crate::models::{Category, Product, ProductFilter, ProductPage, Profile};

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    categories: RwLock<Vec<Category>>,
    products: RwLock<Vec<Product>>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&self, category: Category) {
        self.categories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(category);
    }

    pub fn add_product(&self, product: Product) {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(product);
    }
}

fn matches(product: &Product, filter: &ProductFilter) -> bool {
    if let Some(category) = &filter.category
        && product.category.id != *category
        && product.category.slug != *category
    {
        return false;
    }
    if filter.min_price.is_some_and(|min| product.price < min) {
        return false;
    }
    if filter.max_price.is_some_and(|max| product.price > max) {
        return false;
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        if !product.name.to_lowercase().contains(&needle)
            && !product.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

fn compare(sort: ProductSort, a: &Product, b: &Product) -> Ordering {
    let primary = match sort {
        ProductSort::PriceAsc => a.price.cmp(&b.price),
        ProductSort::PriceDesc => b.price.cmp(&a.price),
        ProductSort::NameAsc => a.name.cmp(&b.name),
        ProductSort::NameDesc => b.name.cmp(&a.name),
        ProductSort::Newest => b.created_at.cmp(&a.created_at),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductPage, RepositoryError> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<&Product> = products.iter().filter(|p| matches(p, filter)).collect();
        matching.sort_by(|a, b| compare(filter.sort, a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(PRODUCTS_PER_PAGE as usize)
            .cloned()
            .collect();

        Ok(ProductPage::new(page, filter.page.max(1), total))
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        let mut categories: Vec<Category> = self
            .categories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|c| Category {
                product_count: products
                    .iter()
                    .filter(|p| p.category.id == c.id)
                    .count()
                    .try_into()
                    .unwrap_or(i64::MAX),
                ..c.clone()
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    profiles: RwLock<HashMap<ExternalUserId, Profile>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, external_id: ExternalUserId, profile: Profile) {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(external_id, profile);
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn profile(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(external_id)
            .cloned())
    }
}
