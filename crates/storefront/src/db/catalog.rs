//! `PostgreSQL` implementation of [`CatalogStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{CatalogStore, RepositoryError, escape_like};
use crate::models::{Category, CategorySummary, Product, ProductFilter, ProductPage};

use saakie_core::catalog::PRODUCTS_PER_PAGE;

/// Products joined to their category, with category columns aliased so the
/// sort clauses can name `id`, `name`, `price`, and `created_at` unqualified.
const LISTING: &str = "SELECT p.id, p.name, p.description, p.price, p.images, p.stock, \
     p.featured, p.created_at, c.id AS category_id, c.name AS category_name, \
     c.slug AS category_slug \
     FROM products p JOIN categories c ON c.id = p.category_id WHERE TRUE";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: Decimal,
    images: Vec<String>,
    stock: i32,
    featured: bool,
    created_at: DateTime<Utc>,
    category_id: String,
    category_name: String,
    category_slug: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            images: row.images,
            stock: row.stock,
            featured: row.featured,
            category: CategorySummary {
                id: row.category_id,
                name: row.category_name,
                slug: row.category_slug,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    product_count: i64,
}

/// Catalog reads over the shared pool.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category) = &filter.category {
        query
            .push(" AND (c.id = ")
            .push_bind(category.clone())
            .push(" OR c.slug = ")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(min) = filter.min_price {
        query.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.description ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    #[tracing::instrument(skip(self))]
    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductPage, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM products p JOIN categories c ON c.id = p.category_id WHERE TRUE",
        );
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT * FROM ({LISTING}"));
        push_filters(&mut query, filter);
        query
            .push(") AS listing ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(i64::from(PRODUCTS_PER_PAGE))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows: Vec<ProductRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(ProductPage::new(
            rows.into_iter().map(Product::from).collect(),
            filter.page.max(1),
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn get_product(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{LISTING} AND p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT c.id, c.name, c.slug, c.description, COUNT(p.id) AS product_count \
             FROM categories c LEFT JOIN products p ON p.category_id = c.id \
             GROUP BY c.id ORDER BY c.name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Category {
                id: row.id,
                name: row.name,
                slug: row.slug,
                description: row.description,
                product_count: row.product_count,
            })
            .collect())
    }
}
