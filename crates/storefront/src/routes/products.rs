//! Catalog browsing.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use saakie_core::catalog::ProductSort;

use crate::error::AppError;
use crate::models::{Category, Product, ProductFilter, ProductPage};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/categories", get(list_categories))
}

/// Raw catalog query string. Blank values are treated as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_price(value: Option<&String>, name: &str) -> Result<Option<Decimal>, AppError> {
    present(value)
        .map(|raw| {
            raw.parse::<Decimal>()
                .ok()
                .filter(|price| !price.is_sign_negative())
                .ok_or_else(|| AppError::BadRequest(format!("Invalid {name}: {raw}")))
        })
        .transpose()
}

impl TryFrom<ProductQuery> for ProductFilter {
    type Error = AppError;

    /// Unknown sorts fall back to newest and unparseable pages to the first
    /// page; malformed prices are rejected.
    fn try_from(query: ProductQuery) -> Result<Self, Self::Error> {
        let min_price = parse_price(query.min_price.as_ref(), "minPrice")?;
        let max_price = parse_price(query.max_price.as_ref(), "maxPrice")?;

        let sort = present(query.sort.as_ref())
            .and_then(|raw| {
                serde_json::from_value::<ProductSort>(serde_json::Value::String(raw.to_owned()))
                    .ok()
            })
            .unwrap_or_default();
        let page = present(query.page.as_ref())
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1);

        Ok(Self {
            category: present(query.category.as_ref()).map(str::to_owned),
            min_price,
            max_price,
            search: present(query.search.as_ref()).map(str::to_owned),
            sort,
            page,
        })
    }
}

#[instrument(skip(state, query))]
async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<ProductPage>, AppError> {
    let Query(query) = query?;
    let filter = ProductFilter::try_from(query)?;
    Ok(Json(state.catalog().list_products(&filter).await?))
}

#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    state
        .catalog()
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

#[derive(Debug, Serialize)]
struct CategoryList {
    categories: Vec<Category>,
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<CategoryList>, AppError> {
    let categories = state.catalog().list_categories().await?;
    Ok(Json(CategoryList { categories }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ProductQuery {
        let mut query = ProductQuery::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "category" => query.category = value,
                "minPrice" => query.min_price = value,
                "maxPrice" => query.max_price = value,
                "search" => query.search = value,
                "sort" => query.sort = value,
                "page" => query.page = value,
                _ => unreachable!(),
            }
        }
        query
    }

    #[test]
    fn empty_query_is_newest_first_page() {
        let filter = ProductFilter::try_from(ProductQuery::default()).unwrap();
        assert_eq!(filter, ProductFilter {
            page: 1,
            ..ProductFilter::default()
        });
    }

    #[test]
    fn parses_every_filter() {
        let filter = ProductFilter::try_from(query(&[
            ("category", "silk"),
            ("minPrice", "1000"),
            ("maxPrice", "4999.50"),
            ("search", " banarasi "),
            ("sort", "price-asc"),
            ("page", "2"),
        ]))
        .unwrap();

        assert_eq!(filter.category.as_deref(), Some("silk"));
        assert_eq!(filter.min_price, Some(Decimal::from(1000)));
        assert_eq!(filter.max_price, Some(Decimal::new(499_950, 2)));
        assert_eq!(filter.search.as_deref(), Some("banarasi"));
        assert_eq!(filter.sort, ProductSort::PriceAsc);
        assert_eq!(filter.page, 2);
    }

    #[test]
    fn lenient_sort_and_page() {
        let filter =
            ProductFilter::try_from(query(&[("sort", "cheapest"), ("page", "zero")])).unwrap();
        assert_eq!(filter.sort, ProductSort::Newest);
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn blank_values_are_ignored() {
        let filter = ProductFilter::try_from(query(&[("category", "  "), ("minPrice", "")]))
            .unwrap();
        assert!(filter.category.is_none());
        assert!(filter.min_price.is_none());
    }

    #[test]
    fn malformed_prices_are_rejected() {
        assert!(matches!(
            ProductFilter::try_from(query(&[("minPrice", "cheap")])),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            ProductFilter::try_from(query(&[("maxPrice", "-5")])),
            Err(AppError::BadRequest(_))
        ));
    }
}
