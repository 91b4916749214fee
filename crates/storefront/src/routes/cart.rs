//! Cart API.
//!
//! The cart lives in the shopper's session. Prices are captured from the
//! product record when a product is first added; later price changes do not
//! affect lines already in the cart.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use saakie_core::cart::{CartLine, CartLineId, CartLines, ProductRef};
use saakie_core::checkout::CheckoutSummary;

use crate::error::{AppError, add_breadcrumb};
use crate::services::cart::{self, SessionCart};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(show_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route(
            "/api/cart/items/{line_id}",
            patch(update_item).delete(remove_item),
        )
}

/// One cart line with its computed total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Decimal,
}

/// The cart as returned by every cart endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_items: u64,
    pub total_price: Decimal,
    pub summary: CheckoutSummary,
}

impl CartView {
    fn of(cart: &impl CartLines) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    line: line.clone(),
                    line_total: line.line_total(),
                })
                .collect(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
            summary: CheckoutSummary::for_cart(cart),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

fn parse_line_id(raw: &str) -> Result<CartLineId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid cart item id: {raw}")))
}

fn line_not_found() -> AppError {
    AppError::NotFound("Cart item not found".to_string())
}

#[instrument(skip_all)]
async fn show_cart(session: Session) -> Json<CartView> {
    let cart = cart::open(session).await;
    Json(CartView::of(&cart))
}

/// Add a product, merging into its existing line.
///
/// The stock check reads the product once and is not atomic with the add;
/// checkout is expected to re-validate.
#[instrument(skip(state, session, payload))]
async fn add_item(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<CartView>, AppError> {
    let Json(request) = payload?;
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = state
        .catalog()
        .get_product(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let mut cart: SessionCart = cart::open(session).await;
    let product_ref = ProductRef::new(product.id.as_str());
    let in_cart = cart
        .line_for_product(&product_ref)
        .map_or(0, |line| i64::from(line.quantity));
    if in_cart + i64::from(quantity) > i64::from(product.stock) {
        return Err(AppError::BadRequest(format!(
            "Only {} of {} in stock",
            product.stock.max(0),
            product.name
        )));
    }

    cart.add_item(product_ref, quantity, product.price).await;
    add_breadcrumb(
        "cart",
        "Added item",
        &[("product_id", product.id.as_str())],
    );
    tracing::info!(product_id = %product.id, quantity, "cart item added");

    Ok(Json(CartView::of(&cart)))
}

/// Set a line's quantity; zero or less removes the line.
#[instrument(skip(session, payload))]
async fn update_item(
    session: Session,
    Path(line_id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<CartView>, AppError> {
    let id = parse_line_id(&line_id)?;
    let Json(request) = payload?;

    let mut cart = cart::open(session).await;
    if cart.line(id).is_none() {
        return Err(line_not_found());
    }
    cart.update_quantity(id, request.quantity).await;
    Ok(Json(CartView::of(&cart)))
}

#[instrument(skip(session))]
async fn remove_item(
    session: Session,
    Path(line_id): Path<String>,
) -> Result<Json<CartView>, AppError> {
    let id = parse_line_id(&line_id)?;

    let mut cart = cart::open(session).await;
    if !cart.remove_item(id).await {
        return Err(line_not_found());
    }
    Ok(Json(CartView::of(&cart)))
}

#[instrument(skip_all)]
async fn clear_cart(session: Session) -> Json<CartView> {
    let mut cart = cart::open(session).await;
    cart.clear_cart().await;
    Json(CartView::of(&cart))
}
