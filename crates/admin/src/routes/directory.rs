//! Directory API: list, inspect, create, update, and delete accounts.
//!
//! Every route here sits behind the admin role gate.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::instrument;

use saakie_core::{UserId, UserRole};

use crate::error::AppError;
use crate::middleware::{Actor, RoleGate, require_role};
use crate::models::UserDetail;
use crate::services::directory::{
    CreateUserRequest, ListUsersParams, ListUsersResponse, UpdateUserRequest, UserDirectory,
    UserMutation,
};
use crate::state::AppState;

/// Create directory routes, gated on [`UserRole::Admin`].
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/directory/users", get(list_users).post(create_user))
        .route(
            "/directory/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            RoleGate::new(state, UserRole::Admin),
            require_role,
        ))
}

fn parse_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid user id: {raw}")))
}

#[instrument(skip(state, query))]
async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersParams>, QueryRejection>,
) -> Result<Json<ListUsersResponse>, AppError> {
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = UserDirectory::new(state.users()).list(&params).await?;
    Ok(Json(response))
}

#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserDetail>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(UserDirectory::new(state.users()).get(id).await?))
}

#[instrument(skip(state, payload))]
async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserMutation>), AppError> {
    let Json(request) = payload?;
    let created = UserDirectory::new(state.users()).create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserMutation>, AppError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    Ok(Json(
        UserDirectory::new(state.users()).update(id, request).await?,
    ))
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
async fn delete_user(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    UserDirectory::new(state.users()).delete(id, &actor).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
