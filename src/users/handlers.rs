use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserResponse},
        error::{FieldError, UserError, UserResult},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn rejected(field: &str, message: String) -> UserError {
    warn!(field, %message, "request rejected");
    UserError::Validation(vec![FieldError::new(field, message)])
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> UserResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| rejected("body", e.body_text()))
}

fn path_id(id: Result<Path<i64>, PathRejection>) -> UserResult<i64> {
    id.map(|Path(id)| id).map_err(|e| rejected("id", e.body_text()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> UserResult<Json<UserResponse>> {
    let input = body(payload)?.validate()?;
    let user = state.users.create_user(input).await?;
    info!(user_id = user.id, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> UserResult<Json<Vec<UserResponse>>> {
    let Query(q) = query.map_err(|e| rejected("query", e.body_text()))?;
    let users = state
        .users
        .list_users(q.skip.into(), q.limit.into(), q.is_active)
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state, id))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> UserResult<Json<UserResponse>> {
    let user = state.users.get_user(path_id(id)?).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, id, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> UserResult<Json<UserResponse>> {
    let id = path_id(id)?;
    let patch = body(payload)?.validate()?;
    let user = state.users.update_user(id, patch).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, id))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> UserResult<StatusCode> {
    state.users.delete_user(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
