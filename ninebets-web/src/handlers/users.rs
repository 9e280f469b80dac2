//! User registration and bet history

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use ninebets_core::round::HistoryRecord;
use ninebets_core::store::UserAccount;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub id: String,
}

/// `POST /users`
///
/// # Errors
///
/// - `ApiError::BadRequest` - Blank id or already registered
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserAccount>), ApiError> {
    let id = request.id.trim();
    if id.is_empty() {
        return Err(ApiError::bad_request("User id must not be empty"));
    }

    let account = state.store.create_user(id).await?;
    tracing::info!(user_id = %account.id, "User registered");
    Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /users/{id}`
///
/// # Errors
///
/// - `ApiError::NotFound` - Unknown user
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn user_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserAccount>, ApiError> {
    Ok(Json(state.store.user(&id).await?))
}

/// `POST /users/{id}/history`
///
/// # Errors
///
/// - `ApiError::NotFound` - Unknown user
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn append_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(record): Json<HistoryRecord>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    state.store.append_history(&id, record).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "History recorded" })),
    ))
}

/// `GET /users/{id}/history`: settled bets, newest first.
///
/// # Errors
///
/// - `ApiError::NotFound` - Unknown user
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn list_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history = state.store.history(&id).await?;
    Ok(Json(json!({ "history": history })))
}
