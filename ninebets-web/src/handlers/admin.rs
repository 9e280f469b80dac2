//! Admin-guarded endpoints

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use ninebets_core::admin::AdminDrawRequest;
use ninebets_core::store::AdminDraw;
use serde_json::json;

use crate::error::ApiError;
use crate::server::AppState;

/// Header carrying the shared admin secret.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Accepts the request only when `x-admin-token` matches the configured token.
///
/// Without a configured token every request is refused.
///
/// # Errors
///
/// - `ApiError::Unauthorized` - Token missing, wrong, or not configured
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.server.admin_token.as_deref() else {
        tracing::warn!("Admin request refused: no admin token configured");
        return Err(ApiError::Unauthorized);
    };

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(expected) {
        tracing::warn!("Admin request refused: invalid token");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

/// `POST /add-draw`: stores an admin-curated draw for a room.
///
/// # Errors
///
/// - `ApiError::Unauthorized` - Admin guard rejected the request
/// - `ApiError::BadRequest` - A selection is missing or invalid
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn add_draw(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AdminDrawRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_admin(&state, &headers)?;

    let draw = request.validate(Utc::now())?;
    state.store.add_admin_draw(draw.clone()).await?;
    tracing::info!(room_id = draw.room_id, number = %draw.number, "Admin draw added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Draw added", "draw": draw })),
    ))
}

/// `GET /admin-draws[?roomId=N]`: admin draws, newest first.
///
/// # Errors
///
/// - `ApiError::Unauthorized` - Admin guard rejected the request
/// - `ApiError::BadRequest` - `roomId` is not a number
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn admin_draws(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<AdminDraw>>, ApiError> {
    require_admin(&state, &headers)?;

    let room_id = params
        .get("roomId")
        .map(|room| {
            room.parse::<u32>()
                .map_err(|_| ApiError::bad_request(format!("Invalid roomId: {room}")))
        })
        .transpose()?;

    Ok(Json(state.store.admin_draws(room_id).await?))
}
