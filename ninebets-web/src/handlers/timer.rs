//! Shared round clock endpoints

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use chrono::Utc;
use ninebets_core::clock::TrackRemaining;
use serde::{Deserialize, Serialize};

use super::admin::require_admin;
use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TimersResponse {
    pub timers: Vec<TrackRemaining>,
}

/// `GET /timer`: remaining seconds of every track from one epoch read.
pub async fn get_timers(State(state): State<AppState>) -> Json<TimersResponse> {
    Json(TimersResponse {
        timers: state.clock.snapshot(Utc::now()),
    })
}

/// `POST /timer?reset`: restarts the cycle of every track at once.
///
/// # Errors
///
/// - `ApiError::MethodNotAllowed` - The `reset` flag is absent
/// - `ApiError::Unauthorized` - Missing or wrong admin token
pub async fn post_timer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !params.contains_key("reset") {
        return Err(ApiError::MethodNotAllowed);
    }
    require_admin(&state, &headers)?;

    let now = Utc::now();
    state.clock.reset(now);
    Ok(Json(serde_json::json!({
        "message": "Timer reset",
        "timers": state.clock.snapshot(now),
    })))
}
