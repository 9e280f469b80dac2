//! Draw feed and the centralized draw authority

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use ninebets_core::clock::PeriodId;
use ninebets_core::round::{Outcome, OutcomeGenerator, Selection};
use ninebets_core::store::DrawRecord;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct DrawQuery {
    pub limit: Option<usize>,
}

/// Newest draws plus the period pointers shown above the results table.
#[derive(Debug, Serialize, Deserialize)]
pub struct DrawFeed {
    pub draws: Vec<DrawRecord>,
    pub current_period: Option<PeriodId>,
    pub next_period: Option<PeriodId>,
}

#[derive(Debug, Default, Deserialize)]
struct DrawRequest {
    #[serde(default)]
    selection: Option<Selection>,
}

/// `GET /draws?limit=N`
///
/// # Errors
///
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn recent_draws(
    State(state): State<AppState>,
    Query(query): Query<DrawQuery>,
) -> Result<Json<DrawFeed>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.config.round.recent_draws_limit);
    let draws = state.store.recent_draws(limit).await?;

    let current_period = draws.first().map(|draw| draw.period);
    let next_period = current_period.and_then(|period| {
        period
            .next_for_date(Utc::now().date_naive())
            .map_err(|error| tracing::warn!(%error, "Cannot derive next period"))
            .ok()
    });

    Ok(Json(DrawFeed {
        draws,
        current_period,
        next_period,
    }))
}

/// `POST /draws`: appends a client-staged draw to the feed.
///
/// # Errors
///
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn record_draw(
    State(state): State<AppState>,
    Json(draw): Json<DrawRecord>,
) -> Result<StatusCode, ApiError> {
    state.store.record_draw(draw).await?;
    Ok(StatusCode::CREATED)
}

/// `POST /rounds/{label}/draw`: the one outcome of the round in progress.
///
/// The first request for a round draws it, honoring the optional selection;
/// later requests for the same round get the same outcome.
///
/// # Errors
///
/// - `ApiError::NotFound` - No track with this label
/// - `ApiError::BadRequest` - Body is not a valid draw request
pub async fn central_draw(
    State(state): State<AppState>,
    Path(label): Path<String>,
    body: Bytes,
) -> Result<Json<Outcome>, ApiError> {
    let request: DrawRequest = if body.is_empty() {
        DrawRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|error| ApiError::bad_request(format!("Invalid draw request: {error}")))?
    };

    let now = Utc::now();
    let track = state.clock.track(&label)?.clone();
    let period = state.clock.period(&track, now)?;

    let (outcome, fresh) = {
        let mut draws = state.draws.lock();
        match draws.get(&track.label, period).cloned() {
            Some(existing) => (existing, false),
            None => (draws.generate(&track, period, request.selection, now), true),
        }
    };

    if fresh {
        tracing::info!(track = %track.label, %period, number = %outcome.drawn_number, "Round drawn");
        if let Err(error) = state.store.record_draw(DrawRecord::from(&outcome)).await {
            tracing::warn!(%error, "Failed to record draw");
        }
    }

    Ok(Json(outcome))
}
