//! Wallet endpoints

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use ninebets_core::store::UserAccount;
use ninebets_core::wallet::{TransactionFilter, WalletError, WalletSummary, parse_amount};
use serde::Deserialize;

use crate::error::ApiError;
use crate::server::AppState;

/// Amount as typed into a form (`"100"`) or sent as a JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    fn parse(&self) -> Result<f64, WalletError> {
        match self {
            AmountInput::Number(amount) => parse_amount(&amount.to_string()),
            AmountInput::Text(text) => parse_amount(text),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: AmountInput,
}

/// `GET /users/{id}/wallet?filter=all|today|this_month`
///
/// # Errors
///
/// - `ApiError::BadRequest` - Unknown filter
/// - `ApiError::NotFound` - Unknown user
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn wallet_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<WalletSummary>, ApiError> {
    let filter = match params.get("filter") {
        Some(filter) => filter.parse::<TransactionFilter>()?,
        None => TransactionFilter::All,
    };
    Ok(Json(state.wallet.summary(&id, filter, Utc::now()).await?))
}

/// `POST /users/{id}/wallet/deposit`
///
/// # Errors
///
/// - `ApiError::BadRequest` - Amount not a positive number
/// - `ApiError::NotFound` - Unknown user
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    let amount = request.amount.parse()?;
    Ok(Json(state.wallet.deposit(&id, amount).await?))
}

/// `POST /users/{id}/wallet/withdraw`
///
/// # Errors
///
/// - `ApiError::BadRequest` - Amount not a positive number or above the balance
/// - `ApiError::NotFound` - Unknown user
/// - `ApiError::Unavailable` - Store could not be reached
pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    let amount = request.amount.parse()?;
    Ok(Json(state.wallet.withdraw(&id, amount).await?))
}
