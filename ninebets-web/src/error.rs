//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ninebets_core::{
    AdminDrawError, ClockError, NinebetsError, PeriodError, RoundError, StoreError, WalletError,
};
use serde_json::json;

/// Error returned by API handlers, rendered as `{ "error": <message> }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    NotFound { message: String },

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{message}")]
    Unavailable { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<NinebetsError> for ApiError {
    fn from(error: NinebetsError) -> Self {
        if error.is_not_found() {
            return ApiError::NotFound {
                message: error.user_message(),
            };
        }
        if error.is_user_error() {
            return ApiError::BadRequest {
                message: error.to_string(),
            };
        }
        match error {
            NinebetsError::Store(StoreError::Unavailable { .. })
            | NinebetsError::Wallet(WalletError::Store(StoreError::Unavailable { .. })) => {
                ApiError::Unavailable {
                    message: error.user_message(),
                }
            }
            other => ApiError::Internal {
                message: other.user_message(),
            },
        }
    }
}

macro_rules! api_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for ApiError {
                fn from(error: $source) -> Self {
                    NinebetsError::from(error).into()
                }
            }
        )*
    };
}

api_error_from!(
    ClockError,
    PeriodError,
    RoundError,
    StoreError,
    WalletError,
    AdminDrawError,
);
