//! Ninebets Web - JSON API Server
//!
//! Serves the shared round clock, the draw feed and the centralized draw,
//! user history, wallet operations and admin draw submissions.

#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]

pub mod error;
pub mod handlers;
pub mod server;

// Re-export main types
pub use error::ApiError;
pub use server::{AppState, build_router, run_server};
