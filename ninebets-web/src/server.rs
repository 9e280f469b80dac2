//! JSON API server for Ninebets
//!
//! Owns the process-wide round clock and the centralized draw authority and
//! exposes them alongside user, wallet and admin endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use ninebets_core::config::NinebetsConfig;
use ninebets_core::round::{MemoizedOutcomeGenerator, RandomOutcomeGenerator};
use ninebets_core::store::{GameStore, InMemoryStore};
use ninebets_core::wallet::WalletService;
use ninebets_core::{NinebetsError, RoundClock};
use parking_lot::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    add_draw, admin_draws, append_history, central_draw, create_user, deposit, get_timers,
    list_history, post_timer, recent_draws, record_draw, user_account, wallet_summary, withdraw,
};

/// Draw authority keyed by `(track, period)`.
pub type DrawAuthority = MemoizedOutcomeGenerator<RandomOutcomeGenerator>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NinebetsConfig>,
    pub clock: Arc<RoundClock>,
    pub store: Arc<dyn GameStore>,
    pub wallet: WalletService,
    pub draws: Arc<Mutex<DrawAuthority>>,
}

impl AppState {
    /// Builds state with the clock epoch at `epoch`.
    ///
    /// # Errors
    ///
    /// - `NinebetsError::Configuration` - Configuration failed validation
    /// - `NinebetsError::Clock` - Track list rejected by the clock
    pub fn new(
        config: NinebetsConfig,
        store: Arc<dyn GameStore>,
        epoch: DateTime<Utc>,
    ) -> Result<Self, NinebetsError> {
        config.validate()?;
        let clock = RoundClock::new(config.clock.tracks.clone(), epoch)?;
        let draws = MemoizedOutcomeGenerator::new(RandomOutcomeGenerator::from_config(&config.draw));

        Ok(Self {
            config: Arc::new(config),
            clock: Arc::new(clock),
            wallet: WalletService::new(Arc::clone(&store)),
            store,
            draws: Arc::new(Mutex::new(draws)),
        })
    }
}

/// Assembles the API routes over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Shared round clock
        .route("/timer", get(get_timers).post(post_timer))
        // Draw feed and centralized draw
        .route("/draws", get(recent_draws).post(record_draw))
        .route("/rounds/{label}/draw", post(central_draw))
        // Admin
        .route("/add-draw", post(add_draw))
        .route("/admin-draws", get(admin_draws))
        // Users, history and wallet
        .route("/users", post(create_user))
        .route("/users/{id}", get(user_account))
        .route("/users/{id}/history", get(list_history).post(append_history))
        .route("/users/{id}/wallet", get(wallet_summary))
        .route("/users/{id}/wallet/deposit", post(deposit))
        .route("/users/{id}/wallet/withdraw", post(withdraw))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the API server until the process is stopped.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - Invalid configuration or the listener could not bind
pub async fn run_server(config: NinebetsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    if config.server.admin_token.is_none() {
        tracing::warn!("No admin token configured, admin endpoints will refuse all requests");
    }

    let store: Arc<dyn GameStore> = Arc::new(InMemoryStore::new());
    let state = AppState::new(config, store, Utc::now())?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Ninebets server running on http://{}", address);
    axum::serve(listener, app).await?;
    Ok(())
}
