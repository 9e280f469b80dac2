//! Centralized configuration for Ninebets.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::collections::HashSet;
use std::time::Duration;

use crate::clock::RoundTrack;

/// Central configuration for all Ninebets components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct NinebetsConfig {
    pub clock: ClockConfig,
    pub round: RoundConfig,
    pub server: ServerConfig,
    pub draw: DrawConfig,
}

/// Round track definitions driven by the shared clock.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Tracks in display order. Index 0 is the default active track.
    pub tracks: Vec<RoundTrack>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tracks: vec![
                RoundTrack::new("1min", 60),
                RoundTrack::new("3min", 180),
                RoundTrack::new("5min", 300),
                RoundTrack::new("10min", 600),
            ],
        }
    }
}

/// Scheduler cadence and round phase thresholds.
///
/// Thresholds are expressed as remaining seconds in the round.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// Countdown cadence of the active track
    pub tick_interval: Duration,
    /// Remaining seconds at which bets lock and the draw is staged
    pub lock_threshold_secs: u32,
    /// Remaining seconds at which the round settles
    pub settle_threshold_secs: u32,
    /// Upper bound of the advisory final countdown window
    pub final_countdown_secs: u32,
    /// Default number of draws returned by the draw feed
    pub recent_draws_limit: usize,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            lock_threshold_secs: 5,
            settle_threshold_secs: 1,
            final_countdown_secs: 11,
            recent_draws_limit: 5,
        }
    }
}

/// HTTP server binding and access control.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Shared secret for admin endpoints (None = admin endpoints refused)
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            admin_token: None,
        }
    }
}

/// Draw generation settings.
#[derive(Debug, Clone, Default)]
pub struct DrawConfig {
    /// Deterministic seed for reproducible draws (None = OS entropy)
    pub seed: Option<u64>,
}

impl NinebetsConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("NINEBETS_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("NINEBETS_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.port = port;
            }
        }

        if let Ok(token) = std::env::var("NINEBETS_ADMIN_TOKEN") {
            if !token.is_empty() {
                config.server.admin_token = Some(token);
            }
        }

        if let Ok(seed) = std::env::var("NINEBETS_DRAW_SEED") {
            if let Ok(seed_value) = seed.parse::<u64>() {
                config.draw.seed = Some(seed_value);
            }
        }

        if let Ok(threshold) = std::env::var("NINEBETS_LOCK_THRESHOLD") {
            if let Ok(seconds) = threshold.parse::<u32>() {
                config.round.lock_threshold_secs = seconds;
            }
        }

        config
    }

    /// Creates a configuration for deterministic testing.
    pub fn deterministic_testing() -> Self {
        Self {
            draw: DrawConfig { seed: Some(42) },
            server: ServerConfig {
                admin_token: Some("test-admin-token".to_string()),
                ..ServerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Checks track definitions and phase thresholds for consistency.
    ///
    /// # Errors
    ///
    /// - `NinebetsError::Configuration` - No tracks, zero or duplicate periods,
    ///   or thresholds not ordered `settle < lock < period`
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |reason: String| crate::NinebetsError::Configuration { reason };

        if self.clock.tracks.is_empty() {
            return Err(invalid("at least one round track is required".to_string()));
        }

        let mut labels = HashSet::new();
        for track in &self.clock.tracks {
            if track.period_seconds == 0 {
                return Err(invalid(format!("track {} has a zero period", track.label)));
            }
            if !labels.insert(track.label.as_str()) {
                return Err(invalid(format!("duplicate track label {}", track.label)));
            }
            if track.period_seconds <= self.round.lock_threshold_secs {
                return Err(invalid(format!(
                    "track {} is shorter than the lock threshold",
                    track.label
                )));
            }
        }

        if self.round.settle_threshold_secs == 0
            || self.round.settle_threshold_secs >= self.round.lock_threshold_secs
        {
            return Err(invalid(
                "settle threshold must be positive and below the lock threshold".to_string(),
            ));
        }

        if self.round.tick_interval.is_zero() {
            return Err(invalid("tick interval must be positive".to_string()));
        }

        Ok(())
    }
}
