//! CLI command implementations

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Subcommand;
use ninebets_core::config::NinebetsConfig;
use ninebets_core::round::{RandomOutcomeGenerator, RoundError, Selection};
use ninebets_core::scheduler::{RoundEvent, RoundScheduler, RoundSchedulerHandle};
use ninebets_core::spawn_round_scheduler;
use tokio::sync::broadcast::error::RecvError;

use crate::client::{HttpHistorySink, ServerClient};

const DEFAULT_URL: &str = "http://127.0.0.1:3000";
const RESYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Shared secret required by admin endpoints
        #[arg(long)]
        admin_token: Option<String>,
    },
    /// Show the remaining time of every round track
    Timers {
        /// Server base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
    },
    /// Restart the shared round cycle
    Reset {
        /// Server base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
        /// Admin token configured on the server
        #[arg(long)]
        admin_token: String,
    },
    /// Play rounds against a server from the terminal
    Play {
        /// Server base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
        /// Player account id
        #[arg(long)]
        user: String,
        /// Round track label
        #[arg(long, default_value = "1min")]
        track: String,
        /// Selection: a digit 0-9, red, green, violet, big or small
        #[arg(long)]
        bet: String,
        /// Bid amount
        #[arg(long)]
        amount: u64,
        /// Number of rounds to settle before exiting
        #[arg(long, default_value = "1")]
        rounds: u32,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the failure of the command that ran
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Server {
            host,
            port,
            admin_token,
        } => start_server(host, port, admin_token).await,
        Commands::Timers { url } => show_timers(&url).await,
        Commands::Reset { url, admin_token } => reset_timers(&url, &admin_token).await,
        Commands::Play {
            url,
            user,
            track,
            bet,
            amount,
            rounds,
        } => play(&url, &user, &track, &bet, amount, rounds).await,
    }
}

/// Start the API server, flags taking precedence over the environment
///
/// # Errors
/// - Invalid configuration or the server failed to bind
pub async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    admin_token: Option<String>,
) -> anyhow::Result<()> {
    let mut config = NinebetsConfig::from_env();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if admin_token.is_some() {
        config.server.admin_token = admin_token;
    }

    ninebets_web::run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {e}"))
}

/// Print the countdown of every track
///
/// # Errors
/// - Server unreachable or response malformed
pub async fn show_timers(url: &str) -> anyhow::Result<()> {
    let client = ServerClient::new(url)?;
    let timers = client.fetch_timers().await?;

    for timer in timers {
        let period = timer
            .period
            .map(|period| period.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:02}:{:02}  period {}",
            timer.label,
            timer.remaining / 60,
            timer.remaining % 60,
            period
        );
    }
    Ok(())
}

/// Restart the shared round cycle
///
/// # Errors
/// - Server unreachable or token refused
pub async fn reset_timers(url: &str, admin_token: &str) -> anyhow::Result<()> {
    let client = ServerClient::new(url)?;
    client.reset_timers(admin_token).await?;
    println!("Round timers reset");
    Ok(())
}

/// Run the round scheduler locally, synced to the server clock
///
/// # Errors
/// - Unknown track, invalid selection, zero bid, or server unreachable at start
pub async fn play(
    url: &str,
    user: &str,
    track: &str,
    bet: &str,
    amount: u64,
    rounds: u32,
) -> anyhow::Result<()> {
    let selection: Selection = bet.parse()?;
    if amount == 0 {
        bail!(RoundError::ZeroBid);
    }

    let config = NinebetsConfig::from_env();
    let Some(index) = config
        .clock
        .tracks
        .iter()
        .position(|candidate| candidate.label == track)
    else {
        bail!("Unknown round track: {track}");
    };

    let client = ServerClient::new(url)?;
    client
        .ensure_user(user)
        .await
        .with_context(|| format!("Cannot register user {user}"))?;
    let timers = client
        .fetch_timers()
        .await
        .context("Cannot read round timers")?;

    let mut scheduler = RoundScheduler::new(
        config.clock.tracks.clone(),
        &config.round,
        Box::new(RandomOutcomeGenerator::from_config(&config.draw)),
        Utc::now().date_naive(),
    )?;
    scheduler.sync(&timers, Utc::now());
    scheduler.select_track(index)?;

    let sink = Arc::new(HttpHistorySink::new(client.clone()));
    let handle = spawn_round_scheduler(
        scheduler,
        config.round.tick_interval,
        sink,
        user.to_string(),
    );

    let result = run_rounds(&handle, &client, selection, amount, rounds).await;
    if let Err(error) = handle.shutdown().await {
        tracing::debug!(%error, "Scheduler already stopped");
    }
    result
}

async fn run_rounds(
    handle: &RoundSchedulerHandle,
    client: &ServerClient,
    selection: Selection,
    amount: u64,
    rounds: u32,
) -> anyhow::Result<()> {
    let mut events = handle.subscribe();
    let mut resync = tokio::time::interval(RESYNC_INTERVAL);
    resync.tick().await;

    let mut bet_open = place(handle, selection, amount).await?;
    let mut settled = 0;

    while settled < rounds {
        tokio::select! {
            _ = resync.tick() => {
                match client.fetch_timers().await {
                    Ok(timers) => handle.sync(timers).await?,
                    Err(error) => tracing::warn!(%error, "Timer sync failed, keeping local countdown"),
                }
            }
            event = events.recv() => {
                match event {
                    Ok(RoundEvent::LockWindowOpened { period, .. }) => {
                        println!("Period {period}: bets locked");
                    }
                    Ok(RoundEvent::FinalCountdown { active: true }) => {
                        println!("Final countdown");
                    }
                    Ok(RoundEvent::Settled { period, record, .. }) => {
                        if let Some(record) = record {
                            println!(
                                "Period {period}: picked {}, drawn {} - {}",
                                record.selected, record.draw_number, record.result
                            );
                        }
                        if bet_open {
                            settled += 1;
                            bet_open = false;
                        }
                    }
                    Ok(RoundEvent::RoundStarted { period, .. }) => {
                        if settled < rounds {
                            println!("Period {period}: round started");
                            bet_open = place(handle, selection, amount).await?;
                        }
                    }
                    Ok(RoundEvent::FinalCountdown { active: false }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed scheduler events");
                    }
                    Err(RecvError::Closed) => bail!("Round scheduler stopped"),
                }
            }
        }
    }
    Ok(())
}

/// Places the bet, returning false when the round is already locked.
async fn place(
    handle: &RoundSchedulerHandle,
    selection: Selection,
    amount: u64,
) -> anyhow::Result<bool> {
    match handle.place_bet(selection, amount).await {
        Ok(()) => {
            println!("Bet placed: {selection} for {amount}");
            Ok(true)
        }
        Err(RoundError::BettingLocked { .. }) => {
            println!("Round locked, waiting for the next one");
            Ok(false)
        }
        Err(error) => Err(error.into()),
    }
}
