//! SETPULSE — AI-grounded SET quote refresh service
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the quote snapshot from disk (seeded on first run), and
//! drives the countdown→refresh loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use setpulse::config;
use setpulse::dashboard;
use setpulse::dashboard::routes::DashboardState;
use setpulse::fetch::gemini::GeminiClient;
use setpulse::scheduler::{AppContext, Command, Scheduler};
use setpulse::storage;
use setpulse::store::QuoteBook;
use setpulse::time::{SystemClock, TokioSleeper};
use setpulse::universe::{seed_quotes, QUICK_REFRESH_SYMBOLS};

const BANNER: &str = r#"
 ____  _____ _____ ____  _   _ _     ____  _____
/ ___|| ____|_   _|  _ \| | | | |   / ___|| ____|
\___ \|  _|   | | | |_) | | | | |   \___ \|  _|
 ___) | |___  | | |  __/| |_| | |___ ___) | |___
|____/|_____| |_| |_|    \___/|_____|____/|_____|

  Stock Exchange of Thailand — live quote pulse
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        service_name = %cfg.service.name,
        refresh_interval_secs = cfg.service.refresh_interval_secs,
        chunk_size = cfg.service.chunk_size,
        model = %cfg.llm.model,
        "SETPULSE starting up"
    );

    // -- Restore or seed the quote book -----------------------------------

    let snapshot_path = cfg.storage.snapshot_path.clone();
    let book = QuoteBook::load_or_seed(seed_quotes(), snapshot_path.as_deref());
    info!(quotes = book.quotes().len(), "Quote book ready");

    // -- Initialise components -------------------------------------------

    let api_key = config::AppConfig::resolve_env(&cfg.llm.api_key_env)?;
    let fetcher = GeminiClient::new(api_key, Some(cfg.llm.model.clone()))?;

    let ctx = Arc::new(AppContext::new(book, cfg.refresh_interval()));
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&ctx),
        Arc::new(fetcher),
        Arc::new(SystemClock),
        Arc::new(TokioSleeper),
        cfg.scheduler_config(),
    ));

    // Dashboard triggers flow into the main loop over this channel.
    let (command_tx, mut command_rx) = tokio::sync::mpsc::channel::<Command>(8);

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(Arc::clone(&ctx), command_tx.clone()));
        dashboard::spawn_dashboard(state, cfg.dashboard.port)?;
    }

    // -- Main loop -------------------------------------------------------

    // One tick per second drives the refresh countdown the dashboard
    // displays; cycles run as spawned tasks so ticking never stalls.
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering main loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if ctx.sync.tick_countdown() {
                    info!("Auto-refresh countdown elapsed");
                    spawn_cycle(Arc::clone(&scheduler), None);
                }
            }
            Some(command) = command_rx.recv() => {
                match command {
                    Command::RefreshAll => spawn_cycle(Arc::clone(&scheduler), None),
                    Command::RefreshQuick => {
                        let subset = QUICK_REFRESH_SYMBOLS
                            .iter()
                            .map(|s| s.to_string())
                            .collect();
                        spawn_cycle(Arc::clone(&scheduler), Some(subset));
                    }
                    Command::Analyze => {
                        let scheduler = Arc::clone(&scheduler);
                        tokio::spawn(async move {
                            scheduler.run_analysis().await;
                        });
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Save the final snapshot
    {
        let book = ctx.book.read().await;
        if let Err(e) = storage::save_snapshot(book.quotes(), snapshot_path.as_deref()) {
            error!(error = %e, "Failed to save final snapshot");
        }
    }
    info!("SETPULSE shut down cleanly.");

    Ok(())
}

/// Fire a refresh cycle without blocking the countdown ticker. The
/// scheduler's own entry guard absorbs overlapping triggers.
fn spawn_cycle(scheduler: Arc<Scheduler>, subset: Option<Vec<String>>) {
    tokio::spawn(async move {
        let outcome = scheduler.run_cycle(subset).await;
        if outcome == setpulse::scheduler::CycleOutcome::Aborted {
            warn!("Refresh cycle aborted on quota exhaustion");
        }
    });
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("setpulse=info"));

    let json_logging = std::env::var("SETPULSE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
