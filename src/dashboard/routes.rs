//! Dashboard API route handlers.
//!
//! All endpoints return JSON. Read endpoints observe the shared
//! `AppContext`; trigger endpoints forward commands into the runtime
//! over a bounded channel and never wait on a cycle themselves.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::scheduler::{AppContext, Command};
use crate::types::{Citation, Insight, Quote};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub ctx: Arc<AppContext>,
    pub commands: mpsc::Sender<Command>,
}

impl DashboardState {
    pub fn new(ctx: Arc<AppContext>, commands: mpsc::Sender<Command>) -> Self {
        Self { ctx, commands }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub analyzing: bool,
    pub progress: u8,
    pub next_refresh_secs: i64,
    pub cooldown: bool,
    pub cooldown_remaining_secs: Option<i64>,
    pub quotes_tracked: usize,
    pub live_quotes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerResponse {
    pub accepted: bool,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/quotes
pub async fn get_quotes(State(state): State<AppState>) -> Json<Vec<Quote>> {
    let book = state.ctx.book.read().await;
    Json(book.quotes().to_vec())
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let now = chrono::Utc::now();
    let sync = &state.ctx.sync;
    let book = state.ctx.book.read().await;
    let live = book.quotes().iter().filter(|q| q.is_real_time).count();

    Json(StatusResponse {
        running: sync.is_running(),
        analyzing: sync.is_analyzing(),
        progress: sync.progress(),
        next_refresh_secs: sync.next_refresh_secs(),
        cooldown: sync.cooldown_remaining_secs(now).is_some(),
        cooldown_remaining_secs: sync.cooldown_remaining_secs(now),
        quotes_tracked: book.quotes().len(),
        live_quotes: live,
    })
}

/// GET /api/sources
pub async fn get_sources(State(state): State<AppState>) -> Json<Vec<Citation>> {
    Json(state.ctx.sync.sources())
}

/// GET /api/insight
pub async fn get_insight(State(state): State<AppState>) -> Json<Option<Insight>> {
    Json(state.ctx.sync.insight())
}

/// POST /api/refresh
pub async fn post_refresh(State(state): State<AppState>) -> Json<TriggerResponse> {
    forward(&state, Command::RefreshAll)
}

/// POST /api/refresh/quick
pub async fn post_refresh_quick(State(state): State<AppState>) -> Json<TriggerResponse> {
    forward(&state, Command::RefreshQuick)
}

/// POST /api/analyze
pub async fn post_analyze(State(state): State<AppState>) -> Json<TriggerResponse> {
    forward(&state, Command::Analyze)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Triggers are fire-and-forget: a full channel means the runtime is
/// already saturated with work, so the trigger is dropped, not queued.
fn forward(state: &AppState, command: Command) -> Json<TriggerResponse> {
    let accepted = state.commands.try_send(command).is_ok();
    Json(TriggerResponse { accepted })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
