//! Batch refresh scheduler — the orchestration core.
//!
//! Splits the symbol universe into fixed-size chunks, issues one remote
//! fetch per chunk with an inter-chunk delay, folds partial successes
//! into the quote book, and enters a timed cooldown when the provider
//! signals quota exhaustion. Chunks run strictly in order, one at a
//! time; at most one cycle is ever in flight.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::fetch::{FetchError, QuoteFetcher};
use crate::store::QuoteBook;
use crate::time::{Clock, Sleeper};
use crate::types::{Citation, Insight};
use crate::universe::ANALYSIS_TOP_N;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Rolling citation list keeps the most recent entries only.
const MAX_SOURCES: usize = 15;

/// Pacing parameters for one refresh cycle.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Symbols per remote call.
    pub chunk_size: usize,
    /// Fixed wait between chunks. Paces total request rate against the
    /// provider quota regardless of chunk count.
    pub chunk_delay: Duration,
    /// Backoff window entered on a quota abort.
    pub cooldown: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 18,
            chunk_delay: Duration::from_secs(65),
            cooldown: Duration::from_secs(600),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Process-wide scheduler state, shared with the dashboard for display.
pub struct SyncState {
    running: AtomicBool,
    analyzing: AtomicBool,
    /// Percentage of chunks completed in the in-flight cycle, 0 when idle.
    progress: AtomicU8,
    next_refresh_secs: AtomicI64,
    refresh_interval_secs: i64,
    cooldown_until: Mutex<Option<DateTime<Utc>>>,
    sources: Mutex<Vec<Citation>>,
    insight: Mutex<Option<Insight>>,
}

impl SyncState {
    pub fn new(refresh_interval: Duration) -> Self {
        let secs = refresh_interval.as_secs() as i64;
        Self {
            running: AtomicBool::new(false),
            analyzing: AtomicBool::new(false),
            progress: AtomicU8::new(0),
            next_refresh_secs: AtomicI64::new(secs),
            refresh_interval_secs: secs,
            cooldown_until: Mutex::new(None),
            sources: Mutex::new(Vec::new()),
            insight: Mutex::new(None),
        }
    }

    // -- Cycle guard -----------------------------------------------------

    /// Claim the running flag. Fails when a cycle is already in flight —
    /// concurrent triggers are rejected, not queued.
    fn begin_cycle(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn end_cycle(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn begin_analysis(&self) -> bool {
        self.analyzing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn end_analysis(&self) {
        self.analyzing.store(false, Ordering::SeqCst);
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing.load(Ordering::SeqCst)
    }

    // -- Cooldown --------------------------------------------------------

    /// Whether the quota cooldown is active. An expired window clears
    /// itself on the first check past its deadline.
    pub fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        let mut until = self.cooldown_until.lock().unwrap();
        match *until {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                *until = None;
                false
            }
            None => false,
        }
    }

    pub fn set_cooldown(&self, until: DateTime<Utc>) {
        *self.cooldown_until.lock().unwrap() = Some(until);
    }

    pub fn clear_cooldown(&self) {
        *self.cooldown_until.lock().unwrap() = None;
    }

    /// Seconds of cooldown left, if any.
    pub fn cooldown_remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let until = self.cooldown_until.lock().unwrap();
        until
            .map(|deadline| (deadline - now).num_seconds())
            .filter(|secs| *secs > 0)
    }

    // -- Progress --------------------------------------------------------

    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::SeqCst)
    }

    fn set_progress(&self, pct: u8) {
        self.progress.store(pct.min(100), Ordering::SeqCst);
    }

    // -- Periodic trigger countdown ---------------------------------------

    /// One-second tick. Returns true when the countdown hit zero, in
    /// which case it has already been reset to the full interval.
    pub fn tick_countdown(&self) -> bool {
        let prev = self.next_refresh_secs.fetch_sub(1, Ordering::SeqCst);
        if prev <= 1 {
            self.reset_countdown();
            true
        } else {
            false
        }
    }

    /// Reset to the full interval. Called at every cycle exit so manual
    /// and automatic refreshes never double up back-to-back.
    pub fn reset_countdown(&self) {
        self.next_refresh_secs
            .store(self.refresh_interval_secs, Ordering::SeqCst);
    }

    pub fn next_refresh_secs(&self) -> i64 {
        self.next_refresh_secs.load(Ordering::SeqCst).max(0)
    }

    // -- Citations -------------------------------------------------------

    /// Merge citations into the rolling set: unique by URI, a re-seen URI
    /// replaces its old entry and moves to the most-recent end, then the
    /// set is trimmed from the oldest end to the cap.
    pub fn merge_sources(&self, incoming: Vec<Citation>) {
        let mut sources = self.sources.lock().unwrap();
        for citation in incoming {
            if citation.uri.is_empty() {
                continue;
            }
            sources.retain(|s| s.uri != citation.uri);
            sources.push(citation);
        }
        let overflow = sources.len().saturating_sub(MAX_SOURCES);
        if overflow > 0 {
            sources.drain(..overflow);
        }
    }

    pub fn sources(&self) -> Vec<Citation> {
        self.sources.lock().unwrap().clone()
    }

    // -- Advisory insight ------------------------------------------------

    pub fn set_insight(&self, insight: Insight) {
        *self.insight.lock().unwrap() = Some(insight);
    }

    pub fn insight(&self) -> Option<Insight> {
        self.insight.lock().unwrap().clone()
    }
}

/// The one context object owning the quote book and scheduler state.
/// Everything that drives or observes the system goes through this.
pub struct AppContext {
    pub book: RwLock<QuoteBook>,
    pub sync: SyncState,
}

impl AppContext {
    pub fn new(book: QuoteBook, refresh_interval: Duration) -> Self {
        Self {
            book: RwLock::new(book),
            sync: SyncState::new(refresh_interval),
        }
    }
}

/// User-facing controls forwarded from the dashboard into the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RefreshAll,
    RefreshQuick,
    Analyze,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// How one cycle invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Entry guard rejected the trigger (already running or cooling down).
    Skipped,
    /// All chunks were attempted; some may have been skipped on
    /// non-quota failures.
    Completed {
        applied: usize,
        chunks_skipped: usize,
        chunks_total: usize,
    },
    /// Quota abort — remaining chunks were not attempted and the
    /// cooldown window is active.
    Aborted,
}

pub struct Scheduler {
    ctx: Arc<AppContext>,
    fetcher: Arc<dyn QuoteFetcher>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    cfg: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        ctx: Arc<AppContext>,
        fetcher: Arc<dyn QuoteFetcher>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        cfg: SchedulerConfig,
    ) -> Self {
        Self {
            ctx,
            fetcher,
            clock,
            sleeper,
            cfg,
        }
    }

    pub fn context(&self) -> Arc<AppContext> {
        Arc::clone(&self.ctx)
    }

    /// Run one refresh cycle over `subset`, or the full universe
    /// snapshotted at cycle start when `subset` is `None`.
    pub async fn run_cycle(&self, subset: Option<Vec<String>>) -> CycleOutcome {
        let sync = &self.ctx.sync;

        // Entry guard: a busy or cooling-down scheduler absorbs the
        // trigger with no side effects.
        if sync.in_cooldown(self.clock.now()) {
            debug!("Refresh trigger ignored: cooldown active");
            return CycleOutcome::Skipped;
        }
        if !sync.begin_cycle() {
            debug!("Refresh trigger ignored: cycle already running");
            return CycleOutcome::Skipped;
        }

        // An explicit subset always wins, even when empty: an empty
        // subset is a zero-chunk cycle, not a full refresh.
        let symbols = match subset {
            Some(list) => list,
            None => self.ctx.book.read().await.symbols(),
        };
        let chunks: Vec<Vec<String>> = symbols
            .chunks(self.cfg.chunk_size)
            .map(|c| c.to_vec())
            .collect();
        let chunks_total = chunks.len();

        info!(
            symbols = symbols.len(),
            chunks = chunks_total,
            "Refresh cycle starting"
        );
        sync.set_progress(0);

        let mut applied = 0usize;
        let mut chunks_skipped = 0usize;
        let mut aborted = false;

        for (i, chunk) in chunks.iter().enumerate() {
            match self.fetcher.fetch_batch(chunk).await {
                Ok(batch) => {
                    if !batch.quotes.is_empty() {
                        let mut book = self.ctx.book.write().await;
                        applied += book.apply_updates(&batch.quotes, self.clock.now());
                    }
                    if !batch.citations.is_empty() {
                        sync.merge_sources(batch.citations);
                    }
                }
                Err(FetchError::RateLimited) => {
                    // Continuing is guaranteed to make things worse:
                    // abort the whole cycle and back off.
                    let until = self.clock.now()
                        + chrono::Duration::from_std(self.cfg.cooldown)
                            .unwrap_or_else(|_| chrono::Duration::seconds(600));
                    warn!(
                        chunk = i,
                        cooldown_secs = self.cfg.cooldown.as_secs(),
                        "Quota exhausted, aborting cycle and entering cooldown"
                    );
                    sync.set_cooldown(until);
                    aborted = true;
                    break;
                }
                Err(FetchError::Remote(e)) => {
                    // One bad chunk never blocks the others.
                    warn!(
                        chunk = i,
                        symbols = chunk.join(","),
                        error = %e,
                        "Chunk failed, skipping it"
                    );
                    chunks_skipped += 1;
                }
            }

            let done = i + 1;
            sync.set_progress((100.0 * done as f64 / chunks_total as f64).round() as u8);

            if done < chunks_total {
                self.sleeper.sleep(self.cfg.chunk_delay).await;
            }
        }

        if !aborted {
            sync.clear_cooldown();
        }
        sync.set_progress(0);
        sync.reset_countdown();
        sync.end_cycle();

        if aborted {
            CycleOutcome::Aborted
        } else {
            info!(
                applied,
                chunks_skipped, chunks_total, "Refresh cycle complete"
            );
            CycleOutcome::Completed {
                applied,
                chunks_skipped,
                chunks_total,
            }
        }
    }

    /// One advisory analysis over the top holdings. Informational only:
    /// failures are logged, never enter cooldown, and never touch the
    /// quote book.
    pub async fn run_analysis(&self) -> Option<Insight> {
        let sync = &self.ctx.sync;

        if sync.in_cooldown(self.clock.now()) {
            debug!("Analysis trigger ignored: cooldown active");
            return None;
        }
        if !sync.begin_analysis() {
            debug!("Analysis trigger ignored: already analyzing");
            return None;
        }

        let holdings = self.ctx.book.read().await.top_holdings(ANALYSIS_TOP_N);
        let result = self.fetcher.analyze_portfolio(&holdings).await;
        sync.end_analysis();

        match result {
            Ok(insight) => {
                info!(
                    risk = %insight.risk_level,
                    recommendations = insight.recommendations.len(),
                    "Advisory analysis complete"
                );
                sync.set_insight(insight.clone());
                Some(insight)
            }
            Err(e) => {
                warn!(error = %e, "Advisory analysis failed");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
