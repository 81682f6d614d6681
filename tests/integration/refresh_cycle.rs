//! End-to-end refresh cycle tests.
//!
//! Drives the scheduler with a scripted fetcher, a manual clock, and a
//! recording sleeper, so whole cycles — pacing, quota aborts, cooldown
//! expiry — run instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use setpulse::fetch::FetchError;
use setpulse::scheduler::{AppContext, CycleOutcome, Scheduler, SchedulerConfig};
use setpulse::storage::delete_snapshot;
use setpulse::store::QuoteBook;
use setpulse::time::{Clock, ManualClock, RecordingSleeper};
use setpulse::types::Quote;
use setpulse::universe::{seed_quotes, QUICK_REFRESH_SYMBOLS};

use super::mock_fetcher::{batch, cite, insight, update, ScriptedFetcher};

const CHUNK_DELAY: Duration = Duration::from_secs(65);
const COOLDOWN: Duration = Duration::from_secs(600);

struct Harness {
    scheduler: Scheduler,
    ctx: Arc<AppContext>,
    fetcher: Arc<ScriptedFetcher>,
    clock: Arc<ManualClock>,
    sleeper: Arc<RecordingSleeper>,
}

fn harness(seed: Vec<Quote>, fetcher: ScriptedFetcher, chunk_size: usize) -> Harness {
    // Unique throwaway snapshot per harness keeps tests independent.
    let path = temp_path();
    harness_with_path(seed, fetcher, chunk_size, Some(&path))
}

fn harness_with_path(
    seed: Vec<Quote>,
    fetcher: ScriptedFetcher,
    chunk_size: usize,
    snapshot_path: Option<&str>,
) -> Harness {
    let book = QuoteBook::load_or_seed(seed, snapshot_path);
    let ctx = Arc::new(AppContext::new(book, Duration::from_secs(1800)));
    let fetcher = Arc::new(fetcher);
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let sleeper = Arc::new(RecordingSleeper::new());

    let scheduler = Scheduler::new(
        Arc::clone(&ctx),
        Arc::clone(&fetcher) as Arc<dyn setpulse::fetch::QuoteFetcher>,
        Arc::clone(&clock) as Arc<dyn setpulse::time::Clock>,
        Arc::clone(&sleeper) as Arc<dyn setpulse::time::Sleeper>,
        SchedulerConfig {
            chunk_size,
            chunk_delay: CHUNK_DELAY,
            cooldown: COOLDOWN,
        },
    );

    Harness {
        scheduler,
        ctx,
        fetcher,
        clock,
        sleeper,
    }
}

fn seed_n(n: usize) -> Vec<Quote> {
    seed_quotes().into_iter().take(n).collect()
}

fn temp_path() -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("setpulse_it_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

// ---------------------------------------------------------------------------
// Chunking and pacing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_universe_chunked_and_paced() {
    let h = harness(seed_quotes(), ScriptedFetcher::new(vec![]), 18);

    // Pre-tick the countdown so the reset at cycle exit is observable.
    h.ctx.sync.tick_countdown();
    h.ctx.sync.tick_countdown();

    let outcome = h.scheduler.run_cycle(None).await;
    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            applied: 0,
            chunks_skipped: 0,
            chunks_total: 4,
        }
    );

    // 55 symbols at 18 per call: 18 + 18 + 18 + 1.
    let requests = h.fetcher.requests();
    let sizes: Vec<_> = requests.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![18, 18, 18, 1]);

    // A delay between chunks, none after the last.
    assert_eq!(h.sleeper.waits(), vec![CHUNK_DELAY; 3]);

    // Cycle exit resets progress and the auto-refresh countdown.
    assert_eq!(h.ctx.sync.progress(), 0);
    assert_eq!(h.ctx.sync.next_refresh_secs(), 1800);
    assert!(!h.ctx.sync.is_running());
}

#[tokio::test]
async fn test_chunk_failure_does_not_block_the_rest() {
    let seed = seed_n(4);
    let later: Vec<String> = seed[2..].iter().map(|q| q.symbol.clone()).collect();
    let script = vec![
        Err(FetchError::Remote("model returned prose".into())),
        Ok(batch(
            vec![
                update(&later[0], 99.0, 1.0),
                update(&later[1], 88.0, 2.0),
            ],
            vec![],
        )),
    ];
    let h = harness(seed.clone(), ScriptedFetcher::new(script), 2);

    let outcome = h.scheduler.run_cycle(None).await;
    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            applied: 2,
            chunks_skipped: 1,
            chunks_total: 2,
        }
    );

    let book = h.ctx.book.read().await;
    // Failed chunk's symbols keep their seed values.
    assert!(!book.get(&seed[0].symbol).unwrap().is_real_time);
    assert!(!book.get(&seed[1].symbol).unwrap().is_real_time);
    // Succeeding chunk landed.
    assert_eq!(book.get(&later[0]).unwrap().price, 99.0);
    assert!(book.get(&later[1]).unwrap().is_real_time);
}

// ---------------------------------------------------------------------------
// Quota abort and cooldown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_quota_abort_stops_cycle_and_starts_cooldown() {
    let seed = seed_n(6);
    let first: String = seed[0].symbol.clone();
    let script = vec![
        Ok(batch(vec![update(&first, 50.0, 1.0)], vec![])),
        Err(FetchError::RateLimited),
    ];
    let h = harness(seed, ScriptedFetcher::new(script), 2);

    let outcome = h.scheduler.run_cycle(None).await;
    assert_eq!(outcome, CycleOutcome::Aborted);

    // Third chunk was never attempted.
    assert_eq!(h.fetcher.requests().len(), 2);
    // First chunk's successful updates survive the abort.
    assert_eq!(h.ctx.book.read().await.get(&first).unwrap().price, 50.0);
    // Cooldown runs the configured window.
    assert_eq!(
        h.ctx.sync.cooldown_remaining_secs(h.clock.now()),
        Some(COOLDOWN.as_secs() as i64)
    );
    assert!(!h.ctx.sync.is_running());
}

#[tokio::test]
async fn test_triggers_ignored_during_cooldown_then_resume() {
    let h = harness(
        seed_n(2),
        ScriptedFetcher::new(vec![Err(FetchError::RateLimited)]),
        18,
    );

    assert_eq!(h.scheduler.run_cycle(None).await, CycleOutcome::Aborted);

    // Mid-cooldown, every trigger bounces without touching the fetcher.
    h.clock.advance(chrono::Duration::seconds(599));
    assert_eq!(h.scheduler.run_cycle(None).await, CycleOutcome::Skipped);
    assert_eq!(h.fetcher.requests().len(), 1);

    // Past the deadline the window expires on its own.
    h.clock.advance(chrono::Duration::seconds(2));
    let outcome = h.scheduler.run_cycle(None).await;
    assert!(matches!(outcome, CycleOutcome::Completed { .. }));
    assert_eq!(h.ctx.sync.cooldown_remaining_secs(h.clock.now()), None);
}

#[tokio::test]
async fn test_analysis_failure_never_enters_cooldown() {
    let h = harness(
        seed_n(6),
        ScriptedFetcher::new(vec![]).with_analysis(vec![Err(FetchError::RateLimited)]),
        18,
    );

    assert!(h.scheduler.run_analysis().await.is_none());
    assert!(h.ctx.sync.insight().is_none());

    // The advisory failure is isolated: refreshes still run.
    assert_eq!(h.ctx.sync.cooldown_remaining_secs(h.clock.now()), None);
    let outcome = h.scheduler.run_cycle(None).await;
    assert!(matches!(outcome, CycleOutcome::Completed { .. }));
}

// ---------------------------------------------------------------------------
// Concurrency guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_second_trigger_rejected_while_cycle_in_flight() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        seed_n(2),
        ScriptedFetcher::new(vec![]).with_gate(Arc::clone(&gate)),
        18,
    );
    let scheduler = Arc::new(h.scheduler);

    let running = Arc::clone(&scheduler);
    let task = tokio::spawn(async move { running.run_cycle(None).await });

    // Let the spawned cycle claim the running flag and park at the gate.
    while !h.ctx.sync.is_running() {
        tokio::task::yield_now().await;
    }

    assert_eq!(scheduler.run_cycle(None).await, CycleOutcome::Skipped);

    gate.notify_one();
    let outcome = task.await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Completed { .. }));
    assert_eq!(h.fetcher.requests().len(), 1);
}

// ---------------------------------------------------------------------------
// Quick subset
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_quick_subset_refreshes_only_those_symbols() {
    let quick: Vec<String> = QUICK_REFRESH_SYMBOLS.iter().map(|s| s.to_string()).collect();
    let script = vec![Ok(batch(vec![update("HMPRO", 9.95, 0.5)], vec![]))];
    let h = harness(seed_quotes(), ScriptedFetcher::new(script), 18);

    let outcome = h.scheduler.run_cycle(Some(quick.clone())).await;
    assert!(matches!(
        outcome,
        CycleOutcome::Completed { applied: 1, chunks_total: 1, .. }
    ));

    // One chunk, exactly the quick list, no inter-chunk waits.
    assert_eq!(h.fetcher.requests(), vec![quick]);
    assert!(h.sleeper.waits().is_empty());

    let book = h.ctx.book.read().await;
    assert_eq!(book.get("HMPRO").unwrap().price, 9.95);
    // The rest of the universe is untouched.
    assert!(!book.get("PTT").unwrap().is_real_time);
}

#[tokio::test]
async fn test_empty_explicit_subset_is_a_no_op_cycle() {
    let h = harness(seed_quotes(), ScriptedFetcher::new(vec![]), 18);

    let outcome = h.scheduler.run_cycle(Some(Vec::new())).await;
    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            applied: 0,
            chunks_skipped: 0,
            chunks_total: 0,
        }
    );

    // Nothing was fetched and nothing is left running.
    assert!(h.fetcher.requests().is_empty());
    assert!(h.sleeper.waits().is_empty());
    assert!(!h.ctx.sync.is_running());
}

// ---------------------------------------------------------------------------
// Citations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_citations_roll_up_across_cycles() {
    let script = vec![
        Ok(batch(vec![], vec![cite("https://a"), cite("https://b")])),
        Ok(batch(vec![], vec![cite("https://b"), cite("https://c")])),
    ];
    let h = harness(seed_n(2), ScriptedFetcher::new(script), 18);

    h.scheduler.run_cycle(None).await;
    h.scheduler.run_cycle(None).await;

    let uris: Vec<_> = h.ctx.sync.sources().into_iter().map(|c| c.uri).collect();
    // Unique by URI; a re-seen source moves to the most-recent end.
    assert_eq!(uris, vec!["https://a", "https://b", "https://c"]);
}

// ---------------------------------------------------------------------------
// Persistence round trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let path = temp_path();
    {
        let script = vec![Ok(batch(vec![update("PTT", 36.5, 2.2)], vec![]))];
        let h = harness_with_path(seed_n(2), ScriptedFetcher::new(script), 18, Some(&path));
        h.scheduler.run_cycle(None).await;
    }

    // Fresh process: same seed, snapshot on disk.
    let book = QuoteBook::load_or_seed(seed_n(2), Some(&path));
    let q = book.get("PTT").unwrap();
    assert_eq!(q.price, 36.5);
    assert!(q.is_real_time);

    delete_snapshot(Some(&path)).unwrap();
}

// ---------------------------------------------------------------------------
// Advisory analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_analysis_summarises_top_holdings() {
    let h = harness(
        seed_quotes(),
        ScriptedFetcher::new(vec![])
            .with_analysis(vec![Ok(insight("defensive rotation underway", "MEDIUM"))]),
        18,
    );

    let result = h.scheduler.run_analysis().await.unwrap();
    assert_eq!(result.risk_level, "MEDIUM");
    assert_eq!(h.ctx.sync.insight().unwrap().summary, "defensive rotation underway");

    // Exactly the first five holdings go into the advisory call.
    let expected: Vec<String> = seed_quotes()
        .iter()
        .take(5)
        .map(|q| q.symbol.clone())
        .collect();
    assert_eq!(h.fetcher.analyzed(), vec![expected]);

    // The quote table itself is never written by analysis.
    let book = h.ctx.book.read().await;
    assert!(book.quotes().iter().all(|q| !q.is_real_time));
}
