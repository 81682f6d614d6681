//! In-memory quote table with write-through persistence.
//!
//! Every mutation is followed by a full snapshot write before control
//! returns to the caller, so an external reader never observes a
//! mutated-but-unpersisted table. Persistence failures are logged and
//! swallowed — the worst case is a stale snapshot on disk.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::storage;
use crate::types::{Quote, QuoteUpdate};

/// The quote table. Ordered as seeded; symbols are unique.
pub struct QuoteBook {
    quotes: Vec<Quote>,
    snapshot_path: Option<String>,
}

impl QuoteBook {
    /// Build the table from seed quotes, overlaying a persisted snapshot
    /// if one exists and parses.
    ///
    /// The overlay is per-field: persisted keys win over seed defaults,
    /// so a stale snapshot missing a newly added field keeps the seed's
    /// value for it. Snapshot symbols absent from the seed are ignored;
    /// seed symbols absent from the snapshot keep their defaults.
    pub fn load_or_seed(seed: Vec<Quote>, snapshot_path: Option<&str>) -> Self {
        let persisted = storage::load_snapshot(snapshot_path)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Snapshot read failed, starting from seed");
                None
            });

        let quotes = match persisted {
            Some(snapshot) => overlay_snapshot(seed, &snapshot),
            None => seed,
        };

        Self {
            quotes,
            snapshot_path: snapshot_path.map(String::from),
        }
    }

    /// All quotes in seed order.
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// The full symbol universe in seed order.
    pub fn symbols(&self) -> Vec<String> {
        self.quotes.iter().map(|q| q.symbol.clone()).collect()
    }

    /// Look up a quote by symbol (case-insensitive).
    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes
            .iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
    }

    /// The first `n` quotes — the holdings summarised by advisory analysis.
    pub fn top_holdings(&self, n: usize) -> Vec<Quote> {
        self.quotes.iter().take(n).cloned().collect()
    }

    /// Apply a batch of remote updates, then persist the whole table.
    ///
    /// Fields update independently: a non-numeric or absent `price`
    /// leaves the stored price untouched even when `change_percent`
    /// lands, and vice versa. Any matched symbol flips to real-time.
    /// Updates for unknown symbols are ignored. Returns the number of
    /// quotes touched.
    pub fn apply_updates(&mut self, updates: &[QuoteUpdate], now: DateTime<Utc>) -> usize {
        let mut applied = 0usize;

        for update in updates {
            let Some(quote) = self
                .quotes
                .iter_mut()
                .find(|q| q.symbol.eq_ignore_ascii_case(&update.symbol))
            else {
                debug!(symbol = %update.symbol, "Update for unknown symbol ignored");
                continue;
            };

            if let Some(price) = update.price {
                quote.price = price;
            }
            if let Some(pct) = update.change_percent {
                quote.change_percent = pct;
            }
            quote.change = quote.prev_close * quote.change_percent / 100.0;
            quote.is_real_time = true;
            // Display time is local wall clock, not UTC.
            quote.last_updated = Some(
                update.last_trade_time.clone().unwrap_or_else(|| {
                    now.with_timezone(&chrono::Local).format("%H:%M:%S").to_string()
                }),
            );
            applied += 1;
        }

        self.persist();
        applied
    }

    /// Write the full table to the snapshot slot. Best-effort.
    pub fn persist(&self) {
        if let Err(e) = storage::save_snapshot(&self.quotes, self.snapshot_path.as_deref()) {
            warn!(error = %e, "Snapshot write failed, table is in memory only");
        }
    }
}

/// Overlay persisted JSON objects onto seed quotes, per field.
fn overlay_snapshot(seed: Vec<Quote>, snapshot: &serde_json::Value) -> Vec<Quote> {
    let entries = snapshot.as_array().cloned().unwrap_or_default();

    seed.into_iter()
        .map(|quote| {
            let persisted = entries.iter().find(|e| {
                e.get("symbol")
                    .and_then(|s| s.as_str())
                    .map(|s| s.eq_ignore_ascii_case(&quote.symbol))
                    .unwrap_or(false)
            });

            let Some(serde_json::Value::Object(overlay)) = persisted else {
                return quote;
            };

            let mut merged = match serde_json::to_value(&quote) {
                Ok(serde_json::Value::Object(m)) => m,
                _ => return quote,
            };
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }

            match serde_json::from_value(serde_json::Value::Object(merged)) {
                Ok(restored) => restored,
                Err(e) => {
                    warn!(symbol = %quote.symbol, error = %e,
                        "Persisted entry did not merge cleanly, keeping seed");
                    quote
                }
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
