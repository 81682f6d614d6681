//! Shared types for the SETPULSE service.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that store, fetch, scheduler,
//! and dashboard modules can depend on them without circular references.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// One tracked ticker. `symbol` is the primary key (uppercase).
///
/// A quote always carries either its seed value or the most recent
/// *successful* remote update; a failed or skipped fetch never touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub full_name: String,
    pub sector: String,
    pub price: f64,
    /// Reference close, set at seeding. Immutable thereafter.
    pub prev_close: f64,
    /// Absolute change, recomputed as `prev_close * change_percent / 100`
    /// on every remote update.
    pub change: f64,
    pub change_percent: f64,
    pub volume: String,
    pub market_cap: String,
    /// False until at least one successful remote update landed.
    #[serde(default)]
    pub is_real_time: bool,
    /// Local trade-time string, set on successful update only.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ฿{:.2} ({:+.2}%){}",
            self.symbol,
            self.price,
            self.change_percent,
            if self.is_real_time { " [live]" } else { "" },
        )
    }
}

impl Quote {
    /// Helper to build a test quote with sensible defaults.
    #[cfg(test)]
    pub fn sample(symbol: &str, price: f64, prev_close: f64) -> Self {
        Quote {
            symbol: symbol.to_string(),
            full_name: format!("{symbol} Public Company"),
            sector: "Energy".to_string(),
            price,
            prev_close,
            change: price - prev_close,
            change_percent: (price - prev_close) / prev_close * 100.0,
            volume: "1.0M".to_string(),
            market_cap: "10B".to_string(),
            is_real_time: false,
            last_updated: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote payloads
// ---------------------------------------------------------------------------

/// One quote record as returned by the remote model.
///
/// Only `symbol` is trusted; price fields are lenient because the model
/// occasionally emits strings or omits values. A non-numeric field
/// deserializes to `None` and leaves the stored value untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteUpdate {
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub last_trade_time: Option<String>,
}

/// Deserialize a JSON value into `Some(f64)` only when it is numeric.
/// Strings, nulls, and anything else become `None` instead of an error.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

/// Provenance record returned alongside fetched quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

/// Result of one batch fetch: quote updates plus grounding citations.
#[derive(Debug, Clone, Default)]
pub struct BatchQuotes {
    pub quotes: Vec<QuoteUpdate>,
    pub citations: Vec<Citation>,
}

// ---------------------------------------------------------------------------
// Advisory analysis
// ---------------------------------------------------------------------------

/// Advisory portfolio insight. Purely informational — never written back
/// into the quote table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default)]
    pub symbol: String,
    /// "BUY" | "SELL" | "HOLD" — kept as a string, the model is not
    /// guaranteed to stick to the enum.
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
