//! Google Gemini quote fetcher.
//!
//! Implements `QuoteFetcher` against the `generateContent` endpoint with
//! the Google-Search grounding tool and a JSON response schema, so the
//! model answers with a parseable quote list instead of prose. Handles
//! rate-limit classification and the single jittered retry.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{FetchError, QuoteFetcher};
use crate::time::{Sleeper, TokioSleeper};
use crate::types::{BatchQuotes, Citation, Insight, Quote, QuoteUpdate};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const GEMINI_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// One retry on a rate-limit signal, then surface `RateLimited`.
const MAX_RATE_LIMIT_RETRIES: u32 = 1;

/// Retry wait is 3s plus up to 2s of jitter.
const RETRY_BASE_MS: u64 = 3000;
const RETRY_JITTER_MS: u64 = 2000;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default, rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(default, rename = "groundingChunks")]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

/// The structured payload the response schema asks for.
#[derive(Debug, Default, Deserialize)]
struct StocksPayload {
    #[serde(default)]
    stocks: Vec<QuoteUpdate>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
    sleeper: Arc<dyn Sleeper>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            http,
            api_base: GEMINI_API_BASE.to_string(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the retry-delay sleeper (tests inject a recording one).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Point the client at a stub endpoint.
    #[cfg(test)]
    fn with_api_base(mut self, base: String) -> Self {
        self.api_base = base;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    // -- Prompt and schema construction ----------------------------------

    /// Kept deliberately terse to reduce per-request token load.
    fn batch_prompt(symbols: &[String]) -> String {
        format!(
            "Thai Stocks: {}. Get current price and %change from Google Finance/SET. Output JSON.",
            symbols.join(", ")
        )
    }

    fn analysis_prompt(holdings: &[Quote]) -> String {
        let summary = holdings
            .iter()
            .map(|q| format!("{}:{}", q.symbol, q.price))
            .collect::<Vec<_>>()
            .join(",");
        format!("SET analysis: {summary}. JSON.")
    }

    fn batch_request(symbols: &[String]) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [{ "text": Self::batch_prompt(symbols) }] }],
            "tools": [{ "google_search": {} }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "stocks": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "symbol": { "type": "STRING" },
                                    "price": { "type": "NUMBER" },
                                    "changePercent": { "type": "NUMBER" },
                                    "lastTradeTime": { "type": "STRING" }
                                },
                                "required": ["symbol", "price", "changePercent"]
                            }
                        }
                    },
                    "required": ["stocks"]
                }
            }
        })
    }

    fn analysis_request(holdings: &[Quote]) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [{ "text": Self::analysis_prompt(holdings) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "summary": { "type": "STRING" },
                        "riskLevel": { "type": "STRING" },
                        "recommendations": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "symbol": { "type": "STRING" },
                                    "action": { "type": "STRING" },
                                    "reason": { "type": "STRING" }
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    // -- Transport -------------------------------------------------------

    /// One `generateContent` call, with the error taxonomy applied.
    async fn generate(&self, body: &serde_json::Value) -> Result<GenerateResponse, FetchError> {
        let url = format!("{}/{}:generateContent", self.api_base, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::Remote(format!("request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if is_quota_message(&text) {
                return Err(FetchError::RateLimited);
            }
            return Err(FetchError::Remote(format!("HTTP {status}: {text}")));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| FetchError::Remote(format!("unparseable response: {e}")))
    }

    // -- Response parsing ------------------------------------------------

    fn candidate_text(response: &GenerateResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    fn extract_citations(response: &GenerateResponse) -> Vec<Citation> {
        response
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| {
                m.grounding_chunks
                    .iter()
                    .filter_map(|chunk| {
                        let web = chunk.web.as_ref()?;
                        let uri = web.uri.clone().unwrap_or_default();
                        if uri.is_empty() {
                            return None;
                        }
                        Some(Citation {
                            title: web
                                .title
                                .clone()
                                .unwrap_or_else(|| "Google Finance".to_string()),
                            uri,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parse_batch(response: &GenerateResponse) -> BatchQuotes {
        let text = Self::candidate_text(response);
        let payload: StocksPayload = serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, "Quote payload did not parse, treating as empty");
            StocksPayload::default()
        });

        BatchQuotes {
            quotes: payload.stocks,
            citations: Self::extract_citations(response),
        }
    }
}

/// Provider errors signal quota pressure with several different words.
fn is_quota_message(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("429")
        || lower.contains("quota")
        || lower.contains("rate limit")
        || lower.contains("resource_exhausted")
}

// ---------------------------------------------------------------------------
// QuoteFetcher implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl QuoteFetcher for GeminiClient {
    async fn fetch_batch(&self, symbols: &[String]) -> Result<BatchQuotes, FetchError> {
        let body = Self::batch_request(symbols);

        for attempt in 0..=MAX_RATE_LIMIT_RETRIES {
            match self.generate(&body).await {
                Ok(response) => {
                    let batch = Self::parse_batch(&response);
                    debug!(
                        symbols = symbols.len(),
                        quotes = batch.quotes.len(),
                        citations = batch.citations.len(),
                        "Batch fetch complete"
                    );
                    return Ok(batch);
                }
                Err(FetchError::RateLimited) if attempt < MAX_RATE_LIMIT_RETRIES => {
                    let wait = RETRY_BASE_MS
                        + rand::thread_rng().gen_range(0..=RETRY_JITTER_MS);
                    warn!(attempt, wait_ms = wait, "Rate limited, retrying once");
                    self.sleeper.sleep(Duration::from_millis(wait)).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::RateLimited)
    }

    async fn analyze_portfolio(&self, holdings: &[Quote]) -> Result<Insight, FetchError> {
        let body = Self::analysis_request(holdings);
        let response = self.generate(&body).await?;

        let text = Self::candidate_text(&response);
        serde_json::from_str(&text)
            .map_err(|e| FetchError::Remote(format!("unparseable insight: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
