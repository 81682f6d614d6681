//! Remote quote fetching.
//!
//! Defines the `QuoteFetcher` trait — the single boundary to the
//! generative-model data source — and its error taxonomy. The Gemini
//! implementation lives in `gemini`.

pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{BatchQuotes, Insight, Quote};

/// How a remote call failed. The scheduler treats the two cases very
/// differently: `RateLimited` aborts the whole cycle and starts a
/// cooldown, `Remote` skips only the chunk it happened on.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("remote quota exhausted")]
    RateLimited,
    #[error("remote call failed: {0}")]
    Remote(String),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }
}

/// Abstraction over the batch-quote endpoint.
///
/// Implementors turn a symbol list into current prices plus grounding
/// citations, and provide a separate single-shot advisory analysis call.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Fetch current quotes for a non-empty chunk of symbols.
    ///
    /// Retries once internally on a rate-limit signal (after a jittered
    /// delay) before surfacing `RateLimited`; any other failure surfaces
    /// immediately as `Remote` without retry.
    async fn fetch_batch(&self, symbols: &[String]) -> Result<BatchQuotes, FetchError>;

    /// One advisory call over a summary of the top holdings.
    /// Not batched and not retried at this layer.
    async fn analyze_portfolio(&self, holdings: &[Quote]) -> Result<Insight, FetchError>;
}
