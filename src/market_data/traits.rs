use async_trait::async_trait;

use crate::market_data::types::{BulkMarketData, Range};
use crate::state::asset::PriceBar;

/// Authoritative per-symbol quote fetch. Best-effort: each call may
/// fail independently without affecting the rest of a refresh cycle.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest traded price for one ticker, or an error when the source
    /// has no price for it.
    async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<f64>;
}

/// Best-effort batch fetch covering the whole tracked universe, plus
/// the editorial content (headlines, citations) that only this source
/// carries. Its failure is load-bearing and is surfaced to the caller.
#[async_trait]
pub trait BulkSource: Send + Sync {
    async fn fetch_bulk(&self) -> anyhow::Result<BulkMarketData>;
}

/// Daily-bar history for one symbol over a coarse window. A failure
/// here is never user-visible: callers recover with the store's
/// simulated series.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_history(&self, symbol: &str, range: Range) -> anyhow::Result<Vec<PriceBar>>;
}
