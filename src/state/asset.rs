use serde::{Deserialize, Serialize};

/// Instrument classification. Membership in one of the snapshot's three
/// sequences is fixed at seeding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Index,
    Stock,
    Commodity,
}

/// One tradable instrument tracked by the snapshot.
///
/// `symbol` is the exchange-style ticker and never changes after
/// seeding. `last_sync` stays `None` until the first successful remote
/// price sync stamps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    /// Absolute change since session open.
    pub change: f64,
    pub change_percent: f64,
    pub kind: AssetKind,
    pub category: Option<String>,
    pub sector: Option<String>,
    pub forecast_price: Option<f64>,
    pub market_cap: Option<String>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<String>,
    pub last_sync: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Editorial headline delivered alongside a bulk sync. News is replaced
/// wholesale on every successful sync, never merged item by item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub headline: String,
    pub source: String,
    /// Display label ("Live", "2h ago", ...), not a parseable timestamp.
    pub time: String,
    pub sentiment: Sentiment,
    pub impact_asset: Option<String>,
}

/// Citation record attached to a bulk sync (grounding source).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub uri: String,
}

/// A single daily bar, either fetched from the history source or drawn
/// from the simulated random walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    /// Short display label, e.g. "Mar 14".
    pub date: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// The complete in-memory market aggregate. Order within each sequence
/// is insertion order and is display-relevant; symbols are unique
/// across the union of the three sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub indices: Vec<Asset>,
    pub stocks: Vec<Asset>,
    pub commodities: Vec<Asset>,
    pub news: Vec<NewsItem>,
    pub sources: Vec<SourceRef>,
    /// UI-level "last synchronized" label, independent of the per-asset
    /// sync stamps.
    pub last_sync: Option<String>,
}

impl MarketSnapshot {
    /// All tracked assets in universe order: indices, stocks, commodities.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.indices
            .iter()
            .chain(self.stocks.iter())
            .chain(self.commodities.iter())
    }

    pub fn assets_mut(&mut self) -> impl Iterator<Item = &mut Asset> {
        self.indices
            .iter_mut()
            .chain(self.stocks.iter_mut())
            .chain(self.commodities.iter_mut())
    }
}

/// Canonical merge/lookup key for a ticker: uppercase, one leading
/// index marker (`^`) stripped, trailing futures suffix (`=F`) stripped.
/// Idempotent: normalizing an already-normalized symbol is a no-op.
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    let trimmed = upper.strip_prefix('^').unwrap_or(&upper);
    let trimmed = trimmed.strip_suffix("=F").unwrap_or(trimmed);
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_index_marker_and_futures_suffix() {
        assert_eq!(normalize_symbol("^GSPC"), "GSPC");
        assert_eq!(normalize_symbol("GC=F"), "GC");
        assert_eq!(normalize_symbol("aapl"), "AAPL");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_symbol("^GSPC");
        assert_eq!(normalize_symbol(&once), once);
        let once = normalize_symbol("SI=F");
        assert_eq!(normalize_symbol(&once), once);
    }
}
