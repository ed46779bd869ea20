use std::sync::Arc;

use chrono::{Days, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;

use crate::market_data::types::PriceUpdates;
use crate::state::asset::{
    normalize_symbol, Asset, AssetKind, MarketSnapshot, NewsItem, PriceBar, SourceRef,
};

/// Per-tick volatility constants for the simulated ticker. Tuning
/// choices, not a contract: indices move less than single names.
const TICK_VOL_INDEX: f64 = 0.0001;
const TICK_VOL_OTHER: f64 = 0.0003;

/// Daily volatility of the simulated history random walk.
const HISTORY_VOL: f64 = 0.012;

/// Owner of the canonical market snapshot.
///
/// Exactly one writer is active at a time by construction (cooperative
/// scheduling); the store itself takes `&mut self` and never locks.
/// All mutation goes through the methods here so the per-asset sync
/// stamp invariant holds.
#[derive(Debug)]
pub struct SnapshotStore {
    data: MarketSnapshot,
    rng: StdRng,
}

impl SnapshotStore {
    /// Store over the seed universe with entropy-seeded randomness.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Store with an injected RNG, for reproducible simulation output.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            data: seed_universe(),
            rng,
        }
    }

    /// Shared view of the current aggregate. Not a stable copy: re-fetch
    /// after any mutating call.
    pub fn snapshot(&self) -> &MarketSnapshot {
        &self.data
    }

    /// Look up one asset by normalized symbol, falling back to an exact
    /// raw-symbol match. On a (not expected in seed data) normalization
    /// collision the first match in indices, stocks, commodities order
    /// wins.
    pub fn asset(&self, symbol: &str) -> Option<&Asset> {
        let key = normalize_symbol(symbol);
        self.data
            .assets()
            .find(|a| normalize_symbol(&a.symbol) == key || a.symbol == symbol)
    }

    /// Every asset whose symbol or name contains `query`
    /// case-insensitively, in universe order. An empty query matches
    /// everything; minimum-length policy is the caller's concern.
    pub fn search(&self, query: &str) -> Vec<&Asset> {
        let q = query.to_lowercase();
        self.data
            .assets()
            .filter(|a| {
                a.symbol.to_lowercase().contains(&q) || a.name.to_lowercase().contains(&q)
            })
            .collect()
    }

    /// Apply one merged price-update mapping in a single pass.
    ///
    /// Each asset is matched in `updates` by its normalized symbol
    /// first, then by its raw symbol. Matched assets get the new price
    /// rounded to two decimals and a fresh wall-clock sync stamp;
    /// everything else is untouched. Non-positive prices are rejected
    /// per entry (the mapping contract is positive reals), an empty
    /// mapping is a no-op, and the operation never fails.
    pub fn apply_price_updates(&mut self, updates: &PriceUpdates) {
        if updates.is_empty() {
            return;
        }
        let now = Local::now().format("%H:%M:%S").to_string();
        for asset in self.data.assets_mut() {
            let matched = updates
                .get(&normalize_symbol(&asset.symbol))
                .or_else(|| updates.get(&asset.symbol));
            if let Some(price) = matched.filter(|p| **p > 0.0) {
                asset.price = round2(*price);
                asset.last_sync = Some(now.clone());
            }
        }
    }

    /// Wholesale replacement of the news sequence. No merge, no
    /// de-duplication.
    pub fn replace_news(&mut self, news: Vec<NewsItem>) {
        self.data.news = news;
    }

    /// Wholesale replacement of the citation records.
    pub fn replace_sources(&mut self, sources: Vec<SourceRef>) {
        self.data.sources = sources;
    }

    /// Snapshot-level "last synchronized" display label, independent of
    /// the per-asset stamps.
    pub fn set_last_sync_label(&mut self, label: String) {
        self.data.last_sync = Some(label);
    }

    /// One step of the cosmetic liveness simulator: a small symmetric
    /// perturbation scaled by price and instrument kind is added to
    /// price and cumulative change, and percent change is recomputed as
    /// `change / (price - change) * 100`.
    ///
    /// Known gap: there is no price floor, so a long pathological run
    /// of draws can in principle walk a price to zero or below. Never a
    /// source of truth for valuation.
    pub fn advance_tick(&mut self) -> &MarketSnapshot {
        // Borrow split: draw all perturbations before touching assets.
        let draws: Vec<f64> = (0..self.data.assets().count())
            .map(|_| self.rng.r#gen::<f64>() - 0.5)
            .collect();
        for (asset, draw) in self.data.assets_mut().zip(draws) {
            let vol = match asset.kind {
                AssetKind::Index => TICK_VOL_INDEX,
                AssetKind::Stock | AssetKind::Commodity => TICK_VOL_OTHER,
            };
            let delta = asset.price * draw * vol;
            asset.price = round2(asset.price + delta);
            asset.change = round2(asset.change + delta);
            asset.change_percent = round2(asset.change / (asset.price - asset.change) * 100.0);
        }
        &self.data
    }

    /// `count + 1` daily bars ending today, generated by a geometric
    /// random walk from the asset's current price. Simulation fallback
    /// only: independent randomness on every call, allowed to diverge
    /// from any real history. Unknown symbols yield an empty series.
    pub fn historical_series(&mut self, symbol: &str, count: usize) -> Vec<PriceBar> {
        let Some(start) = self.asset(symbol).map(|a| a.price) else {
            return Vec::new();
        };
        let today = Local::now().date_naive();
        let mut price = start;
        let mut bars = Vec::with_capacity(count + 1);
        for back in (0..=count as u64).rev() {
            let date = today
                .checked_sub_days(Days::new(back))
                .unwrap_or(today)
                .format("%b %-d")
                .to_string();
            price *= 1.0 + (self.rng.r#gen::<f64>() - 0.5) * HISTORY_VOL;
            let open = round2(price * (1.0 + (self.rng.r#gen::<f64>() - 0.5) * 0.01));
            bars.push(PriceBar {
                date,
                price: round2(price),
                open,
                high: round2(price * 1.01),
                low: round2(price * 0.99),
                close: round2(price),
                volume: self.rng.gen_range(1_000_000..6_000_000),
            });
        }
        bars
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The fixed universe seeded at process start: one index, twelve large
/// caps, two metals futures. Never grows or shrinks during a session.
fn seed_universe() -> MarketSnapshot {
    let stock = |symbol: &str,
                 name: &str,
                 price: f64,
                 change: f64,
                 pct: f64,
                 sector: &str,
                 cap: &str,
                 pe: f64,
                 div: Option<&str>,
                 forecast: f64| Asset {
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        change,
        change_percent: pct,
        kind: AssetKind::Stock,
        category: Some("S&P 500".to_string()),
        sector: Some(sector.to_string()),
        forecast_price: Some(forecast),
        market_cap: Some(cap.to_string()),
        pe_ratio: Some(pe),
        dividend_yield: div.map(str::to_string),
        last_sync: None,
    };

    MarketSnapshot {
        indices: vec![Asset {
            symbol: "^GSPC".to_string(),
            name: "S&P 500 Index".to_string(),
            price: 5123.45,
            change: 12.30,
            change_percent: 0.24,
            kind: AssetKind::Index,
            category: Some("S&P 500".to_string()),
            sector: None,
            forecast_price: Some(5250.00),
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            last_sync: None,
        }],
        stocks: vec![
            stock("AAPL", "Apple Inc.", 189.45, 1.25, 0.67, "Technology", "3.2T", 28.4, Some("1.2%"), 195.50),
            stock("MSFT", "Microsoft Corp.", 415.20, -2.30, -0.55, "Technology", "3.0T", 35.1, Some("0.8%"), 430.00),
            stock("NVDA", "NVIDIA Corp.", 875.30, 15.40, 1.79, "Technology", "2.1T", 74.2, Some("0.02%"), 920.00),
            stock("GOOGL", "Alphabet Inc.", 152.30, 0.85, 0.56, "Technology", "1.9T", 24.5, None, 165.00),
            stock("META", "Meta Platforms", 485.10, 5.20, 1.08, "Technology", "1.2T", 32.1, None, 510.00),
            stock("AMZN", "Amazon.com Inc.", 178.20, 0.45, 0.25, "Technology", "1.8T", 58.3, None, 195.00),
            stock("TSLA", "Tesla, Inc.", 175.40, -3.20, -1.79, "Consumer Cyclical", "550B", 45.1, None, 160.00),
            stock("JPM", "JPMorgan Chase", 188.45, 1.15, 0.61, "Financials", "540B", 11.2, Some("2.4%"), 195.00),
            stock("LLY", "Eli Lilly", 755.30, 12.40, 1.67, "Healthcare", "710B", 124.5, Some("0.6%"), 800.00),
            stock("UNH", "UnitedHealth Group", 485.20, -4.10, -0.84, "Healthcare", "450B", 19.4, Some("1.5%"), 505.00),
            stock("V", "Visa Inc.", 278.30, -0.45, -0.16, "Financials", "570B", 31.5, Some("0.7%"), 290.00),
            stock("XOM", "Exxon Mobil", 115.40, 1.25, 1.09, "Energy", "460B", 12.8, Some("3.2%"), 125.00),
        ],
        commodities: vec![
            Asset {
                symbol: "GC=F".to_string(),
                name: "Gold Continuous".to_string(),
                price: 2165.40,
                change: 15.20,
                change_percent: 0.71,
                kind: AssetKind::Commodity,
                category: Some("Gold".to_string()),
                sector: None,
                forecast_price: Some(2250.00),
                market_cap: None,
                pe_ratio: None,
                dividend_yield: None,
                last_sync: None,
            },
            Asset {
                symbol: "SI=F".to_string(),
                name: "Silver Continuous".to_string(),
                price: 24.85,
                change: 0.12,
                change_percent: 0.48,
                kind: AssetKind::Commodity,
                category: Some("Silver".to_string()),
                sector: None,
                forecast_price: Some(28.50),
                market_cap: None,
                pe_ratio: None,
                dividend_yield: None,
                last_sync: None,
            },
        ],
        news: Vec::new(),
        sources: Vec::new(),
        last_sync: None,
    }
}

// ── Shared handle ────────────────────────────────────────────────

pub type StoreHandle = Arc<RwLock<SnapshotStore>>;

pub fn new_handle() -> StoreHandle {
    Arc::new(RwLock::new(SnapshotStore::new()))
}

pub async fn apply_price_updates(handle: &StoreHandle, updates: &PriceUpdates) {
    let mut store = handle.write().await;
    store.apply_price_updates(updates);
}

pub async fn replace_news(handle: &StoreHandle, news: Vec<NewsItem>) {
    let mut store = handle.write().await;
    store.replace_news(news);
}

pub async fn replace_sources(handle: &StoreHandle, sources: Vec<SourceRef>) {
    let mut store = handle.write().await;
    store.replace_sources(sources);
}

pub async fn set_last_sync_label(handle: &StoreHandle, label: String) {
    let mut store = handle.write().await;
    store.set_last_sync_label(label);
}

pub async fn advance_tick(handle: &StoreHandle) {
    let mut store = handle.write().await;
    store.advance_tick();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn seeded_store() -> SnapshotStore {
        SnapshotStore::with_rng(StdRng::seed_from_u64(7))
    }

    #[test]
    fn every_seeded_symbol_round_trips_through_lookup() {
        let store = seeded_store();
        let symbols: Vec<String> = store
            .snapshot()
            .assets()
            .map(|a| a.symbol.clone())
            .collect();
        for symbol in symbols {
            let found = store.asset(&symbol).expect("seeded asset must resolve");
            assert_eq!(found.symbol, symbol);
        }
    }

    #[test]
    fn empty_update_mapping_is_a_no_op() {
        let mut store = seeded_store();
        let before: Vec<(f64, Option<String>)> = store
            .snapshot()
            .assets()
            .map(|a| (a.price, a.last_sync.clone()))
            .collect();

        store.apply_price_updates(&HashMap::new());

        let after: Vec<(f64, Option<String>)> = store
            .snapshot()
            .assets()
            .map(|a| (a.price, a.last_sync.clone()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn targeted_update_touches_only_the_matched_asset() {
        let mut store = seeded_store();
        let before: Vec<f64> = store.snapshot().assets().map(|a| a.price).collect();

        let updates = HashMap::from([("AAPL".to_string(), 200.00)]);
        store.apply_price_updates(&updates);

        let aapl = store.asset("AAPL").unwrap();
        assert_eq!(aapl.price, 200.00);
        assert!(aapl.last_sync.as_deref().is_some_and(|s| !s.is_empty()));

        for (asset, old_price) in store.snapshot().assets().zip(before) {
            if asset.symbol != "AAPL" {
                assert_eq!(asset.price, old_price);
                assert!(asset.last_sync.is_none());
            }
        }
    }

    #[test]
    fn non_positive_prices_are_rejected_without_a_sync_stamp() {
        let mut store = seeded_store();
        let aapl_before = store.asset("AAPL").unwrap().price;
        let msft_before = store.asset("MSFT").unwrap().price;

        let updates = HashMap::from([
            ("AAPL".to_string(), 0.0),
            ("MSFT".to_string(), -12.5),
            ("NVDA".to_string(), 900.0),
        ]);
        store.apply_price_updates(&updates);

        let aapl = store.asset("AAPL").unwrap();
        assert_eq!(aapl.price, aapl_before);
        assert!(aapl.last_sync.is_none());

        let msft = store.asset("MSFT").unwrap();
        assert_eq!(msft.price, msft_before);
        assert!(msft.last_sync.is_none());

        // Valid entries in the same mapping still land.
        assert_eq!(store.asset("NVDA").unwrap().price, 900.0);
    }

    #[test]
    fn applied_prices_are_rounded_to_two_decimals() {
        let mut store = seeded_store();
        let updates = HashMap::from([("MSFT".to_string(), 410.12345)]);
        store.apply_price_updates(&updates);
        assert_eq!(store.asset("MSFT").unwrap().price, 410.12);
    }

    #[test]
    fn lookup_accepts_raw_and_normalized_forms() {
        let store = seeded_store();
        let by_raw = store.asset("^GSPC").unwrap().symbol.clone();
        let by_stripped = store.asset("GSPC").unwrap().symbol.clone();
        assert_eq!(by_raw, by_stripped);

        let gold_raw = store.asset("GC=F").unwrap().symbol.clone();
        let gold_stripped = store.asset("GC").unwrap().symbol.clone();
        assert_eq!(gold_raw, gold_stripped);
    }

    #[test]
    fn search_is_case_insensitive() {
        let store = seeded_store();
        let lower: Vec<String> = store.search("nvda").iter().map(|a| a.symbol.clone()).collect();
        let upper: Vec<String> = store.search("NVDA").iter().map(|a| a.symbol.clone()).collect();
        assert_eq!(lower, upper);
        assert_eq!(lower, vec!["NVDA".to_string()]);
    }

    #[test]
    fn search_matches_names_too() {
        let store = seeded_store();
        let hits: Vec<String> = store.search("gold").iter().map(|a| a.symbol.clone()).collect();
        assert_eq!(hits, vec!["GC=F".to_string()]);
    }

    #[test]
    fn tick_preserves_universe_membership_and_order() {
        let mut store = seeded_store();
        let before: Vec<String> = store
            .snapshot()
            .assets()
            .map(|a| a.symbol.clone())
            .collect();

        for _ in 0..50 {
            store.advance_tick();
        }

        let after: Vec<String> = store
            .snapshot()
            .assets()
            .map(|a| a.symbol.clone())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn tick_moves_at_most_numeric_fields() {
        let mut store = seeded_store();
        let names: Vec<Option<String>> =
            store.snapshot().assets().map(|a| a.sector.clone()).collect();
        store.advance_tick();
        let names_after: Vec<Option<String>> =
            store.snapshot().assets().map(|a| a.sector.clone()).collect();
        assert_eq!(names, names_after);
    }

    #[test]
    fn simulated_history_has_exact_length_and_positive_prices() {
        let mut store = seeded_store();
        let bars = store.historical_series("AAPL", 30);
        assert_eq!(bars.len(), 31);
        for bar in &bars {
            assert!(bar.price > 0.0);
            assert!(bar.volume >= 1_000_000);
        }
    }

    #[test]
    fn simulated_history_for_unknown_symbol_is_empty() {
        let mut store = seeded_store();
        assert!(store.historical_series("ZZZZ", 30).is_empty());
    }
}
