use std::time::Instant;

use chrono::Local;
use futures::future::join_all;
use tracing::{info, warn};

use crate::market_data::traits::{BulkSource, HistorySource, QuoteSource};
use crate::market_data::types::{PriceUpdates, Range};
use crate::metrics;
use crate::state::asset::{normalize_symbol, PriceBar};
use crate::state::store::{self, StoreHandle};

/// Bar count of the simulated fallback series when the history source
/// has nothing.
const FALLBACK_HISTORY_DAYS: usize = 30;

/// One full refresh cycle: fan out over the priority symbols on the
/// primary source, fetch the bulk payload, merge (primary wins on
/// collision), and apply everything to the store.
///
/// Per-symbol primary failures are absorbed here and only narrow the
/// merge. A bulk failure is surfaced to the caller, but whatever the
/// primary fan-out produced is applied first: partial success stays
/// visible and nothing is rolled back.
pub async fn refresh_market(
    primary: &dyn QuoteSource,
    bulk: &dyn BulkSource,
    handle: &StoreHandle,
    priority_symbols: &[String],
) -> anyhow::Result<()> {
    let started = Instant::now();

    let fetches = join_all(
        priority_symbols
            .iter()
            .map(|symbol| primary.fetch_quote(symbol)),
    )
    .await;

    let mut primary_prices = PriceUpdates::new();
    for (symbol, outcome) in priority_symbols.iter().zip(fetches) {
        match outcome {
            Ok(price) => {
                metrics::record_quote_fetch(symbol, "ok");
                primary_prices.insert(normalize_symbol(symbol), price);
            }
            Err(err) => {
                metrics::record_quote_fetch(symbol, "error");
                warn!(symbol = %symbol, error = %err, "primary quote fetch skipped");
            }
        }
    }

    let bulk_data = match bulk.fetch_bulk().await {
        Ok(data) => data,
        Err(err) => {
            // The editorial payload is lost, but the primary results
            // are still worth keeping on screen.
            store::apply_price_updates(handle, &primary_prices).await;
            metrics::record_refresh("bulk_error");
            return Err(err);
        }
    };

    let mut merged = bulk_data.prices;
    merged.extend(primary_prices);

    store::apply_price_updates(handle, &merged).await;
    store::replace_news(handle, bulk_data.news).await;
    store::replace_sources(handle, bulk_data.sources).await;
    store::set_last_sync_label(handle, Local::now().format("%H:%M:%S").to_string()).await;

    metrics::record_refresh("ok");
    metrics::record_refresh_latency_ms(started.elapsed().as_secs_f64() * 1_000.0);
    info!(prices = merged.len(), "market refresh applied");
    Ok(())
}

/// Daily bars for one symbol, preferring the real history source and
/// falling back to the store's simulated random walk. Never fails:
/// the fallback is pure local computation.
pub async fn load_history(
    source: &dyn HistorySource,
    handle: &StoreHandle,
    symbol: &str,
    range: Range,
) -> Vec<PriceBar> {
    match source.fetch_history(symbol, range).await {
        Ok(bars) => bars,
        Err(err) => {
            warn!(symbol = %symbol, error = %err, "history fetch failed, using simulated series");
            let mut store = handle.write().await;
            store.historical_series(symbol, FALLBACK_HISTORY_DAYS)
        }
    }
}
