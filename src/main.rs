use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;
use tracing::{info, warn};

use market_engine::config::Config;
use market_engine::market_data::adapters::search_bridge::SearchBridge;
use market_engine::market_data::adapters::yahoo::YahooSource;
use market_engine::market_data::refresh::refresh_market;
use market_engine::metrics;
use market_engine::state::store::{self, StoreHandle};

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .init();
}

async fn run_refresh_loop(config: Config, handle: StoreHandle) -> Result<()> {
    let yahoo = YahooSource::new(config.yahoo_base_url.clone());
    let bridge = SearchBridge::new(
        config.gemini_base_url.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    );

    let mut ticker = interval(Duration::from_secs(config.refresh_interval_secs));
    loop {
        // First tick fires immediately: sync once at startup.
        ticker.tick().await;
        if let Err(err) = refresh_market(&yahoo, &bridge, &handle, &config.priority_symbols).await
        {
            warn!(error = %err, "refresh cycle failed, snapshot stays stale");
        }
    }
}

/// Cosmetic liveness between remote refreshes: nudge every price a
/// little so the board moves.
async fn run_tick_loop(tick_interval_secs: u64, handle: StoreHandle) -> Result<()> {
    let mut ticker = interval(Duration::from_secs(tick_interval_secs));
    ticker.tick().await;
    loop {
        ticker.tick().await;
        store::advance_tick(&handle).await;
        metrics::record_tick();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    metrics::init_metrics_server();
    info!(
        refresh_secs = config.refresh_interval_secs,
        tick_secs = config.tick_interval_secs,
        "market-engine starting"
    );

    let handle = store::new_handle();

    let refresh_handle = tokio::spawn(run_refresh_loop(config.clone(), handle.clone()));
    let tick_handle = tokio::spawn(run_tick_loop(config.tick_interval_secs, handle.clone()));

    tokio::select! {
        res = refresh_handle => {
            match res {
                Ok(Ok(())) => warn!("refresh loop exited"),
                Ok(Err(err)) => warn!(error = %err, "refresh loop returned error"),
                Err(err) => warn!(error = %err, "refresh loop panicked"),
            }
        }
        res = tick_handle => {
            match res {
                Ok(Ok(())) => warn!("tick loop exited"),
                Ok(Err(err)) => warn!(error = %err, "tick loop returned error"),
                Err(err) => warn!(error = %err, "tick loop panicked"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl-C, shutting down");
        }
    }

    Ok(())
}
