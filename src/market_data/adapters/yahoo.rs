use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::market_data::traits::{HistorySource, QuoteSource};
use crate::market_data::types::Range;
use crate::state::asset::PriceBar;

/// Primary quote source: the public v8 chart endpoint. One symbol per
/// call, best-effort; also serves as the real-history source with the
/// simulated random walk as its fallback.
#[derive(Debug, Clone)]
pub struct YahooSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn chart(&self, symbol: &str, range: Range) -> anyhow::Result<ChartResult> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            encode_symbol(symbol)
        );
        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", range.as_token())])
            .send()
            .await
            .with_context(|| format!("chart request for {symbol} failed"))?
            .error_for_status()
            .with_context(|| format!("chart request for {symbol} rejected"))?;

        let body: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("malformed chart payload for {symbol}"))?;

        body.chart
            .result
            .into_iter()
            .flatten()
            .next()
            .with_context(|| format!("chart payload for {symbol} carries no result"))
    }
}

#[async_trait]
impl HistorySource for YahooSource {
    /// Daily bars for `range`, oldest first. Errors when the endpoint
    /// returns no usable rows; callers fall back to the simulated
    /// series in that case.
    async fn fetch_history(&self, symbol: &str, range: Range) -> anyhow::Result<Vec<PriceBar>> {
        let result = self.chart(symbol, range).await?;
        let quotes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .context("chart payload carries no quote arrays")?;

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let Some(date) = DateTime::from_timestamp(*ts, 0) else {
                continue;
            };
            let close = pick(&quotes.close, i);
            let open = pick(&quotes.open, i);
            let price = if close > 0.0 { close } else { open };
            if price <= 0.0 {
                continue;
            }
            bars.push(PriceBar {
                date: date.format("%b %-d").to_string(),
                price,
                open,
                high: pick(&quotes.high, i),
                low: pick(&quotes.low, i),
                close,
                volume: quotes.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }
        if bars.is_empty() {
            bail!("no historical data for {symbol}");
        }
        Ok(bars)
    }
}

#[async_trait]
impl QuoteSource for YahooSource {
    async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<f64> {
        let result = self.chart(symbol, Range::OneDay).await?;
        let price = result
            .meta
            .regular_market_price
            .with_context(|| format!("no market price for {symbol}"))?;
        if price <= 0.0 {
            bail!("non-positive market price {price} for {symbol}");
        }
        Ok((price * 100.0).round() / 100.0)
    }
}

fn pick(values: &[Option<f64>], index: usize) -> f64 {
    values.get(index).copied().flatten().unwrap_or(0.0)
}

/// Tickers carry `^` and `=F` markers that must be percent-encoded in
/// the request path.
fn encode_symbol(symbol: &str) -> String {
    symbol.replace('^', "%5E").replace('=', "%3D")
}

// ── Wire shape ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteArrays>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct QuoteArrays {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_encoding_covers_index_and_futures_markers() {
        assert_eq!(encode_symbol("^GSPC"), "%5EGSPC");
        assert_eq!(encode_symbol("GC=F"), "GC%3DF");
        assert_eq!(encode_symbol("AAPL"), "AAPL");
    }

    #[test]
    fn chart_payload_parses_with_sparse_rows() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "meta": {"regularMarketPrice": 189.447},
                    "timestamp": [1710403200, 1710489600],
                    "indicators": {
                        "quote": [{
                            "open": [188.0, null],
                            "high": [190.1, 191.0],
                            "low": [187.2, 188.8],
                            "close": [189.4, 190.2],
                            "volume": [53200000, null]
                        }]
                    }
                }]
            }
        }"#;
        let parsed: ChartResponse = serde_json::from_str(raw).unwrap();
        let result = parsed.chart.result.unwrap().remove(0);
        assert_eq!(result.meta.regular_market_price, Some(189.447));
        assert_eq!(result.timestamp.len(), 2);
        assert_eq!(result.indicators.quote[0].volume[1], None);
    }
}
