use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::market_data::traits::BulkSource;
use crate::market_data::types::{BulkMarketData, PriceUpdates};
use crate::state::asset::{normalize_symbol, NewsItem, Sentiment, SourceRef};

/// Tickers the bridge is asked to quote. Mirrors the seeded universe.
const TRACKED_SYMBOLS: [&str; 15] = [
    "^GSPC", "AAPL", "MSFT", "NVDA", "GOOGL", "META", "AMZN", "TSLA", "JPM", "LLY", "UNH", "V",
    "XOM", "GC=F", "SI=F",
];

/// Secondary bulk source: one generative-search call that returns live
/// prices for the whole universe as free text, plus headlines and the
/// grounding citations behind them. Partial or empty price coverage is
/// normal; a failed call is surfaced because the editorial payload has
/// no other source.
#[derive(Debug, Clone)]
pub struct SearchBridge {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SearchBridge {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    fn prompt() -> String {
        format!(
            "TASK 1: Extract CURRENT live trading prices for: {}.\n\
             TASK 2: Fetch 5 critical financial headlines from the last 6-12 hours.\n\
             OUTPUT FORMAT:\n\
             PRICES:\n\
             SYMBOL: PRICE\n\
             NEWS:\n\
             [Headline] - [Source] - [Sentiment]",
            TRACKED_SYMBOLS.join(", ")
        )
    }
}

#[async_trait]
impl BulkSource for SearchBridge {
    async fn fetch_bulk(&self) -> anyhow::Result<BulkMarketData> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": Self::prompt() }] }],
            "tools": [{ "google_search": {} }],
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("bulk market request failed")?
            .error_for_status()
            .context("bulk market request rejected")?;

        let reply: GenerateResponse = response
            .json()
            .await
            .context("malformed bulk market payload")?;

        let candidate = reply
            .candidates
            .into_iter()
            .next()
            .context("bulk market payload carries no candidates")?;

        let sources: Vec<SourceRef> = candidate
            .grounding_metadata
            .map(|meta| {
                meta.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .map(|web| SourceRef {
                        title: if web.title.is_empty() {
                            "Market Intel".to_string()
                        } else {
                            web.title
                        },
                        uri: web.uri,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        let (prices, news) = parse_bridge_text(&text);
        debug!(
            prices = prices.len(),
            news = news.len(),
            sources = sources.len(),
            "bulk fetch parsed"
        );

        Ok(BulkMarketData {
            prices,
            news,
            sources,
        })
    }
}

/// Pull the `SYMBOL: PRICE` lines and `Headline - Source - Sentiment`
/// lines out of the bridge's free-text reply. Unrecognized lines are
/// ignored; price keys are normalized and restricted to the tracked
/// universe.
pub fn parse_bridge_text(text: &str) -> (PriceUpdates, Vec<NewsItem>) {
    let tracked: Vec<String> = TRACKED_SYMBOLS.iter().map(|s| normalize_symbol(s)).collect();

    let mut prices = PriceUpdates::new();
    let mut news = Vec::new();

    for line in text.lines() {
        if let Some((symbol, price)) = parse_price_line(line, &tracked) {
            prices.insert(symbol, price);
            continue;
        }
        if let Some(item) = parse_news_line(line, news.len()) {
            news.push(item);
        }
    }

    (prices, news)
}

fn parse_price_line(line: &str, tracked: &[String]) -> Option<(String, f64)> {
    let (left, right) = line.split_once(':')?;
    let key = normalize_symbol(left.trim().trim_start_matches(['-', '*', ' ']));
    if !tracked.iter().any(|t| *t == key) {
        return None;
    }
    let cleaned: String = right
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let price: f64 = cleaned.parse().ok()?;
    (price > 0.0).then_some((key, price))
}

fn parse_news_line(line: &str, index: usize) -> Option<NewsItem> {
    let parts: Vec<&str> = line.split(" - ").collect();
    if parts.len() < 2 {
        return None;
    }
    let headline = parts[0]
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | '*' | ' '))
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if headline.is_empty() {
        return None;
    }
    let sentiment_label = parts.get(2).copied().unwrap_or("Neutral");
    let sentiment = if sentiment_label.contains("Positive") {
        Sentiment::Positive
    } else if sentiment_label.contains("Negative") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };
    Some(NewsItem {
        id: format!("news-{index}"),
        headline: headline.to_string(),
        source: parts[1].trim().trim_start_matches('[').trim_end_matches(']').to_string(),
        time: "Live".to_string(),
        sentiment,
        impact_asset: None,
    })
}

// ── Wire shape ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    #[serde(default)]
    title: String,
    uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "\
PRICES:
^GSPC: $5,234.18
AAPL: 192.53
GC=F: 2,301.10
DOGE: 0.42
NEWS:
1. Fed holds rates steady amid cooling inflation - Reuters - Positive
2. [Chipmaker guidance cut rattles tech sector] - [Bloomberg] - Negative
Not a news line
Oil steadies ahead of inventory data - WSJ";

    #[test]
    fn prices_are_keyed_by_normalized_tracked_symbols_only() {
        let (prices, _) = parse_bridge_text(REPLY);
        assert_eq!(prices.get("GSPC"), Some(&5234.18));
        assert_eq!(prices.get("AAPL"), Some(&192.53));
        assert_eq!(prices.get("GC"), Some(&2301.10));
        assert!(!prices.contains_key("DOGE"));
        assert_eq!(prices.len(), 3);
    }

    #[test]
    fn news_lines_parse_headline_source_and_sentiment() {
        let (_, news) = parse_bridge_text(REPLY);
        assert_eq!(news.len(), 3);

        assert_eq!(news[0].headline, "Fed holds rates steady amid cooling inflation");
        assert_eq!(news[0].source, "Reuters");
        assert_eq!(news[0].sentiment, Sentiment::Positive);

        assert_eq!(news[1].headline, "Chipmaker guidance cut rattles tech sector");
        assert_eq!(news[1].source, "Bloomberg");
        assert_eq!(news[1].sentiment, Sentiment::Negative);

        // Missing sentiment column defaults to Neutral.
        assert_eq!(news[2].sentiment, Sentiment::Neutral);
        assert_eq!(news[2].time, "Live");
    }

    #[test]
    fn empty_reply_yields_empty_mapping_and_no_news() {
        let (prices, news) = parse_bridge_text("");
        assert!(prices.is_empty());
        assert!(news.is_empty());
    }
}
