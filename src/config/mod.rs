#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub yahoo_base_url: String,
    /// Symbols fetched one-by-one from the primary source each cycle.
    pub priority_symbols: Vec<String>,
    pub refresh_interval_secs: u64,
    pub tick_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        let gemini_base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let gemini_model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| "gemini-3-flash-preview".to_string());
        let yahoo_base_url = std::env::var("YAHOO_BASE_URL")
            .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string());
        let priority_symbols = std::env::var("PRIORITY_SYMBOLS")
            .unwrap_or_else(|_| "^GSPC,GC=F,SI=F".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let refresh_interval_secs = std::env::var("REFRESH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        let tick_interval_secs = std::env::var("TICK_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            log_level,
            gemini_api_key,
            gemini_base_url,
            gemini_model,
            yahoo_base_url,
            priority_symbols,
            refresh_interval_secs,
            tick_interval_secs,
        })
    }
}
