use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus HTTP exporter on :9000.
/// After this call, any metrics recorded via the `metrics` crate
/// macros (counter!, histogram!) are automatically exported at /metrics.
pub fn init_metrics_server() {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], 9000))
        .install()
        .expect("failed to start Prometheus metrics server");
}

// ── Refresh metrics ──────────────────────────────────────────────

/// Outcome of one full refresh cycle: "ok" or "bulk_error".
pub fn record_refresh(outcome: &str) {
    counter!("refresh_cycles_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_refresh_latency_ms(latency_ms: f64) {
    histogram!("refresh_cycle_latency_ms").record(latency_ms);
}

/// Per-symbol primary quote fetch outcome: "ok" or "error".
pub fn record_quote_fetch(symbol: &str, outcome: &str) {
    counter!("quote_fetches_total", "symbol" => symbol.to_string(), "outcome" => outcome.to_string())
        .increment(1);
}

// ── Simulation metrics ───────────────────────────────────────────

pub fn record_tick() {
    counter!("simulated_ticks_total").increment(1);
}
