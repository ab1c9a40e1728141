use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref CHAIN_SCANS: IntCounterVec = IntCounterVec::new(
        Opts::new("chain_scans_total", "Total number of chain scans"),
        &["scanner"]
    ).expect("valid metric definition");

    pub static ref CHAIN_SCAN_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("chain_scan_failures_total", "Chain scans that returned no data because of an error"),
        &["scanner"]
    ).expect("valid metric definition");

    pub static ref PRICE_REQUESTS: IntCounter = IntCounter::new(
        "price_requests_total",
        "Total number of price API requests"
    ).expect("valid metric definition");

    pub static ref PRICE_RATE_LIMITED: IntCounter = IntCounter::new(
        "price_rate_limited_total",
        "Price API requests rejected with HTTP 429"
    ).expect("valid metric definition");

    pub static ref PRICE_CACHE_HITS: IntCounter = IntCounter::new(
        "price_cache_hits_total",
        "Price ids served from the in-memory cache"
    ).expect("valid metric definition");
}

pub fn init() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(CHAIN_SCANS.clone()))?;
    REGISTRY.register(Box::new(CHAIN_SCAN_FAILURES.clone()))?;
    REGISTRY.register(Box::new(PRICE_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(PRICE_RATE_LIMITED.clone()))?;
    REGISTRY.register(Box::new(PRICE_CACHE_HITS.clone()))?;
    Ok(())
}

/// Text exposition of every registered metric.
pub fn render() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
