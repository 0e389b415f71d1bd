// src/config/settings.rs

use dotenv::dotenv;
use std::env;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_port: u16,
    pub default_exchange: String,
    /// Base URL of the ccxt-compatible REST proxy `CcxtStyleExchange` talks
    /// to. Empty means "no real adapter configured" — `main.rs` falls back
    /// to an empty-fixture `MockExchange` so the server still boots.
    pub exchange_base_url: String,

    /// OHLCV cache TTL, seconds.
    pub cache_ttl_secs: u64,
    /// LRU bound on distinct (symbol, timeframe, limit) cache keys.
    pub cache_capacity: usize,

    /// Per-adapter concurrent-fetch bound, clamped to [20, 100].
    pub max_concurrent_requests: usize,
    /// Delay between successful fetches, ms.
    pub rate_limit_delay_ms: u64,
    /// Consecutive rate-limit errors before the breaker trips.
    pub circuit_breaker_threshold: u32,
    /// Pause duration once tripped, seconds.
    pub circuit_breaker_pause_secs: u64,
    /// Retry attempts for a single fetch.
    pub retry_attempts: u32,
    /// Base retry backoff, ms (multiplied by attempt + 1).
    pub retry_delay_ms: u64,
    /// Per-fetch network timeout, seconds.
    pub fetch_timeout_secs: u64,

    /// Symbol-universe cap per scan (was a magic "460" upstream).
    pub max_scan_symbols: usize,
    /// Default top_n truncation.
    pub default_top_n: usize,

    /// Ring-buffer capacities.
    pub tick_buffer_capacity: usize,
    pub candle_buffer_capacity: usize,
    pub signal_buffer_capacity: usize,

    /// Loop periods, seconds.
    pub tick_loop_period_secs: u64,
    pub signal_loop_period_secs: u64,
    pub market_state_loop_period_secs: u64,
    pub full_scan_loop_period_secs: u64,

    /// Root directory for day-files and OHLCV parquet files.
    pub training_data_dir: String,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // loads `.env` file automatically, same as the rest of this stack

        let server_port = env_or("SERVER_PORT", 8080u16);
        let default_exchange = env::var("DEFAULT_EXCHANGE").unwrap_or_else(|_| "kucoinfutures".into());

        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let default_concurrency = cpu_count.clamp(20, 100);

        Ok(Self {
            server_port,
            default_exchange,
            exchange_base_url: env::var("EXCHANGE_BASE_URL").unwrap_or_default(),

            cache_ttl_secs: env_or("CACHE_TTL_SECS", 300u64),
            cache_capacity: env_or("CACHE_CAPACITY", 2048usize),

            max_concurrent_requests: env_or("MAX_CONCURRENT_REQUESTS", default_concurrency),
            rate_limit_delay_ms: env_or("RATE_LIMIT_DELAY_MS", 10u64),
            circuit_breaker_threshold: env_or("CIRCUIT_BREAKER_THRESHOLD", 10u32),
            circuit_breaker_pause_secs: env_or("CIRCUIT_BREAKER_PAUSE_SECS", 60u64),
            retry_attempts: env_or("RETRY_ATTEMPTS", 3u32),
            retry_delay_ms: env_or("RETRY_DELAY_MS", 250u64),
            fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", 15u64),

            max_scan_symbols: env_or("MAX_SCAN_SYMBOLS", 460usize),
            default_top_n: env_or("DEFAULT_TOP_N", 50usize),

            tick_buffer_capacity: env_or("TICK_BUFFER_CAPACITY", 100usize),
            candle_buffer_capacity: env_or("CANDLE_BUFFER_CAPACITY", 500usize),
            signal_buffer_capacity: env_or("SIGNAL_BUFFER_CAPACITY", 1000usize),

            tick_loop_period_secs: env_or("TICK_LOOP_PERIOD_SECS", 5u64),
            signal_loop_period_secs: env_or("SIGNAL_LOOP_PERIOD_SECS", 30u64),
            market_state_loop_period_secs: env_or("MARKET_STATE_LOOP_PERIOD_SECS", 60u64),
            full_scan_loop_period_secs: env_or("FULL_SCAN_LOOP_PERIOD_SECS", 90u64),

            training_data_dir: env::var("TRAINING_DATA_DIR").unwrap_or_else(|_| "training_data".into()),
        })
    }
}
