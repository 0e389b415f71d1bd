// src/utils/errors.rs
//
// Error taxonomy shared by exchange adapters, the cache, and the scan
// orchestrator. Uses `thiserror`, the same pattern the copy-trading
// service used for its own error enum (`#[derive(thiserror::Error)]`
// with `#[from]` variants), rather than a hand-rolled `Display` impl.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("rate limited")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("unknown symbol: {0}")]
    SymbolUnknown(String),

    #[error("market inactive: {0}")]
    MarketInactive(String),

    #[error("transient error: {0}")]
    Transient(String),

    #[error("fatal adapter error: {0}")]
    Fatal(String),

    #[error("insufficient candle history: need {needed}, have {have}")]
    DataInsufficient { needed: usize, have: usize },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ScanError {
    /// Classifies a raw upstream error message into the taxonomy by
    /// substring match — for adapters whose underlying HTTP client
    /// doesn't type its errors. Adapters that own a typed transport
    /// error should construct a `ScanError` variant directly instead of
    /// going through this.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("rate limit") || lower.contains("throttle") || lower.contains("429") {
            ScanError::RateLimited
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ScanError::Timeout
        } else if lower.contains("unknown symbol") || lower.contains("does not exist") {
            ScanError::SymbolUnknown(message.to_string())
        } else if lower.contains("inactive") || lower.contains("delisted") {
            ScanError::MarketInactive(message.to_string())
        } else if lower.contains("connection reset")
            || lower.contains("502")
            || lower.contains("503")
            || lower.contains("504")
        {
            ScanError::Transient(message.to_string())
        } else if lower.contains("auth") || lower.contains("invalid api") || lower.contains("malformed") {
            ScanError::Fatal(message.to_string())
        } else {
            ScanError::Other(message.to_string())
        }
    }

    /// Whether this error should count toward the circuit breaker's
    /// consecutive-rate-limit trip counter.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ScanError::RateLimited)
    }

    /// Retry policy: only timeouts and transient errors are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanError::Timeout | ScanError::Transient(_))
    }
}