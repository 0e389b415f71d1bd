// src/exchange/mock.rs
//
// Deterministic in-memory adapter for scan-orchestrator and continuous-
// pipeline tests. Candle fixtures and injected failures are set up per
// symbol before the test drives a scan.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Candle, MarketType, Symbol, Ticker, Timeframe};
use crate::exchange::ExchangeAdapter;
use crate::utils::errors::ScanError;

pub struct MockExchange {
    id: String,
    candles: DashMap<String, Vec<Candle>>,
    tickers: DashMap<String, Ticker>,
    markets: Vec<Symbol>,
    /// Number of leading `fetch_ohlcv` calls (per symbol) that should
    /// return `RateLimited`, for circuit-breaker tests.
    rate_limit_burst: DashMap<String, AtomicU32>,
}

impl MockExchange {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            candles: DashMap::new(),
            tickers: DashMap::new(),
            markets: Vec::new(),
            rate_limit_burst: DashMap::new(),
        }
    }

    pub fn with_candles(self, symbol: &Symbol, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.pair.clone(), candles);
        self
    }

    pub fn with_markets(mut self, symbols: Vec<Symbol>) -> Self {
        self.markets = symbols;
        self
    }

    pub fn with_ticker(self, symbol: &Symbol, ticker: Ticker) -> Self {
        self.tickers.insert(symbol.pair.clone(), ticker);
        self
    }

    /// Makes the next `count` `fetch_ohlcv` calls for `symbol` fail with
    /// `RateLimited`.
    pub fn with_rate_limit_burst(self, symbol: &Symbol, count: u32) -> Self {
        self.rate_limit_burst.insert(symbol.pair.clone(), AtomicU32::new(count));
        self
    }
}

#[async_trait]
impl ExchangeAdapter for MockExchange {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_markets(&self, _market_type: MarketType, quote: &str) -> Result<Vec<Symbol>, ScanError> {
        Ok(self.markets.iter().filter(|s| s.quote == quote).cloned().collect())
    }

    async fn fetch_ohlcv(&self, symbol: &Symbol, _timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>, ScanError> {
        if let Some(remaining) = self.rate_limit_burst.get(&symbol.pair) {
            let prev = remaining.value().fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                if v > 0 {
                    Some(v - 1)
                } else {
                    None
                }
            });
            if prev.is_ok() {
                return Err(ScanError::RateLimited);
            }
        }
        match self.candles.get(&symbol.pair) {
            Some(series) => Ok(series.iter().rev().take(limit).rev().cloned().collect()),
            None => Err(ScanError::SymbolUnknown(symbol.pair.clone())),
        }
    }

    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<Ticker, ScanError> {
        self.tickers
            .get(&symbol.pair)
            .map(|t| *t)
            .ok_or_else(|| ScanError::SymbolUnknown(symbol.pair.clone()))
    }
}
