// src/exchange/mod.rs
//
// The exchange-adapter interface. One real adapter
// (`CcxtStyleExchange`, talking to a ccxt-compatible REST proxy) and one
// test double (`MockExchange`), both behind the same trait so the scan
// orchestrator never sees anything else — mirrors a single
// `blowfin` client being the sole concrete implementor behind
// `trading_engine`'s dispatch.

pub mod ccxt;
pub mod mock;

use async_trait::async_trait;

use crate::domain::{Candle, MarketType, Symbol, Ticker, Timeframe};
use crate::utils::errors::ScanError;

#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn id(&self) -> &str;

    async fn fetch_markets(&self, market_type: MarketType, quote: &str) -> Result<Vec<Symbol>, ScanError>;

    async fn fetch_ohlcv(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>, ScanError>;

    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<Ticker, ScanError>;
}

/// Quote currencies accepted for crypto market listings.
pub const ALLOWED_QUOTES: [&str; 3] = ["USDT", "USD", "BUSD"];

/// Fixed major-pair allowlist for forex-flavored adapters.
pub const FOREX_MAJORS: [&str; 7] =
    ["EUR/USD", "GBP/USD", "USD/JPY", "USD/CHF", "AUD/USD", "USD/CAD", "NZD/USD"];
