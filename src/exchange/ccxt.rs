// src/exchange/ccxt.rs
//
// Talks to a ccxt-compatible REST proxy (the pattern used for
// unauthenticated market data across ccxt's unified exchange API).
// Request/response shaping follows the same `reqwest::Client` +
// `base_url` construction the blowfin client used for signed calls,
// minus the signing — this surface never writes.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::{Candle, MarketType, Symbol, Ticker, Timeframe};
use crate::exchange::{ExchangeAdapter, ALLOWED_QUOTES};
use crate::utils::errors::ScanError;

pub struct CcxtStyleExchange {
    id: String,
    base_url: String,
    client: reqwest::Client,
}

impl CcxtStyleExchange {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client");
        Self { id: id.into(), base_url: base_url.into(), client }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ScanError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).query(query).send().await.map_err(|e| {
            if e.is_timeout() {
                ScanError::Timeout
            } else {
                ScanError::classify(&e.to_string())
            }
        })?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScanError::RateLimited);
        }
        if resp.status().is_server_error() {
            return Err(ScanError::Transient(format!("upstream {}", resp.status())));
        }
        if !resp.status().is_success() {
            return Err(ScanError::Fatal(format!("upstream {}", resp.status())));
        }

        resp.json::<T>().await.map_err(ScanError::from)
    }
}

#[derive(Deserialize)]
struct MarketRow {
    symbol: String,
    quote: String,
    active: bool,
    #[serde(rename = "type")]
    market_type: String,
}

#[derive(Deserialize)]
struct CandleRow(i64, f64, f64, f64, f64, f64);

#[derive(Deserialize)]
struct TickerRow {
    last: f64,
    bid: f64,
    ask: f64,
    #[serde(rename = "quoteVolume")]
    quote_volume: f64,
}

fn market_type_str(mt: MarketType) -> &'static str {
    match mt {
        MarketType::Spot => "spot",
        MarketType::Future => "future",
        MarketType::Swap => "swap",
    }
}

#[async_trait]
impl ExchangeAdapter for CcxtStyleExchange {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_markets(&self, market_type: MarketType, quote: &str) -> Result<Vec<Symbol>, ScanError> {
        if !ALLOWED_QUOTES.contains(&quote) {
            return Err(ScanError::Fatal(format!("unsupported quote currency: {quote}")));
        }
        let rows: Vec<MarketRow> = self
            .get_json("/markets", &[("type", market_type_str(market_type).to_string())])
            .await?;

        Ok(rows
            .into_iter()
            .filter(|r| r.active && r.quote == quote && r.market_type == market_type_str(market_type))
            .map(|r| Symbol::new(self.id.clone(), r.symbol))
            .collect())
    }

    async fn fetch_ohlcv(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>, ScanError> {
        let rows: Vec<CandleRow> = self
            .get_json(
                "/ohlcv",
                &[
                    ("symbol", symbol.pair.clone()),
                    ("timeframe", timeframe.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|CandleRow(ts_ms, open, high, low, close, volume)| {
                let ts: DateTime<Utc> = Utc.timestamp_millis_opt(ts_ms).single()?;
                Some(Candle { ts, open, high, low, close, volume })
            })
            .collect())
    }

    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<Ticker, ScanError> {
        let row: TickerRow = self.get_json("/ticker", &[("symbol", symbol.pair.clone())]).await?;
        Ok(Ticker { last: row.last, bid: row.bid, ask: row.ask, quote_volume: row.quote_volume })
    }
}
