// src/domain.rs
//
// Core data model: candles, symbols, timeframes, the feature vector, and
// the signal/scan-result records that flow out of the scoring engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }

    /// Maps the scan API's `timeframe` request field to a candle period.
    pub fn from_scan_request_name(name: &str) -> Option<Self> {
        match name {
            "scalping" => Some(Timeframe::M1),
            "short" => Some(Timeframe::M5),
            "medium" => Some(Timeframe::H1),
            "daily" => Some(Timeframe::D1),
            "weekly" => Some(Timeframe::W1),
            _ => None,
        }
    }

    /// The four timeframes the continuous pipeline's per-timeframe loop tracks.
    pub const CONTINUOUS_SET: [Timeframe; 4] = [Timeframe::M5, Timeframe::H4, Timeframe::H1, Timeframe::D1];
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub exchange_id: String,
    pub pair: String,
    pub quote: String,
}

impl Symbol {
    pub fn new(exchange_id: impl Into<String>, pair: impl Into<String>) -> Self {
        let pair = pair.into();
        let quote = pair.split('/').nth(1).unwrap_or("").to_string();
        Self { exchange_id: exchange_id.into(), pair, quote }
    }

    /// `<exchange>_<pair-with-slash-stripped>`, the file-naming convention
    /// used by the persistence layer.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.exchange_id, self.pair.replace('/', ""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Rejects candles that violate the OHLC ordering invariant or carry
    /// negative volume. Malformed candles are dropped at ingress, never
    /// repaired.
    pub fn is_well_formed(&self) -> bool {
        self.volume >= 0.0
            && self.high >= self.open.max(self.close)
            && self.open.min(self.close) >= self.low
            && self.high.is_finite()
            && self.low.is_finite()
            && self.open.is_finite()
            && self.close.is_finite()
    }

    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
}

impl Default for Symbol {
    fn default() -> Self {
        Symbol { exchange_id: String::new(), pair: String::new(), quote: String::new() }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Timeframe::H1
    }
}

impl CandleSeries {
    /// Builds a series from raw candles, dropping malformed entries and
    /// any candle whose timestamp doesn't strictly increase over the
    /// previous accepted one.
    pub fn from_raw(symbol: Symbol, timeframe: Timeframe, raw: Vec<Candle>) -> Self {
        let mut candles: Vec<Candle> = Vec::with_capacity(raw.len());
        for c in raw {
            if !c.is_well_formed() {
                continue;
            }
            if let Some(last) = candles.last() {
                if c.ts <= last.ts {
                    continue;
                }
            }
            candles.push(c);
        }
        Self { symbol, timeframe, candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub last: f64,
    pub bid: f64,
    pub ask: f64,
    pub quote_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketType {
    Spot,
    Future,
    Swap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Bull,
    Bear,
    Ranging,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Bull => "bull",
            Regime::Bear => "bear",
            Regime::Ranging => "ranging",
        }
    }

    /// Default opportunity-score threshold suggested for this regime.
    pub fn suggested_opportunity_threshold(&self) -> f64 {
        match self {
            Regime::Bull => 60.0,
            Regime::Bear => 75.0,
            Regime::Ranging => 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    Low,
    Med,
    High,
}

impl Volatility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Volatility::Low => "low",
            Volatility::Med => "med",
            Volatility::High => "high",
        }
    }
}

/// The fixed feature record produced by the indicator engine for one
/// (symbol, timeframe) candle window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureVector {
    pub price: f64,

    pub momentum_short: f64,
    pub momentum_long: f64,
    pub momentum_7d: f64,
    pub momentum_30d: f64,

    pub rsi: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,

    pub macd_hist: f64,
    pub ema_5: f64,
    pub ema_9: f64,
    pub ema_13: f64,
    pub ema_21: f64,
    pub ema_50: f64,
    pub ema_200: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub adx: f64,

    pub atr: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub bb_width: f64,
    pub bb_position: f64,

    pub volume_ratio: f64,
    pub obv: f64,
    pub poc_price: f64,
    pub poc_distance: f64,
    pub poc_bin_share: f64,
    pub anchored_poc_price: f64,
    pub fixed_range_poc_price: f64,

    pub tenkan: f64,
    pub kijun: f64,
    pub senkou_a: f64,
    pub senkou_b: f64,
    pub cloud_green: bool,

    pub vwap: f64,
    pub vwap_bullish: bool,

    pub fib_nearest_retracement: f64,
    pub fib_nearest_extension: f64,
    pub fib_direction_bull: bool,
    pub fib_confluence_score: f64,

    pub rsi_bearish_divergence: bool,

    pub regime: Regime,
    pub regime_confidence: f64,
    pub trend_strength: f64,
    pub volatility: Volatility,
    pub atr_pct: f64,
    pub suggested_opportunity_threshold: f64,

    /// Granular regime state machine, supplementary to `regime`: one of
    /// bull_early/strong/parabolic, bear_early/strong/capitulation,
    /// neutral_accum/dist/neutral.
    pub regime_state: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalLabel {
    StrongBuy,
    Buy,
    WeakBuy,
    Neutral,
    WeakSell,
    Sell,
    StrongSell,
}

impl SignalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::StrongBuy => "Strong Buy",
            SignalLabel::Buy => "Buy",
            SignalLabel::WeakBuy => "Weak Buy",
            SignalLabel::Neutral => "Neutral",
            SignalLabel::WeakSell => "Weak Sell",
            SignalLabel::Sell => "Sell",
            SignalLabel::StrongSell => "Strong Sell",
        }
    }

    /// Collapses the seven-way label to the wire contract's three-way
    /// `BUY`/`SELL`/`HOLD`.
    pub fn wire_direction(&self) -> &'static str {
        match self {
            SignalLabel::StrongBuy | SignalLabel::Buy | SignalLabel::WeakBuy => "BUY",
            SignalLabel::StrongSell | SignalLabel::Sell | SignalLabel::WeakSell => "SELL",
            SignalLabel::Neutral => "HOLD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalState {
    ConsistentUptrend,
    NewSpike,
    ToppingOut,
    Lagging,
    ModerateUptrend,
    PotentialReversal,
    Consolidation,
    WeakUptrend,
    Overbought,
    Oversold,
    MacdBullish,
    MacdBearish,
    Neutral,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::ConsistentUptrend => "Consistent Uptrend",
            SignalState::NewSpike => "New Spike",
            SignalState::ToppingOut => "Topping Out",
            SignalState::Lagging => "Lagging",
            SignalState::ModerateUptrend => "Moderate Uptrend",
            SignalState::PotentialReversal => "Potential Reversal",
            SignalState::Consolidation => "Consolidation",
            SignalState::WeakUptrend => "Weak Uptrend",
            SignalState::Overbought => "Overbought",
            SignalState::Oversold => "Oversold",
            SignalState::MacdBullish => "MACD Bullish",
            SignalState::MacdBearish => "MACD Bearish",
            SignalState::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlTpAdvisory {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_amount: f64,
    pub reward_amount: f64,
    pub risk_reward_ratio: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub support_level: Option<f64>,
    pub resistance_level: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: uuid::Uuid,
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub price: f64,
    pub signal_label: SignalLabel,
    pub signal_state: SignalState,
    pub signal_strength: f64,
    pub composite_score: f64,
    pub volume_composite_score: f64,
    pub opportunity_score: f64,
    pub combined_score: f64,
    pub confidence_score: f64,
    pub sl_tp_advisory: SlTpAdvisory,
    pub regime: Regime,
    pub features: FeatureVector,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub signals: Vec<Signal>,
    pub total_scanned: usize,
}

/// Candle-clustering record consumed by the confluence query and
/// persisted to the daily clustering file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub ts: DateTime<Utc>,
    pub total_clusters: usize,
    pub bullish: usize,
    pub bearish: usize,
    pub directional_ratio: f64,
    pub follow_through: f64,
    pub trend_formation: bool,
    pub strength: f64,
}
