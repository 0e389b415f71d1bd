// src/indicators/regime.rs
//
// Market-regime classification over the last min(len, 200) bars:
// combines EMA stacking, ADX, ATR% of price, and short-window price
// volatility into bull/bear/ranging plus a confidence score. Also
// derives the granular state machine used alongside the legacy regime.

use crate::domain::{Regime, Volatility};
use crate::indicators::math::{ema_series, stddev};

const TREND_SCORE_EMA_PERIOD: usize = 21;

pub struct RegimeAssessment {
    pub regime: Regime,
    pub confidence: f64,
    pub trend_strength: f64,
    pub volatility: Volatility,
    pub atr_pct: f64,
    pub regime_state: &'static str,
}

#[allow(clippy::too_many_arguments)]
pub fn classify_regime(
    closes: &[f64],
    ema_20: f64,
    ema_50: f64,
    ema_200: f64,
    adx: f64,
    atr: f64,
    price: f64,
) -> RegimeAssessment {
    let atr_pct = if price != 0.0 { 100.0 * atr / price } else { 0.0 };

    let window = closes.len().min(200);
    let recent = &closes[closes.len() - window..];
    let returns: Vec<f64> = recent.windows(2).map(|w| (w[1] - w[0]) / w[0].max(1e-9)).collect();
    let vol20 = if returns.len() >= 20 {
        stddev(&returns[returns.len() - 20..])
    } else {
        stddev(&returns)
    };

    let bull_stack = ema_20 > ema_50 && ema_50 > ema_200;
    let bear_stack = ema_20 < ema_50 && ema_50 < ema_200;

    let trend_strength = trend_score(closes, adx) * 100.0;

    let (regime, confidence) = if bull_stack && adx > 20.0 {
        (Regime::Bull, (50.0 + adx).min(100.0))
    } else if bear_stack && adx > 20.0 {
        (Regime::Bear, (50.0 + adx).min(100.0))
    } else {
        (Regime::Ranging, (100.0 - adx).max(30.0))
    };

    let volatility = if vol20 < 0.01 {
        Volatility::Low
    } else if vol20 < 0.03 {
        Volatility::Med
    } else {
        Volatility::High
    };

    let regime_state = match regime {
        Regime::Bull if adx > 40.0 => "bull_parabolic",
        Regime::Bull if adx > 25.0 => "bull_strong",
        Regime::Bull => "bull_early",
        Regime::Bear if adx > 40.0 => "bear_capitulation",
        Regime::Bear if adx > 25.0 => "bear_strong",
        Regime::Bear => "bear_early",
        Regime::Ranging if bull_stack => "neutral_accum",
        Regime::Ranging if bear_stack => "neutral_dist",
        Regime::Ranging => "neutral_neutral",
    };

    RegimeAssessment { regime, confidence, trend_strength, volatility, atr_pct, regime_state }
}

/// Blends EMA slope, ADX, and recent price structure into a single
/// 0..1 trend-quality score (EMA-slope 0.4, ADX 0.4, structure 0.2).
fn trend_score(closes: &[f64], adx: f64) -> f64 {
    let period = TREND_SCORE_EMA_PERIOD;
    if closes.len() < period + 2 {
        return 0.0;
    }
    let ema = ema_series(closes, period);
    let ema_last = *ema.last().unwrap();
    let ema_back = ema[ema.len() - period];
    let ema_slope = if ema_back != 0.0 { (ema_last - ema_back) / ema_back.abs() } else { 0.0 };
    let ema_score = (((ema_slope * 100.0 / 2.0).clamp(-1.0, 1.0)) + 1.0) / 2.0;

    let adx_score = (adx / 50.0).clamp(0.0, 1.0);

    let lookback = period;
    let recent = &closes[closes.len() - lookback - 1..closes.len() - 1];
    let last = *closes.last().unwrap();
    let higher_high = last > recent.iter().cloned().fold(f64::MIN, f64::max);
    let lower_low = last < recent.iter().cloned().fold(f64::MAX, f64::min);
    let price_score = if higher_high {
        1.0
    } else if lower_low {
        0.0
    } else {
        0.5
    };

    ema_score * 0.4 + adx_score * 0.4 + price_score * 0.2
}

/// RSI trending down while price makes a higher high over the lookback —
/// a classic bearish divergence.
pub fn rsi_bearish_divergence(closes: &[f64], rsi_series: &[f64], lookback: usize) -> bool {
    if closes.len() < lookback + 1 || rsi_series.len() < lookback + 1 {
        return false;
    }
    let price_now = *closes.last().unwrap();
    let price_then = closes[closes.len() - 1 - lookback];
    let rsi_now = *rsi_series.last().unwrap();
    let rsi_then = rsi_series[rsi_series.len() - 1 - lookback];
    price_now > price_then && rsi_now < rsi_then
}
