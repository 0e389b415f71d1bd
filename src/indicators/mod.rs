// src/indicators/mod.rs
//
// Pure CandleSeries -> FeatureVector transform. Every sub-indicator
// defines its own minimum window; the engine as a whole requires at
// least `MIN_WINDOW` bars, matching the largest individual requirement
// (EMA-200) plus slack.

pub mod fib;
pub mod ichimoku;
pub mod math;
pub mod regime;
pub mod volume_profile;
pub mod vwap;

use crate::domain::{Candle, CandleSeries, FeatureVector};
use crate::utils::errors::ScanError;

pub const MIN_WINDOW: usize = 200;
pub const VOLUME_PROFILE_BINS: usize = 50;

pub fn compute_features(series: &CandleSeries) -> Result<FeatureVector, ScanError> {
    let candles = &series.candles;
    if candles.len() < MIN_WINDOW {
        return Err(ScanError::DataInsufficient { needed: MIN_WINDOW, have: candles.len() });
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let price = *closes.last().unwrap();

    let momentum_short = math::period_return(&closes, 5);
    let momentum_long = math::period_return(&closes, 20);
    let momentum_7d = math::period_return(&closes, 7);
    let momentum_30d = math::period_return(&closes, 30);

    let rsi = math::rsi(&closes, 14);
    let rsi_series: Vec<f64> = (14..closes.len()).map(|i| math::rsi(&closes[..=i], 14)).collect();
    let stoch = math::stochastic(&highs, &lows, &closes, 14);

    let macd_hist = math::macd_histogram(&closes);
    let ema_5 = math::ema_last(&closes, 5);
    let ema_9 = math::ema_last(&closes, 9);
    let ema_13 = math::ema_last(&closes, 13);
    let ema_21 = math::ema_last(&closes, 21);
    let ema_50 = math::ema_last(&closes, 50);
    let ema_200 = math::ema_last(&closes, 200);
    let sma_20 = math::sma(&closes, 20).unwrap_or(price);
    let sma_50 = math::sma(&closes, 50).unwrap_or(price);
    let adx = math::adx(&highs, &lows, &closes, 14);

    let atr = math::atr(&highs, &lows, &closes, 14);
    let bb = math::bollinger(&closes, 20, price);

    let recent_20_vol = math::sma(&volumes, 20).unwrap_or(0.0);
    let volume_ratio = if recent_20_vol > 0.0 { volumes.last().unwrap() / recent_20_vol } else { 1.0 };
    let obv = math::obv(&closes, &volumes);

    let window_candles: &[Candle] = candles;
    let vp = volume_profile::volume_profile(window_candles, VOLUME_PROFILE_BINS);
    let anchored_poc = volume_profile::anchored_poc(window_candles, VOLUME_PROFILE_BINS);
    let fixed_range_poc = volume_profile::fixed_range_poc(window_candles, VOLUME_PROFILE_BINS);
    let poc_distance = if price != 0.0 { (price - vp.poc_price) / price } else { 0.0 };

    let ichi = ichimoku::ichimoku(candles);
    let vwap = vwap::vwap(candles);
    let vwap_bullish = price > vwap;

    let fib = fib::fib_levels(candles, price);
    let fib_confluence_score = fib::fib_confluence_score(price, fib.nearest_retracement, vp.poc_price, vwap);

    let rsi_bearish_divergence = regime::rsi_bearish_divergence(&closes, &rsi_series, 5);

    let assessment = regime::classify_regime(&closes, ema_21, ema_50, ema_200, adx, atr, price);

    Ok(FeatureVector {
        price,
        momentum_short,
        momentum_long,
        momentum_7d,
        momentum_30d,
        rsi,
        stoch_k: stoch.k,
        stoch_d: stoch.d,
        macd_hist,
        ema_5,
        ema_9,
        ema_13,
        ema_21,
        ema_50,
        ema_200,
        sma_20,
        sma_50,
        adx,
        atr,
        bb_upper: bb.upper,
        bb_middle: bb.middle,
        bb_lower: bb.lower,
        bb_width: bb.width,
        bb_position: bb.position,
        volume_ratio,
        obv,
        poc_price: vp.poc_price,
        poc_distance,
        poc_bin_share: vp.bin_share,
        anchored_poc_price: anchored_poc,
        fixed_range_poc_price: fixed_range_poc,
        tenkan: ichi.tenkan,
        kijun: ichi.kijun,
        senkou_a: ichi.senkou_a,
        senkou_b: ichi.senkou_b,
        cloud_green: ichi.cloud_green,
        vwap,
        vwap_bullish,
        fib_nearest_retracement: fib.nearest_retracement,
        fib_nearest_extension: fib.nearest_extension,
        fib_direction_bull: fib.direction_bull,
        fib_confluence_score,
        rsi_bearish_divergence,
        regime: assessment.regime,
        regime_confidence: assessment.confidence,
        trend_strength: assessment.trend_strength,
        volatility: assessment.volatility,
        atr_pct: assessment.atr_pct,
        suggested_opportunity_threshold: assessment.regime.suggested_opportunity_threshold(),
        regime_state: assessment.regime_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Symbol, Timeframe};
    use chrono::{Duration, Utc};

    fn synthetic_series(n: usize, trend: f64) -> CandleSeries {
        let mut candles = Vec::with_capacity(n);
        let mut price = 100.0;
        let start = Utc::now() - Duration::hours(n as i64);
        for i in 0..n {
            price += trend + (i % 5) as f64 * 0.01;
            let high = price + 0.5;
            let low = price - 0.5;
            candles.push(Candle {
                ts: start + Duration::hours(i as i64),
                open: price - 0.1,
                high,
                low,
                close: price,
                volume: 100.0 + (i % 7) as f64,
            });
        }
        CandleSeries { symbol: Symbol::new("mock", "BTC/USDT"), timeframe: Timeframe::H1, candles }
    }

    #[test]
    fn rejects_short_series() {
        let series = synthetic_series(50, 0.1);
        assert!(matches!(compute_features(&series), Err(ScanError::DataInsufficient { .. })));
    }

    #[test]
    fn bb_position_is_bounded() {
        let series = synthetic_series(250, 0.05);
        let features = compute_features(&series).unwrap();
        assert!((0.0..=1.0).contains(&features.bb_position));
    }

    #[test]
    fn uptrend_series_classified_bull_or_ranging() {
        let series = synthetic_series(250, 0.3);
        let features = compute_features(&series).unwrap();
        assert!(matches!(features.regime, crate::domain::Regime::Bull | crate::domain::Regime::Ranging));
    }
}
