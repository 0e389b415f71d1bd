// src/scoring/mod.rs
//
// FeatureVector -> Signal: label, legacy state, strength,
// composite/volume/opportunity/combined scores, SL/TP advisory.

pub mod advisory;
pub mod composite;
pub mod label;
pub mod position;
pub mod state;
pub mod strength;
pub mod thresholds;

use chrono::Utc;

use crate::domain::{FeatureVector, MarketType, Signal, Symbol, Timeframe};

/// Builds the full scored `Signal` record for one (symbol, timeframe)
/// feature vector. Support/resistance are approximated from the
/// Bollinger band, the way a quick scan without a dedicated swing-level
/// detector would.
pub fn score(symbol: &Symbol, market_type: MarketType, timeframe: Timeframe, features: FeatureVector) -> Signal {
    let support = Some(features.bb_lower);
    let resistance = Some(features.bb_upper);

    let signal_label = label::classify_label(&features, market_type, timeframe);
    let signal_state = state::classify_state(&features);
    let signal_strength = strength::signal_strength(&features);
    let composite_score = composite::composite_score(&features);
    let volume_composite_score = composite::volume_composite_score(&features);
    let opportunity_score = composite::opportunity_score(&features);
    let combined_score = composite::combined_score(opportunity_score, composite_score, volume_composite_score, signal_strength);
    let confidence_score = composite::confidence_score(&features);
    let sl_tp_advisory = advisory::sl_tp_advisory(signal_label, features.price, features.atr, support, resistance);

    Signal {
        id: uuid::Uuid::new_v4(),
        symbol: symbol.clone(),
        timeframe,
        price: features.price,
        signal_label,
        signal_state,
        signal_strength,
        composite_score,
        volume_composite_score,
        opportunity_score,
        combined_score,
        confidence_score,
        sl_tp_advisory,
        regime: features.regime,
        features,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketType, Regime};

    fn features() -> FeatureVector {
        FeatureVector {
            price: 100.0,
            momentum_short: 0.012,
            momentum_long: 0.02,
            momentum_7d: 0.03,
            momentum_30d: 0.05,
            rsi: 60.0,
            stoch_k: 55.0,
            stoch_d: 55.0,
            macd_hist: 0.5,
            ema_5: 101.0,
            ema_9: 100.5,
            ema_13: 100.0,
            ema_21: 99.5,
            ema_50: 98.0,
            ema_200: 95.0,
            sma_20: 99.0,
            sma_50: 97.0,
            adx: 30.0,
            atr: 1.0,
            bb_upper: 103.0,
            bb_middle: 100.0,
            bb_lower: 97.0,
            bb_width: 0.06,
            bb_position: 0.6,
            volume_ratio: 1.3,
            obv: 1000.0,
            poc_price: 99.5,
            poc_distance: 0.005,
            poc_bin_share: 0.4,
            anchored_poc_price: 99.0,
            fixed_range_poc_price: 99.8,
            tenkan: 99.0,
            kijun: 98.0,
            senkou_a: 97.0,
            senkou_b: 95.0,
            cloud_green: true,
            vwap: 99.0,
            vwap_bullish: true,
            fib_nearest_retracement: 99.0,
            fib_nearest_extension: 110.0,
            fib_direction_bull: true,
            fib_confluence_score: 50.0,
            rsi_bearish_divergence: false,
            regime: Regime::Bull,
            regime_confidence: 70.0,
            trend_strength: 60.0,
            volatility: crate::domain::Volatility::Med,
            atr_pct: 1.0,
            suggested_opportunity_threshold: 60.0,
            regime_state: "bull_strong",
        }
    }

    #[test]
    fn combined_score_matches_invariant() {
        let symbol = Symbol::new("mock", "BTC/USDT");
        let signal = score(&symbol, MarketType::Swap, Timeframe::H1, features());
        let expected = 0.50 * signal.opportunity_score
            + 0.25 * signal.composite_score
            + 0.15 * signal.volume_composite_score
            + 0.10 * signal.signal_strength;
        assert!((signal.combined_score - expected).abs() < 1e-6);
        assert!((0.0..=100.0).contains(&signal.signal_strength));
    }

    #[test]
    fn classifying_twice_is_idempotent() {
        let symbol = Symbol::new("mock", "BTC/USDT");
        let a = score(&symbol, MarketType::Swap, Timeframe::H1, features());
        let b = score(&symbol, MarketType::Swap, Timeframe::H1, features());
        assert_eq!(a.signal_label, b.signal_label);
        assert_eq!(a.signal_state, b.signal_state);
    }
}
