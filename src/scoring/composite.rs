// src/scoring/composite.rs
//
// Composite, volume-composite, opportunity, combined, and confidence
// scores. Every sub-component is normalized to [0,1] before weighting;
// weights need not sum to 1 (composite/volume-composite are rescaled
// after summing; opportunity's seven weights already sum to 1).

use crate::domain::FeatureVector;

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

pub fn composite_score(f: &FeatureVector) -> f64 {
    let momentum_short_n = clamp01((f.momentum_short / 0.02 + 1.0) / 2.0);
    let momentum_long_n = clamp01((f.momentum_long / 0.05 + 1.0) / 2.0);
    let rsi_distance_n = clamp01((f.rsi - 50.0).abs() / 50.0);
    let macd_n = clamp01((f.macd_hist.abs() * 50.0).min(1.0));
    let trend_n = clamp01(f.trend_strength / 100.0);
    let volume_n = clamp01(f.volume_ratio / 2.0);
    let ichimoku_n = ichimoku_quality(f);
    let fib_n = clamp01(f.fib_confluence_score / 100.0);

    let weighted = 0.20 * momentum_short_n
        + 0.15 * momentum_long_n
        + 0.20 * rsi_distance_n
        + 0.15 * macd_n
        + 0.20 * trend_n
        + 0.10 * volume_n
        + 0.10 * ichimoku_n
        + 0.15 * fib_n;
    let weight_sum = 0.20 + 0.15 + 0.20 + 0.15 + 0.20 + 0.10 + 0.10 + 0.15;

    (100.0 * weighted / weight_sum).clamp(0.0, 100.0)
}

fn ichimoku_quality(f: &FeatureVector) -> f64 {
    let above_cloud = f.price > f.senkou_a.max(f.senkou_b);
    let below_cloud = f.price < f.senkou_a.min(f.senkou_b);
    if (f.cloud_green && above_cloud) || (!f.cloud_green && below_cloud) {
        1.0
    } else if above_cloud || below_cloud {
        0.6
    } else {
        0.3
    }
}

pub fn volume_composite_score(f: &FeatureVector) -> f64 {
    let volume_ratio_n = clamp01(f.volume_ratio / 2.0);
    let bin_share_n = clamp01(f.poc_bin_share);
    let poc_proximity_n = clamp01(1.0 - f.poc_distance.abs());

    let weighted = 0.5 * volume_ratio_n + 0.3 * bin_share_n + 0.2 * poc_proximity_n;
    (100.0 * weighted).clamp(0.0, 100.0)
}

/// Favors 30-50 for longs, penalizes both overbought and oversold extremes.
fn rsi_sub_score(rsi: f64) -> f64 {
    if rsi < 30.0 {
        0.3
    } else if rsi < 45.0 {
        1.0
    } else if rsi < 55.0 {
        0.8
    } else if rsi < 70.0 {
        0.5
    } else {
        0.2
    }
}

fn bb_sub_score(bb_position: f64) -> f64 {
    if bb_position < 0.3 {
        1.0
    } else if bb_position < 0.5 {
        0.9
    } else if bb_position < 0.7 {
        0.6
    } else {
        0.2
    }
}

/// Oversold stochastic only scores well when the longer-term trend is up.
fn stoch_sub_score(stoch_k: f64, momentum_long: f64) -> f64 {
    if stoch_k < 20.0 {
        if momentum_long > 0.0 {
            1.0
        } else {
            0.3
        }
    } else if stoch_k < 40.0 {
        0.9
    } else if stoch_k < 60.0 {
        0.7
    } else if stoch_k < 80.0 {
        0.4
    } else {
        0.1
    }
}

fn momentum_context_sub_score(momentum_short: f64, momentum_long: f64) -> f64 {
    if momentum_short > -0.005 && momentum_short < 0.002 && momentum_long > 0.001 {
        1.0
    } else if momentum_long > 0.0 && momentum_short < 0.0 {
        0.6
    } else {
        0.3
    }
}

/// High volume is good context for an entry only when not already overbought.
fn volume_context_sub_score(volume_ratio: f64, rsi: f64) -> f64 {
    if volume_ratio > 1.5 {
        if rsi < 55.0 {
            1.0
        } else {
            0.3
        }
    } else if volume_ratio > 1.2 {
        0.8
    } else if volume_ratio > 0.8 {
        0.6
    } else {
        0.4
    }
}

fn trend_quality_sub_score(trend_strength: f64) -> f64 {
    clamp01(trend_strength / 100.0)
}

/// A pullback (slightly negative MACD) in an established uptrend scores best.
fn macd_context_sub_score(macd_hist: f64, momentum_long: f64) -> f64 {
    if momentum_long > 0.0 && macd_hist < 0.0 && macd_hist > -0.5 {
        1.0
    } else if macd_hist > 0.0 {
        if macd_hist < 2.0 {
            0.7
        } else {
            0.3
        }
    } else {
        0.5
    }
}

/// The centerpiece entry-quality score: favors pullbacks inside a
/// positive trend over extended momentum runs.
pub fn opportunity_score(f: &FeatureVector) -> f64 {
    let rsi_s = rsi_sub_score(f.rsi);
    let bb_s = bb_sub_score(f.bb_position);
    let stoch_s = stoch_sub_score(f.stoch_k, f.momentum_long);
    let mom_s = momentum_context_sub_score(f.momentum_short, f.momentum_long);
    let vol_s = volume_context_sub_score(f.volume_ratio, f.rsi);
    let trend_s = trend_quality_sub_score(f.trend_strength);
    let macd_s = macd_context_sub_score(f.macd_hist, f.momentum_long);

    let weighted = 0.25 * rsi_s + 0.20 * bb_s + 0.15 * stoch_s + 0.15 * mom_s + 0.10 * vol_s + 0.10 * trend_s + 0.05 * macd_s;

    let divergence_penalty = if f.rsi_bearish_divergence { 0.5 } else { 1.0 };

    (100.0 * weighted * divergence_penalty).clamp(0.0, 100.0)
}

pub fn combined_score(opportunity: f64, composite: f64, volume_composite: f64, signal_strength: f64) -> f64 {
    0.50 * opportunity + 0.25 * composite + 0.15 * volume_composite + 0.10 * signal_strength
}

/// Simple blended confidence metric from momentum/rsi/macd/trend/volume.
pub fn confidence_score(f: &FeatureVector) -> f64 {
    let momentum_n = clamp01((f.momentum_short.abs() + f.momentum_long.abs()) * 25.0);
    let rsi_n = clamp01((f.rsi - 50.0).abs() / 50.0);
    let macd_n = clamp01(f.macd_hist.abs() * 50.0);
    let trend_n = clamp01(f.trend_strength / 100.0);
    let volume_n = clamp01(f.volume_ratio / 2.0);

    (100.0 * (momentum_n + rsi_n + macd_n + trend_n + volume_n) / 5.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_features() -> FeatureVector {
        FeatureVector {
            price: 100.0,
            momentum_short: 0.0,
            momentum_long: 0.0,
            momentum_7d: 0.0,
            momentum_30d: 0.0,
            rsi: 50.0,
            stoch_k: 50.0,
            stoch_d: 50.0,
            macd_hist: 0.0,
            ema_5: 100.0,
            ema_9: 100.0,
            ema_13: 100.0,
            ema_21: 100.0,
            ema_50: 100.0,
            ema_200: 100.0,
            sma_20: 100.0,
            sma_50: 100.0,
            adx: 20.0,
            atr: 1.0,
            bb_upper: 101.0,
            bb_middle: 100.0,
            bb_lower: 99.0,
            bb_width: 0.02,
            bb_position: 0.5,
            volume_ratio: 1.0,
            obv: 0.0,
            poc_price: 100.0,
            poc_distance: 0.0,
            poc_bin_share: 0.3,
            anchored_poc_price: 100.0,
            fixed_range_poc_price: 100.0,
            tenkan: 100.0,
            kijun: 100.0,
            senkou_a: 99.0,
            senkou_b: 98.0,
            cloud_green: true,
            vwap: 100.0,
            vwap_bullish: false,
            fib_nearest_retracement: 100.0,
            fib_nearest_extension: 105.0,
            fib_direction_bull: true,
            fib_confluence_score: 0.0,
            rsi_bearish_divergence: false,
            regime: crate::domain::Regime::Ranging,
            regime_confidence: 50.0,
            trend_strength: 20.0,
            volatility: crate::domain::Volatility::Med,
            atr_pct: 1.0,
            suggested_opportunity_threshold: 80.0,
            regime_state: "neutral_neutral",
        }
    }

    #[test]
    fn scores_stay_within_bounds() {
        let f = base_features();
        let comp = composite_score(&f);
        let vol = volume_composite_score(&f);
        let opp = opportunity_score(&f);
        assert!((0.0..=100.0).contains(&comp));
        assert!((0.0..=100.0).contains(&vol));
        assert!((0.0..=100.0).contains(&opp));
    }

    #[test]
    fn bearish_divergence_halves_opportunity() {
        let mut f = base_features();
        f.rsi = 35.0;
        let without = opportunity_score(&f);
        f.rsi_bearish_divergence = true;
        let with = opportunity_score(&f);
        assert!((with - without / 2.0).abs() < 1e-9);
    }

    #[test]
    fn combined_score_matches_weighted_formula() {
        let combined = combined_score(80.0, 60.0, 40.0, 70.0);
        let expected = 0.50 * 80.0 + 0.25 * 60.0 + 0.15 * 40.0 + 0.10 * 70.0;
        assert!((combined - expected).abs() < 1e-9);
    }
}
