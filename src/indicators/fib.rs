// src/indicators/fib.rs
//
// Swing-based Fibonacci retracement/extension levels over the last
// min(len, 55) bars, plus a tolerance-banded confluence score against
// POC/VWAP.

use crate::domain::Candle;

const RETRACEMENTS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];
const EXTENSIONS: [f64; 3] = [1.272, 1.618, 2.0];

pub struct FibLevels {
    pub nearest_retracement: f64,
    pub nearest_extension: f64,
    pub direction_bull: bool,
}

pub fn fib_levels(candles: &[Candle], price: f64) -> FibLevels {
    let lookback = candles.len().min(55);
    if lookback == 0 {
        return FibLevels { nearest_retracement: price, nearest_extension: price, direction_bull: true };
    }
    let window = &candles[candles.len() - lookback..];

    let (high_idx, _) = window
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.high.partial_cmp(&b.1.high).unwrap())
        .unwrap();
    let (low_idx, _) = window
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.low.partial_cmp(&b.1.low).unwrap())
        .unwrap();

    let swing_high = window[high_idx].high;
    let swing_low = window[low_idx].low;
    let direction_bull = low_idx < high_idx;
    let range = swing_high - swing_low;

    let retracement_prices: Vec<f64> = if direction_bull {
        RETRACEMENTS.iter().map(|r| swing_high - range * r).collect()
    } else {
        RETRACEMENTS.iter().map(|r| swing_low + range * r).collect()
    };
    let extension_prices: Vec<f64> = if direction_bull {
        EXTENSIONS.iter().map(|e| swing_high + range * (e - 1.0)).collect()
    } else {
        EXTENSIONS.iter().map(|e| swing_low - range * (e - 1.0)).collect()
    };

    let nearest_retracement = nearest(&retracement_prices, price);
    let nearest_extension = nearest(&extension_prices, price);

    FibLevels { nearest_retracement, nearest_extension, direction_bull }
}

fn nearest(levels: &[f64], price: f64) -> f64 {
    levels
        .iter()
        .copied()
        .min_by(|a, b| (a - price).abs().partial_cmp(&(b - price).abs()).unwrap())
        .unwrap_or(price)
}

/// Scores [0,100] how tightly `price` clusters with the nearest fib
/// level, the POC, and the VWAP — closer agreement across more of the
/// three yields a higher score.
pub fn fib_confluence_score(price: f64, nearest_fib: f64, poc_price: f64, vwap: f64) -> f64 {
    let tolerance = price.abs().max(1.0) * 0.005;
    let mut hits = 0;
    let mut total = 0;
    for level in [nearest_fib, poc_price, vwap] {
        if level == 0.0 {
            continue;
        }
        total += 1;
        if (price - level).abs() <= tolerance {
            hits += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    100.0 * hits as f64 / total as f64
}
