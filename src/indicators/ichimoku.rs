// src/indicators/ichimoku.rs
//
// Standard 9/26/52 Ichimoku definitions.

use crate::domain::Candle;

pub struct Ichimoku {
    pub tenkan: f64,
    pub kijun: f64,
    pub senkou_a: f64,
    pub senkou_b: f64,
    pub cloud_green: bool,
}

fn midpoint_high_low(candles: &[Candle], period: usize) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    let window = if candles.len() >= period { &candles[candles.len() - period..] } else { candles };
    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    (high + low) / 2.0
}

pub fn ichimoku(candles: &[Candle]) -> Ichimoku {
    let tenkan = midpoint_high_low(candles, 9);
    let kijun = midpoint_high_low(candles, 26);
    let senkou_a = (tenkan + kijun) / 2.0;
    let senkou_b = midpoint_high_low(candles, 52);
    Ichimoku { tenkan, kijun, senkou_a, senkou_b, cloud_green: senkou_a > senkou_b }
}
