// src/indicators/volume_profile.rs
//
// Histogram of close prices weighted by volume across equal-width bins;
// POC is the midpoint of the argmax bin. Anchored/fixed-range variants
// use different sub-windows of the same series.

use crate::domain::Candle;

pub struct VolumeProfile {
    pub poc_price: f64,
    pub bin_share: f64,
}

pub fn volume_profile(window: &[Candle], bins: usize) -> VolumeProfile {
    if window.is_empty() || bins == 0 {
        return VolumeProfile { poc_price: 0.0, bin_share: 0.0 };
    }
    let min = window.iter().map(|c| c.close).fold(f64::MAX, f64::min);
    let max = window.iter().map(|c| c.close).fold(f64::MIN, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return VolumeProfile { poc_price: min, bin_share: 1.0 };
    }
    let bin_width = (max - min) / bins as f64;
    let mut histogram = vec![0.0f64; bins];
    for c in window {
        let mut idx = ((c.close - min) / bin_width) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        histogram[idx] += c.volume;
    }
    let total_volume: f64 = histogram.iter().sum();
    let (argmax, max_vol) = histogram
        .iter()
        .enumerate()
        .fold((0usize, f64::MIN), |acc, (i, v)| if *v > acc.1 { (i, *v) } else { acc });
    let poc_price = min + bin_width * (argmax as f64 + 0.5);
    let bin_share = if total_volume > 0.0 { max_vol / total_volume } else { 0.0 };
    VolumeProfile { poc_price, bin_share }
}

/// Anchored at the bar with the global-max high.
pub fn anchored_poc(window: &[Candle], bins: usize) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let anchor_idx = window
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.high.partial_cmp(&b.1.high).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0);
    volume_profile(&window[anchor_idx..], bins).poc_price
}

/// Filters to candles whose close falls within 20% of the full
/// high/low range of the current close, then profiles that subset.
pub fn fixed_range_poc(window: &[Candle], bins: usize) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let high_max = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low_min = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let price_range = (high_max - low_min) * 0.2;
    let close = window.last().unwrap().close;
    let price_min = close - price_range / 2.0;
    let price_max = close + price_range / 2.0;

    let filtered: Vec<Candle> =
        window.iter().filter(|c| c.close >= price_min && c.close <= price_max).copied().collect();
    volume_profile(&filtered, bins).poc_price
}
