// src/indicators/vwap.rs

use crate::domain::Candle;

pub fn vwap(candles: &[Candle]) -> f64 {
    let (pv, vol): (f64, f64) = candles
        .iter()
        .fold((0.0, 0.0), |(pv, vol), c| (pv + c.typical_price() * c.volume, vol + c.volume));
    if vol > 0.0 {
        pv / vol
    } else {
        candles.last().map(|c| c.close).unwrap_or(0.0)
    }
}
