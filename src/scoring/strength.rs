// src/scoring/strength.rs

use crate::domain::FeatureVector;

pub fn signal_strength(f: &FeatureVector) -> f64 {
    let mut s = 50.0;

    let mom_component = (f.momentum_short.abs() * 1000.0).min(15.0) + (f.momentum_long.abs() * 500.0).min(15.0);
    let mom_sign = (f.momentum_short * f.momentum_long).signum();
    s += mom_sign * mom_component;

    if f.rsi > 40.0 && f.rsi < 60.0 {
        s += 5.0;
    } else if f.rsi > 70.0 || f.rsi < 30.0 {
        s -= 10.0;
    }

    let macd_component = (f.macd_hist.abs() * 50.0).min(10.0);
    s += f.macd_hist.signum() * macd_component;

    if f.volume_ratio > 1.2 {
        s += 5.0;
    } else if f.volume_ratio < 0.8 {
        s -= 3.0;
    }

    s.clamp(0.0, 100.0)
}
