// src/scoring/state.rs
//
// Legacy volatility-scaled state machine. Thresholds scale with
// `vol_ratio` clamped to [0.5, 2.0] so a quiet vs. choppy symbol isn't
// judged against the same fixed cutoffs. Predicates are tried in a
// fixed order; the first match wins.

use crate::domain::{FeatureVector, SignalState};

pub fn classify_state(f: &FeatureVector) -> SignalState {
    let vol_mult = f.volume_ratio.clamp(0.5, 2.0);
    let th_high = 0.07 * vol_mult;
    let th_med = 0.035 * vol_mult;
    let th_low = 0.015 * vol_mult;

    let mom7 = f.momentum_7d;
    let mom30 = f.momentum_30d;
    let rsi = f.rsi;
    let macd = f.macd_hist;
    let bb = f.bb_position;

    if mom7 > th_med && mom30 > th_high && mom7 < 0.5 * mom30 {
        return SignalState::ConsistentUptrend;
    }
    if mom7 > th_high && mom30.abs() < th_med {
        return SignalState::NewSpike;
    }
    if mom7 < -th_med && mom30 > th_high && bb > 0.80 && rsi > 65.0 {
        return SignalState::ToppingOut;
    }
    if mom7.abs() < th_low && mom30.abs() < th_med {
        return SignalState::Lagging;
    }
    if mom7 > th_low && mom7 < th_high && mom30 > th_med && mom30 < th_high {
        return SignalState::ModerateUptrend;
    }
    if mom7 > th_med && mom30 < -th_med && rsi < 45.0 {
        return SignalState::PotentialReversal;
    }
    if mom7.abs() < th_low && mom30.abs() < th_low && (40.0..=60.0).contains(&rsi) {
        return SignalState::Consolidation;
    }
    if mom7 > th_low && mom30.abs() < th_low {
        return SignalState::WeakUptrend;
    }
    if rsi > 75.0 && mom7 > th_med {
        return SignalState::Overbought;
    }
    if rsi < 25.0 && mom7 < -th_med {
        return SignalState::Oversold;
    }
    if macd > 0.0 && mom7 > th_med {
        return SignalState::MacdBullish;
    }
    if macd < 0.0 && mom7 < -th_med {
        return SignalState::MacdBearish;
    }
    SignalState::Neutral
}
