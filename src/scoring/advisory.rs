// src/scoring/advisory.rs
//
// Stop-loss / take-profit advisory. For a buy, the stop is the max
// (closest-to-price, least-risk) of the ATR/support/percent candidates
// whose distance from price falls in (0.5%, 8%); take-profit is
// whichever of (entry + RR*risk) or resistance is nearer, as long as
// resistance still sits beyond entry. Sell mirrors this; neutral rows
// get a symmetric +/-3%.

use crate::domain::{SignalLabel, SlTpAdvisory};

const DEFAULT_RR: f64 = 2.5;
const MIN_STOP_DISTANCE_PCT: f64 = 0.005;
const MAX_STOP_DISTANCE_PCT: f64 = 0.08;

pub fn sl_tp_advisory(
    label: SignalLabel,
    price: f64,
    atr: f64,
    support: Option<f64>,
    resistance: Option<f64>,
) -> SlTpAdvisory {
    match label.wire_direction() {
        "BUY" => buy_advisory(price, atr, support, resistance),
        "SELL" => sell_advisory(price, atr, support, resistance),
        _ => neutral_advisory(price, support, resistance),
    }
}

fn valid_distance(price: f64, candidate: f64) -> bool {
    let pct = (price - candidate).abs() / price;
    pct > MIN_STOP_DISTANCE_PCT && pct < MAX_STOP_DISTANCE_PCT
}

fn buy_advisory(price: f64, atr: f64, support: Option<f64>, resistance: Option<f64>) -> SlTpAdvisory {
    let mut candidates = vec![price - 1.5 * atr, price * 0.97];
    if let Some(s) = support {
        candidates.push(s * 0.995);
    }
    let valid: Vec<f64> = candidates.iter().copied().filter(|c| valid_distance(price, *c)).collect();
    let stop = valid.iter().copied().fold(f64::MIN, f64::max);
    let stop = if valid.is_empty() { price * 0.97 } else { stop };

    let risk = price - stop;
    let reward_by_rr = price + DEFAULT_RR * risk;
    let resistance_tp = resistance.map(|r| r * 0.995);

    let take_profit = match resistance_tp {
        Some(r_tp) if r_tp > price && r_tp < reward_by_rr => r_tp,
        _ => reward_by_rr,
    };

    build(price, stop, take_profit, support, resistance)
}

fn sell_advisory(price: f64, atr: f64, support: Option<f64>, resistance: Option<f64>) -> SlTpAdvisory {
    let mut candidates = vec![price + 1.5 * atr, price * 1.03];
    if let Some(r) = resistance {
        candidates.push(r * 1.005);
    }
    let valid: Vec<f64> = candidates.iter().copied().filter(|c| valid_distance(price, *c)).collect();
    let stop = valid.iter().copied().fold(f64::MAX, f64::min);
    let stop = if valid.is_empty() { price * 1.03 } else { stop };

    let risk = stop - price;
    let reward_by_rr = price - DEFAULT_RR * risk;
    let support_tp = support.map(|s| s * 1.005);

    let take_profit = match support_tp {
        Some(s_tp) if s_tp < price && s_tp > reward_by_rr => s_tp,
        _ => reward_by_rr,
    };

    build(price, stop, take_profit, support, resistance)
}

fn neutral_advisory(price: f64, support: Option<f64>, resistance: Option<f64>) -> SlTpAdvisory {
    build(price, price * 0.97, price * 1.03, support, resistance)
}

fn build(price: f64, stop: f64, take_profit: f64, support: Option<f64>, resistance: Option<f64>) -> SlTpAdvisory {
    let risk_amount = (price - stop).abs();
    let reward_amount = (take_profit - price).abs();
    let risk_reward_ratio = if risk_amount > 0.0 { reward_amount / risk_amount } else { 0.0 };
    SlTpAdvisory {
        stop_loss: stop,
        take_profit,
        risk_amount,
        reward_amount,
        risk_reward_ratio,
        stop_loss_pct: risk_amount / price,
        take_profit_pct: reward_amount / price,
        support_level: support,
        resistance_level: resistance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_buy_overbought_scenario_matches_worked_example() {
        let advisory = buy_advisory(100.0, 1.0, Some(92.0), Some(101.0));
        assert!((advisory.stop_loss - 98.5).abs() < 1e-9);
        assert!((advisory.risk_amount - 1.5).abs() < 1e-9);
        assert!((advisory.take_profit - 100.495).abs() < 1e-6);
        assert!((advisory.risk_reward_ratio - (0.495 / 1.5)).abs() < 1e-6);
    }
}
