// src/continuous/analysis.rs
//
// The per-timeframe signal loop's three sub-scores: momentum,
// smart-mean-reversion, and candle clustering, plus their combination
// into a categorical continuous-pipeline signal. Pure functions over a
// candle window so they're independently testable.

use crate::domain::Candle;
use crate::indicators::math::rsi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuousSignal {
    MomentumBuy,
    MomentumSell,
    ReversionBullish,
    ReversionBearish,
    StrongBuy,
    StrongSell,
    WeakBuy,
    WeakSell,
    Neutral,
}

impl ContinuousSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContinuousSignal::MomentumBuy => "MOMENTUM_BUY",
            ContinuousSignal::MomentumSell => "MOMENTUM_SELL",
            ContinuousSignal::ReversionBullish => "REVERSION_BULLISH",
            ContinuousSignal::ReversionBearish => "REVERSION_BEARISH",
            ContinuousSignal::StrongBuy => "STRONG_BUY",
            ContinuousSignal::StrongSell => "STRONG_SELL",
            ContinuousSignal::WeakBuy => "WEAK_BUY",
            ContinuousSignal::WeakSell => "WEAK_SELL",
            ContinuousSignal::Neutral => "NEUTRAL",
        }
    }

    pub fn wire_direction(&self) -> &'static str {
        match self {
            ContinuousSignal::MomentumBuy
            | ContinuousSignal::ReversionBullish
            | ContinuousSignal::StrongBuy
            | ContinuousSignal::WeakBuy => "BUY",
            ContinuousSignal::MomentumSell
            | ContinuousSignal::ReversionBearish
            | ContinuousSignal::StrongSell
            | ContinuousSignal::WeakSell => "SELL",
            ContinuousSignal::Neutral => "HOLD",
        }
    }
}

fn returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| (w[1] - w[0]) / w[0].max(1e-9)).collect()
}

/// Counts consecutive same-sign, non-trivial (>0.1%) returns at the tail
/// of the series.
pub fn count_consecutive_moves(closes: &[f64]) -> usize {
    let rets = returns(closes);
    let mut count = 0;
    let mut sign: Option<bool> = None;
    for r in rets.iter().rev() {
        if r.abs() <= 0.001 {
            break;
        }
        let positive = *r > 0.0;
        match sign {
            None => {
                sign = Some(positive);
                count = 1;
            }
            Some(s) if s == positive => count += 1,
            Some(_) => break,
        }
    }
    count
}

pub struct ReversionAssessment {
    pub sub_score: f64,
    pub bearish: bool,
}

/// Smart mean-reversion sub-score: four boolean flags over the last ten
/// closes, averaged into a 0-100 score.
pub fn smart_mean_reversion(window: &[Candle]) -> ReversionAssessment {
    let closes: Vec<f64> = window.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = window.iter().map(|c| c.volume).collect();
    let last10 = if closes.len() >= 10 { &closes[closes.len() - 10..] } else { &closes[..] };

    let momentum_exhaustion = count_consecutive_moves(last10) >= 4;

    let volume_exhaustion = if volumes.len() >= 6 {
        let window_mean: f64 = volumes.iter().sum::<f64>() / volumes.len() as f64;
        let last3_mean: f64 = volumes[volumes.len() - 3..].iter().sum::<f64>() / 3.0;
        let earlier3_mean: f64 = volumes[volumes.len() - 6..volumes.len() - 3].iter().sum::<f64>() / 3.0;
        let volume_trend = if earlier3_mean > 0.0 { (last3_mean - earlier3_mean) / earlier3_mean } else { 0.0 };
        last3_mean > 1.5 * window_mean && volume_trend < -0.10
    } else {
        false
    };

    let excessive_gain = if closes.len() >= 6 {
        let then = closes[closes.len() - 6];
        let now = closes[closes.len() - 1];
        then > 0.0 && (now - then) / then > 0.15
    } else {
        false
    };

    let rsi_extreme = {
        let r = rsi(&closes, 14);
        r > 70.0 || r < 30.0
    };

    let flags = [momentum_exhaustion, volume_exhaustion, excessive_gain, rsi_extreme];
    let hit_count = flags.iter().filter(|f| **f).count();
    let sub_score = 100.0 * hit_count as f64 / 4.0;

    let last5_return = if closes.len() >= 6 {
        let then = closes[closes.len() - 6];
        let now = closes[closes.len() - 1];
        if then > 0.0 { (now - then) / then } else { 0.0 }
    } else {
        0.0
    };
    let bearish = last5_return > 0.0;

    ReversionAssessment { sub_score, bearish }
}

pub struct ClusterAssessment {
    pub directional_ratio: f64,
    pub follow_through: f64,
    pub trend_formation: bool,
    pub strength: f64,
    pub total_clusters: usize,
    pub bullish: usize,
    pub bearish: usize,
}

/// Concatenates runs of consecutive high-volume (>2x mean) bars sharing
/// a direction, over the last 20 bars.
pub fn candle_clustering(window: &[Candle]) -> ClusterAssessment {
    let last20: &[Candle] = if window.len() >= 20 { &window[window.len() - 20..] } else { window };
    if last20.len() < 2 {
        return ClusterAssessment {
            directional_ratio: 0.0,
            follow_through: 0.0,
            trend_formation: false,
            strength: 0.0,
            total_clusters: 0,
            bullish: 0,
            bearish: 0,
        };
    }

    let mean_vol: f64 = last20.iter().map(|c| c.volume).sum::<f64>() / last20.len() as f64;
    let high_volume: Vec<bool> = last20.iter().map(|c| c.volume > 2.0 * mean_vol).collect();
    let bullish_bar: Vec<bool> = last20.iter().map(|c| c.close > c.open).collect();

    let mut bullish_clusters = 0usize;
    let mut bearish_clusters = 0usize;
    let mut last_cluster_bullish: Option<bool> = None;
    let mut i = 0usize;
    while i < last20.len() {
        if !high_volume[i] {
            i += 1;
            continue;
        }
        let direction = bullish_bar[i];
        let mut j = i;
        while j < last20.len() && high_volume[j] && bullish_bar[j] == direction {
            j += 1;
        }
        if direction {
            bullish_clusters += 1;
        } else {
            bearish_clusters += 1;
        }
        last_cluster_bullish = Some(direction);
        i = j;
    }

    let total_clusters = bullish_clusters + bearish_clusters;
    let directional_ratio = if total_clusters > 0 {
        bullish_clusters.max(bearish_clusters) as f64 / total_clusters as f64
    } else {
        0.0
    };

    let follow_through = match last_cluster_bullish {
        Some(dir) => {
            let tail = &bullish_bar[bullish_bar.len() - 3.min(bullish_bar.len())..];
            tail.iter().filter(|b| **b == dir).count() as f64 / 3.0
        }
        None => 0.0,
    };

    let trend_formation = directional_ratio > 0.7 && follow_through > 0.5;
    let strength = directional_ratio * follow_through;

    ClusterAssessment {
        directional_ratio,
        follow_through,
        trend_formation,
        strength,
        total_clusters,
        bullish: bullish_clusters,
        bearish: bearish_clusters,
    }
}

pub struct CombinedLoopScore {
    pub combined_score: f64,
    pub signal: ContinuousSignal,
}

/// Combines momentum (with cluster amplification) and mean-reversion
/// into the per-timeframe loop's categorical signal.
pub fn combine(window: &[Candle]) -> CombinedLoopScore {
    let closes: Vec<f64> = window.iter().map(|c| c.close).collect();
    let consecutive = count_consecutive_moves(&closes);
    let mut momentum_sub_score = (consecutive as f64 / 5.0 * 100.0).min(100.0);

    let cluster = candle_clustering(window);
    if cluster.trend_formation {
        momentum_sub_score *= 1.0 + cluster.strength;
        momentum_sub_score = momentum_sub_score.min(100.0);
    }

    let reversion = smart_mean_reversion(window);
    let combined_score = 0.6 * momentum_sub_score + 0.4 * reversion.sub_score;

    let last_return = closes
        .len()
        .checked_sub(2)
        .map(|i| (closes[closes.len() - 1] - closes[i]) / closes[i].max(1e-9))
        .unwrap_or(0.0);

    let signal = if combined_score > 75.0 {
        if last_return > 0.0 { ContinuousSignal::StrongBuy } else { ContinuousSignal::StrongSell }
    } else if reversion.sub_score > momentum_sub_score && reversion.sub_score > 50.0 {
        if reversion.bearish { ContinuousSignal::ReversionBearish } else { ContinuousSignal::ReversionBullish }
    } else if momentum_sub_score > 50.0 {
        if last_return > 0.0 { ContinuousSignal::MomentumBuy } else { ContinuousSignal::MomentumSell }
    } else if combined_score > 30.0 {
        if last_return > 0.0 { ContinuousSignal::WeakBuy } else { ContinuousSignal::WeakSell }
    } else {
        ContinuousSignal::Neutral
    };

    CombinedLoopScore { combined_score, signal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(open: f64, close: f64, volume: f64) -> Candle {
        Candle { ts: Utc::now(), open, high: open.max(close) + 0.1, low: open.min(close) - 0.1, close, volume }
    }

    #[test]
    fn counts_consecutive_same_sign_moves() {
        let closes = vec![100.0, 101.0, 102.0, 103.0, 104.0];
        assert_eq!(count_consecutive_moves(&closes), 4);
    }

    #[test]
    fn clustering_detects_trend_formation() {
        let mut window = Vec::new();
        for _ in 0..17 {
            window.push(candle(100.0, 100.5, 10.0));
        }
        for _ in 0..3 {
            window.push(candle(100.0, 101.0, 50.0));
        }
        let assessment = candle_clustering(&window);
        assert!(assessment.bullish >= 1);
    }
}
