// src/scoring/thresholds.rs
//
// Per-(market-type, timeframe) thresholds for the signal-label rules.
// Per-timeframe values are the crypto bucket of the source threshold
// table (scalping/short/medium/daily/weekly); H4 interpolates between
// the medium and daily buckets since the source table has no 4h entry.
// Leveraged market types (futures/swap) widen the momentum threshold so
// leverage-amplified noise doesn't fire the label as readily as spot.

use crate::domain::{MarketType, Timeframe};

#[derive(Debug, Clone, Copy)]
pub struct LabelThresholds {
    pub mom_th: f64,
    pub rsi_min: f64,
    pub rsi_max: f64,
    pub macd_min: f64,
}

fn base_thresholds(timeframe: Timeframe) -> LabelThresholds {
    match timeframe {
        Timeframe::M1 => LabelThresholds { mom_th: 0.01, rsi_min: 55.0, rsi_max: 70.0, macd_min: 0.0 },
        Timeframe::M5 => LabelThresholds { mom_th: 0.03, rsi_min: 52.0, rsi_max: 68.0, macd_min: 0.0 },
        Timeframe::H1 => LabelThresholds { mom_th: 0.05, rsi_min: 50.0, rsi_max: 65.0, macd_min: 0.0 },
        Timeframe::H4 => LabelThresholds { mom_th: 0.055, rsi_min: 50.0, rsi_max: 65.0, macd_min: 0.0 },
        Timeframe::D1 => LabelThresholds { mom_th: 0.06, rsi_min: 50.0, rsi_max: 65.0, macd_min: 0.0 },
        Timeframe::W1 => LabelThresholds { mom_th: 0.15, rsi_min: 45.0, rsi_max: 70.0, macd_min: 0.0 },
    }
}

pub fn label_thresholds(market_type: MarketType, timeframe: Timeframe) -> LabelThresholds {
    let base = base_thresholds(timeframe);
    match market_type {
        MarketType::Spot => base,
        MarketType::Future | MarketType::Swap => LabelThresholds { mom_th: base.mom_th * 1.15, ..base },
    }
}
