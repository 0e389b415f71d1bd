// src/routes/wire.rs
//
// Shapes a `Signal` into the stable wire-contract object: the
// internal seven-way label collapses to BUY/SELL/HOLD, every advanced
// field is present (null when not computable never actually arises here
// since scoring always produces a value).

use serde_json::{json, Value};

use crate::domain::Signal;

pub fn signal_to_wire(exchange: &str, signal: &Signal) -> Value {
    let f = &signal.features;
    json!({
        "id": signal.id,
        "symbol": signal.symbol.pair,
        "exchange": exchange,
        "timeframe": signal.timeframe.as_str(),
        "signal": signal.signal_label.wire_direction(),
        "strength": signal.signal_strength.round() as i64,
        "price": signal.price,
        "change": f.momentum_short,
        "volume": f.volume_ratio,
        "timestamp": signal.timestamp.to_rfc3339(),
        "indicators": {
            "rsi": f.rsi,
            "macd": if f.macd_hist >= 0.0 { "bullish" } else { "bearish" },
            "ema": if f.price >= f.ema_21 { "above" } else { "below" },
            "volume": volume_bucket(f.volume_ratio),
        },
        "advanced": {
            "opportunity_score": signal.opportunity_score,
            "composite_score": signal.composite_score,
            "trend_score": f.trend_strength,
            "confidence_score": signal.confidence_score,
            "combined_score": signal.combined_score,
            "ichimoku_bullish": f.cloud_green && f.price > f.senkou_a.max(f.senkou_b),
            "vwap_bullish": f.vwap_bullish,
            "bb_position": f.bb_position,
        },
        "risk_reward": {
            "entry_price": signal.price,
            "stop_loss": signal.sl_tp_advisory.stop_loss,
            "take_profit": signal.sl_tp_advisory.take_profit,
            "risk_amount": signal.sl_tp_advisory.risk_amount,
            "reward_amount": signal.sl_tp_advisory.reward_amount,
            "risk_reward_ratio": signal.sl_tp_advisory.risk_reward_ratio,
            "stop_loss_pct": signal.sl_tp_advisory.stop_loss_pct,
            "take_profit_pct": signal.sl_tp_advisory.take_profit_pct,
            "support_level": signal.sl_tp_advisory.support_level,
            "resistance_level": signal.sl_tp_advisory.resistance_level,
        },
        "market_regime": {
            "regime": signal.regime.as_str(),
            "confidence": f.regime_confidence,
            "trend_strength": f.trend_strength,
            "volatility": f.volatility.as_str(),
            "suggested_threshold": f.suggested_opportunity_threshold,
        },
    })
}

fn volume_bucket(volume_ratio: f64) -> &'static str {
    if volume_ratio > 3.0 {
        "very_high"
    } else if volume_ratio > 1.5 {
        "high"
    } else {
        "medium"
    }
}
