// src/scoring/label.rs
//
// Signal-label classification from (momentum_short, momentum_long, rsi,
// macd_hist) against per-(market-type, timeframe) thresholds, gated by
// Ichimoku for the Strong Buy/Sell rules.

use crate::domain::{FeatureVector, MarketType, SignalLabel, Timeframe};
use crate::scoring::thresholds::label_thresholds;

pub fn classify_label(f: &FeatureVector, market_type: MarketType, timeframe: Timeframe) -> SignalLabel {
    let t = label_thresholds(market_type, timeframe);
    let ichimoku_bullish = f.cloud_green && f.price > f.senkou_a.max(f.senkou_b);
    let ichimoku_bearish = !f.cloud_green && f.price < f.senkou_a.min(f.senkou_b);

    if f.momentum_short > 2.0 * t.mom_th
        && f.momentum_long > t.mom_th
        && f.rsi > t.rsi_min
        && f.rsi < t.rsi_max
        && f.macd_hist > t.macd_min
        && ichimoku_bullish
    {
        return SignalLabel::StrongBuy;
    }
    if f.momentum_short < -2.0 * t.mom_th
        && f.momentum_long < -t.mom_th
        && f.rsi < (100.0 - t.rsi_min)
        && f.rsi > (100.0 - t.rsi_max)
        && f.macd_hist < -t.macd_min
        && ichimoku_bearish
    {
        return SignalLabel::StrongSell;
    }

    if f.momentum_short > t.mom_th && f.rsi > t.rsi_min && f.macd_hist > 0.0 {
        return SignalLabel::Buy;
    }
    if f.momentum_short < -t.mom_th && f.rsi < (100.0 - t.rsi_min) && f.macd_hist < 0.0 {
        return SignalLabel::Sell;
    }

    if f.momentum_short > 0.0 && f.rsi > 45.0 && f.macd_hist > 0.0 {
        return SignalLabel::WeakBuy;
    }
    if f.momentum_short < 0.0 && f.rsi < 55.0 && f.macd_hist < 0.0 {
        return SignalLabel::WeakSell;
    }

    SignalLabel::Neutral
}
