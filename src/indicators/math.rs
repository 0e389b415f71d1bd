// src/indicators/math.rs
//
// Shared numeric helpers: explicit loops over fixed-length windows, no
// dataframe library — every indicator here operates on arrays shorter
// than a few hundred elements.

use statrs::statistics::Statistics;

pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if values.len() < period || period == 0 {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

pub fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.to_vec().std_dev()
}

/// Full EMA series (same length as `values`), seeded with the first
/// value the way a simple-then-smoothed EMA is conventionally seeded.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = v * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

pub fn ema_last(values: &[f64], period: usize) -> f64 {
    ema_series(values, period).last().copied().unwrap_or(0.0)
}

/// Wilder-smoothed RSI over `period` bars; 100 when there are no losses
/// in the window.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if closes.len() < period + 1 {
        return 50.0;
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - period..];
    let gains: f64 = recent.iter().filter(|d| **d > 0.0).sum();
    let losses: f64 = recent.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD histogram: `macd_line - signal_line`, where macd_line =
/// EMA(12) - EMA(26) and signal = EMA(9) of macd_line.
pub fn macd_histogram(closes: &[f64]) -> f64 {
    if closes.len() < 26 {
        return 0.0;
    }
    let ema12 = ema_series(closes, 12);
    let ema26 = ema_series(closes, 26);
    let macd_line: Vec<f64> = ema12.iter().zip(ema26.iter()).map(|(a, b)| a - b).collect();
    if macd_line.len() < 9 {
        return *macd_line.last().unwrap_or(&0.0);
    }
    let signal = ema_series(&macd_line, 9);
    macd_line.last().unwrap_or(&0.0) - signal.last().unwrap_or(&0.0)
}

pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low).max((high - prev_close).abs()).max((low - prev_close).abs())
}

pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    if closes.len() < period + 1 {
        return 0.0;
    }
    let mut trs = Vec::with_capacity(closes.len() - 1);
    for i in 1..closes.len() {
        trs.push(true_range(highs[i], lows[i], closes[i - 1]));
    }
    sma(&trs, period).unwrap_or(0.0)
}

/// Wilder ADX(14); 0 when the window is too short.
pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    if closes.len() < period * 2 {
        return 0.0;
    }
    let n = closes.len();
    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    let mut trs = Vec::with_capacity(n - 1);

    for i in 1..n {
        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];
        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        trs.push(true_range(highs[i], lows[i], closes[i - 1]));
    }

    let smoothed_tr = wilder_smooth(&trs, period);
    let smoothed_plus = wilder_smooth(&plus_dm, period);
    let smoothed_minus = wilder_smooth(&minus_dm, period);

    let mut dx_values = Vec::new();
    for i in 0..smoothed_tr.len() {
        if smoothed_tr[i] == 0.0 {
            dx_values.push(0.0);
            continue;
        }
        let plus_di = 100.0 * smoothed_plus[i] / smoothed_tr[i];
        let minus_di = 100.0 * smoothed_minus[i] / smoothed_tr[i];
        let sum = plus_di + minus_di;
        let dx = if sum == 0.0 { 0.0 } else { 100.0 * (plus_di - minus_di).abs() / sum };
        dx_values.push(dx);
    }

    sma(&dx_values, period).unwrap_or(0.0)
}

fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if values.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut prev: f64 = values[..period].iter().sum();
    out.push(prev);
    for &v in &values[period..] {
        prev = prev - (prev / period as f64) + v;
        out.push(prev);
    }
    out
}

pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub width: f64,
    pub position: f64,
}

pub fn bollinger(closes: &[f64], period: usize, price: f64) -> Bollinger {
    let middle = sma(closes, period).unwrap_or(price);
    let window = if closes.len() >= period { &closes[closes.len() - period..] } else { closes };
    let sd = stddev(window);
    let upper = middle + 2.0 * sd;
    let lower = middle - 2.0 * sd;
    let width = if middle != 0.0 { (upper - lower) / middle } else { 0.0 };
    let position = if (upper - lower).abs() < f64::EPSILON {
        0.5
    } else {
        ((price - lower) / (upper - lower)).clamp(0.0, 1.0)
    };
    Bollinger { upper, middle, lower, width, position }
}

pub struct Stochastic {
    pub k: f64,
    pub d: f64,
}

pub fn stochastic(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Stochastic {
    if closes.len() < period {
        return Stochastic { k: 50.0, d: 50.0 };
    }
    let mut k_values = Vec::new();
    for i in (period - 1)..closes.len() {
        let window_high = highs[i + 1 - period..=i].iter().cloned().fold(f64::MIN, f64::max);
        let window_low = lows[i + 1 - period..=i].iter().cloned().fold(f64::MAX, f64::min);
        let k = if (window_high - window_low).abs() < f64::EPSILON {
            50.0
        } else {
            100.0 * (closes[i] - window_low) / (window_high - window_low)
        };
        k_values.push(k);
    }
    let k = *k_values.last().unwrap_or(&50.0);
    let d = sma(&k_values, 3).unwrap_or(k);
    Stochastic { k, d }
}

pub fn obv(closes: &[f64], volumes: &[f64]) -> f64 {
    let mut total = 0.0;
    for i in 1..closes.len() {
        if closes[i] > closes[i - 1] {
            total += volumes[i];
        } else if closes[i] < closes[i - 1] {
            total -= volumes[i];
        }
    }
    total
}

pub fn period_return(closes: &[f64], bars_back: usize) -> f64 {
    if closes.len() <= bars_back || closes[closes.len() - 1 - bars_back] == 0.0 {
        return 0.0;
    }
    let past = closes[closes.len() - 1 - bars_back];
    let now = *closes.last().unwrap();
    (now - past) / past
}
