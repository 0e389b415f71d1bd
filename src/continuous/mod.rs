// src/continuous/mod.rs
//
// The continuous pipeline: four independent loops sharing bounded
// ring buffers, lifecycle-managed with the same
// `DashMap<Uuid, AbortHandle>` + `futures::abortable` pattern
// (`scheduler.rs`), generalized from "scheduled trading tasks" to
// "scan loops".

pub mod analysis;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::{abortable, AbortHandle};
use futures::FutureExt;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::domain::{Candle, CandleSeries, Signal, Symbol, Timeframe, Volatility};
use crate::indicators;
use crate::persistence::PersistenceStore;
use crate::ringbuffer::RingBuffer;
use crate::scan::{single_exchange_scan, ExchangeContext, ScanRequest, SingleScanOutcome};
use crate::scoring;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickEntry {
    pub price: f64,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketState {
    pub breadth_ratio: f64,
    pub volatility_regime: &'static str,
    pub active_signals: usize,
    pub updated_at: DateTime<Utc>,
}

fn key(exchange: &str, symbol: &Symbol) -> String {
    format!("{exchange}:{}", symbol.pair)
}

fn tf_key(exchange: &str, symbol: &Symbol, tf: Timeframe) -> String {
    format!("{exchange}:{}:{}", symbol.pair, tf.as_str())
}

pub struct ContinuousPipeline {
    settings: Settings,
    tick_buffers: DashMap<String, Arc<RingBuffer<TickEntry>>>,
    signal_buffers: DashMap<String, Arc<RingBuffer<Signal>>>,
    market_state: RwLock<Option<MarketState>>,
    last_full_scan: RwLock<Option<Arc<SingleScanOutcome>>>,
    running: Arc<AtomicBool>,
    tasks: DashMap<Uuid, AbortHandle>,
}

impl ContinuousPipeline {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            tick_buffers: DashMap::new(),
            signal_buffers: DashMap::new(),
            market_state: RwLock::new(None),
            last_full_scan: RwLock::new(None),
            running: Arc::new(AtomicBool::new(false)),
            tasks: DashMap::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn market_state(&self) -> Option<MarketState> {
        self.market_state.read().expect("market state lock poisoned").clone()
    }

    pub fn buffer_sizes(&self) -> HashMap<String, usize> {
        let mut sizes = HashMap::new();
        for kv in self.tick_buffers.iter() {
            sizes.insert(format!("tick:{}", kv.key()), kv.value().len());
        }
        for kv in self.signal_buffers.iter() {
            sizes.insert(format!("signal:{}", kv.key()), kv.value().len());
        }
        sizes
    }

    pub fn recent_signals(&self, symbol: Option<&str>, timeframe: Option<Timeframe>, min_score: f64, limit: usize) -> Vec<Signal> {
        let mut all = Vec::new();
        for kv in self.signal_buffers.iter() {
            if let Some(sym) = symbol {
                if !kv.key().contains(sym) {
                    continue;
                }
            }
            if let Some(tf) = timeframe {
                if !kv.key().ends_with(&format!(":{}", tf.as_str())) {
                    continue;
                }
            }
            all.extend(kv.value().snapshot().into_iter().filter(|s| s.combined_score >= min_score));
        }
        all.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap()
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        all.truncate(limit);
        all
    }

    /// Multi-timeframe confluence query: average combined_score across
    /// the latest signal per configured timeframe for `symbol`.
    pub fn confluence(&self, exchange: &str, symbol: &Symbol, min_score: f64) -> Option<Confluence> {
        let mut latest = Vec::new();
        for tf in Timeframe::CONTINUOUS_SET {
            if let Some(buf) = self.signal_buffers.get(&tf_key(exchange, symbol, tf)) {
                if let Some(signal) = buf.last() {
                    latest.push(signal);
                }
            }
        }
        if latest.is_empty() {
            return None;
        }

        let mean_score = latest.iter().map(|s| s.combined_score).sum::<f64>() / latest.len() as f64;
        let bullish = latest.iter().filter(|s| s.signal_label.wire_direction() == "BUY").count();
        let bearish = latest.iter().filter(|s| s.signal_label.wire_direction() == "SELL").count();
        let min_observed = latest.iter().map(|s| s.combined_score).fold(f64::MAX, f64::min);

        let confluence = (bullish >= 2 || bearish >= 2) && min_observed >= min_score;
        let recommendation = if confluence && mean_score > 75.0 {
            "STRONG"
        } else if confluence {
            "MODERATE"
        } else {
            "WEAK"
        };

        Some(Confluence { mean_score, bullish, bearish, confluence, recommendation })
    }

    pub fn last_full_scan(&self) -> Option<Arc<SingleScanOutcome>> {
        self.last_full_scan.read().expect("last-scan lock poisoned").clone()
    }

    /// Starts all four loops if not already running. `primary` is the
    /// exchange L4's periodic full scan runs against.
    pub fn start(
        self: &Arc<Self>,
        contexts: HashMap<String, Arc<ExchangeContext>>,
        symbols: Vec<Symbol>,
        primary_exchange: String,
        persistence: Arc<PersistenceStore>,
    ) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        self.spawn_loop(Duration::from_secs(self.settings.tick_loop_period_secs), {
            let this = self.clone();
            let contexts = contexts.clone();
            let symbols = symbols.clone();
            move || this.clone().tick_iteration(contexts.clone(), symbols.clone())
        });

        self.spawn_loop(Duration::from_secs(self.settings.signal_loop_period_secs), {
            let this = self.clone();
            let contexts = contexts.clone();
            let symbols = symbols.clone();
            let persistence = persistence.clone();
            move || this.clone().signal_iteration(contexts.clone(), symbols.clone(), persistence.clone())
        });

        self.spawn_loop(Duration::from_secs(self.settings.market_state_loop_period_secs), {
            let this = self.clone();
            move || this.clone().market_state_iteration()
        });

        self.spawn_loop(Duration::from_secs(self.settings.full_scan_loop_period_secs), {
            let this = self.clone();
            let contexts = contexts.clone();
            let symbols = symbols.clone();
            move || this.clone().full_scan_iteration(contexts.clone(), symbols.clone(), primary_exchange.clone())
        });

        info!("continuous pipeline started");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        for entry in self.tasks.iter() {
            entry.value().abort();
        }
        self.tasks.clear();
        info!("continuous pipeline stopped");
    }

    fn spawn_loop<F, Fut>(self: &Arc<Self>, period: Duration, mut iteration: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let running = self.running.clone();
        let half_period = period / 2;
        let (fut, handle) = abortable(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let result = std::panic::AssertUnwindSafe(iteration()).catch_unwind().await;
                if result.is_err() {
                    error!("continuous loop iteration panicked");
                    tokio::time::sleep(half_period).await;
                }
            }
        });
        self.tasks.insert(Uuid::new_v4(), handle);
        tokio::spawn(fut);
    }

    async fn tick_iteration(self: Arc<Self>, contexts: HashMap<String, Arc<ExchangeContext>>, symbols: Vec<Symbol>) {
        for (exchange_id, ctx) in &contexts {
            for symbol in &symbols {
                match ctx.adapter.fetch_ticker(symbol).await {
                    Ok(ticker) => {
                        let buf = self
                            .tick_buffers
                            .entry(key(exchange_id, symbol))
                            .or_insert_with(|| Arc::new(RingBuffer::new(self.settings.tick_buffer_capacity)))
                            .clone();
                        buf.push(TickEntry { price: ticker.last, ts: Utc::now() });
                    }
                    Err(err) => {
                        tracing::debug!(symbol = %symbol.pair, error = %err, "tick fetch failed");
                    }
                }
            }
        }
    }

    async fn signal_iteration(
        self: Arc<Self>,
        contexts: HashMap<String, Arc<ExchangeContext>>,
        symbols: Vec<Symbol>,
        persistence: Arc<PersistenceStore>,
    ) {
        for (exchange_id, ctx) in &contexts {
            for symbol in &symbols {
                for tf in Timeframe::CONTINUOUS_SET {
                    let candles = match ctx.adapter.fetch_ohlcv(symbol, tf, 100).await {
                        Ok(c) => c,
                        Err(err) => {
                            tracing::debug!(symbol = %symbol.pair, tf = %tf, error = %err, "signal loop fetch failed");
                            continue;
                        }
                    };
                    let series = CandleSeries::from_raw(symbol.clone(), tf, candles.clone());
                    if series.len() < 20 {
                        continue;
                    }
                    let combined = analysis::combine(&series.candles);
                    let signal = match indicators::compute_features(&series) {
                        Ok(features) => scoring::score(symbol, crate::domain::MarketType::Swap, tf, features),
                        Err(_) => continue,
                    };

                    let buf = self
                        .signal_buffers
                        .entry(tf_key(exchange_id, symbol, tf))
                        .or_insert_with(|| Arc::new(RingBuffer::new(self.settings.signal_buffer_capacity)))
                        .clone();
                    buf.push(signal.clone());

                    if let Err(err) = persistence.append_signal(exchange_id, &signal).await {
                        tracing::warn!(error = %err, "failed to persist continuous-loop signal");
                    }

                    tracing::debug!(
                        symbol = %symbol.pair,
                        tf = %tf,
                        continuous_score = combined.combined_score,
                        continuous_signal = combined.signal.as_str(),
                        "continuous per-timeframe signal computed"
                    );
                }
            }
        }
    }

    async fn market_state_iteration(self: Arc<Self>) {
        let mut advancing = 0usize;
        let mut declining = 0usize;
        let mut abs_returns = Vec::new();

        for kv in self.tick_buffers.iter() {
            let entries = kv.value().snapshot();
            if entries.len() < 2 {
                continue;
            }
            let first = entries.first().unwrap().price;
            let last = entries.last().unwrap().price;
            if last > first {
                advancing += 1;
            } else if last < first {
                declining += 1;
            }
            for w in entries.windows(2) {
                if w[0].price > 0.0 {
                    abs_returns.push(((w[1].price - w[0].price) / w[0].price).abs());
                }
            }
        }

        let breadth_ratio = if advancing + declining > 0 {
            advancing as f64 / (advancing + declining) as f64
        } else {
            0.5
        };

        let mean_abs_return = if abs_returns.is_empty() {
            0.0
        } else {
            abs_returns.iter().sum::<f64>() / abs_returns.len() as f64
        };
        let volatility_regime = if mean_abs_return < 0.002 {
            Volatility::Low
        } else if mean_abs_return < 0.008 {
            Volatility::Med
        } else {
            Volatility::High
        };

        let active_signals = self
            .signal_buffers
            .iter()
            .flat_map(|kv| kv.value().snapshot())
            .filter(|s| s.combined_score > 60.0)
            .count();

        *self.market_state.write().expect("market state lock poisoned") = Some(MarketState {
            breadth_ratio,
            volatility_regime: volatility_regime.as_str(),
            active_signals,
            updated_at: Utc::now(),
        });
    }

    async fn full_scan_iteration(
        self: Arc<Self>,
        contexts: HashMap<String, Arc<ExchangeContext>>,
        symbols: Vec<Symbol>,
        primary_exchange: String,
    ) {
        let Some(ctx) = contexts.get(&primary_exchange) else {
            tracing::warn!(exchange = %primary_exchange, "primary exchange not configured for full scan loop");
            return;
        };
        let req = ScanRequest {
            timeframe: Timeframe::H1,
            signal_filter: crate::scan::SignalFilter::All,
            min_strength: 0.0,
            top_n: self.settings.default_top_n,
            market_type: crate::domain::MarketType::Swap,
            quote: "USDT".to_string(),
            candle_limit: 300,
        };
        let outcome = single_exchange_scan(ctx, &symbols, &req).await;
        *self.last_full_scan.write().expect("last-scan lock poisoned") = Some(Arc::new(SingleScanOutcome {
            signals: outcome.signals,
            total_scanned: outcome.total_scanned,
            timing: outcome.timing,
        }));
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Confluence {
    pub mean_score: f64,
    pub bullish: usize,
    pub bearish: usize,
    pub confluence: bool,
    pub recommendation: &'static str,
}
