// src/scan/mod.rs
//
// The scan orchestrator: per-request pipeline — enumerate symbols,
// fan out bounded by each exchange's rate gate, analyze, rank, truncate.
// Uses a fan-out (`DashMap` registry +
// `tokio::spawn` per unit of work) generalized from "trading tasks" to
// "per-symbol analyses".

pub mod timing;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use metrics::histogram;
use tracing::{instrument, warn};

use crate::cache::OhlcvCache;
use crate::domain::{CandleSeries, MarketType, Signal, Symbol, Timeframe};
use crate::exchange::ExchangeAdapter;
use crate::indicators;
use crate::ratelimit::RateGate;
use crate::scoring;
use crate::utils::errors::ScanError;
use timing::{ParallelPerformance, PerExchangeOutcome, ScanTiming};

/// Everything one exchange needs to run a scan independently: its own
/// adapter, cache, and concurrency/circuit-breaker gate.
pub struct ExchangeContext {
    pub adapter: Arc<dyn ExchangeAdapter>,
    pub cache: OhlcvCache,
    pub gate: RateGate,
}

impl ExchangeContext {
    pub fn new(adapter: Arc<dyn ExchangeAdapter>, cache: OhlcvCache, gate: RateGate) -> Self {
        Self { adapter, cache, gate }
    }
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub timeframe: Timeframe,
    pub signal_filter: SignalFilter,
    pub min_strength: f64,
    pub top_n: usize,
    pub market_type: MarketType,
    pub quote: String,
    pub candle_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFilter {
    All,
    Buy,
    Sell,
    Hold,
}

impl SignalFilter {
    pub fn matches(&self, wire_direction: &str) -> bool {
        match self {
            SignalFilter::All => true,
            SignalFilter::Buy => wire_direction == "BUY",
            SignalFilter::Sell => wire_direction == "SELL",
            SignalFilter::Hold => wire_direction == "HOLD",
        }
    }
}

pub struct SingleScanOutcome {
    pub signals: Vec<Signal>,
    pub total_scanned: usize,
    pub timing: ScanTiming,
}

/// Fetches candles for one symbol, cache-first, then computes features
/// and scores them. Errors are the caller's to log-and-drop: a failed
/// symbol never fails the scan.
async fn analyze_symbol(
    ctx: &ExchangeContext,
    symbol: &Symbol,
    market_type: MarketType,
    timeframe: Timeframe,
    limit: usize,
) -> Result<Signal, ScanError> {
    let candles = match ctx.cache.get(symbol, timeframe, limit) {
        Some(c) => c,
        None => {
            let adapter = ctx.adapter.clone();
            let symbol_owned = symbol.clone();
            let fetched = ctx
                .gate
                .run(|| {
                    let adapter = adapter.clone();
                    let symbol_owned = symbol_owned.clone();
                    async move { adapter.fetch_ohlcv(&symbol_owned, timeframe, limit).await }
                })
                .await?;
            ctx.cache.put(symbol, timeframe, limit, fetched.clone());
            fetched
        }
    };

    let series = CandleSeries::from_raw(symbol.clone(), timeframe, candles);
    let features = indicators::compute_features(&series)?;
    Ok(scoring::score(symbol, market_type, timeframe, features))
}

#[instrument(skip(ctx, symbols), fields(exchange = ctx.adapter.id(), symbol_count = symbols.len()))]
pub async fn single_exchange_scan(ctx: &ExchangeContext, symbols: &[Symbol], req: &ScanRequest) -> SingleScanOutcome {
    let init_start = Instant::now();
    let total_scanned = symbols.len();
    let initialization = init_start.elapsed();

    let exec_start = Instant::now();
    let mut tasks = FuturesUnordered::new();
    for symbol in symbols {
        let symbol = symbol.clone();
        tasks.push(async move {
            (symbol.clone(), analyze_symbol(ctx, &symbol, req.market_type, req.timeframe, req.candle_limit).await)
        });
    }

    let mut rows = Vec::new();
    while let Some((symbol, result)) = tasks.next().await {
        match result {
            Ok(signal) => rows.push(signal),
            Err(err) => warn!(symbol = %symbol.pair, error = %err, "symbol dropped from scan"),
        }
    }
    let scan_execution = exec_start.elapsed();

    let filter_start = Instant::now();
    rows.retain(|s| req.signal_filter.matches(s.signal_label.wire_direction()) && s.signal_strength >= req.min_strength);
    rows.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap());
    rows.truncate(req.top_n);
    let filtering = filter_start.elapsed();

    let total = init_start.elapsed();
    let exchange_leaked: &'static str = Box::leak(ctx.adapter.id().to_string().into_boxed_str());
    histogram!("scan_duration_seconds", total.as_secs_f64(), "exchange" => exchange_leaked);

    SingleScanOutcome {
        signals: rows,
        total_scanned,
        timing: ScanTiming { initialization, scan_execution, filtering, total },
    }
}

pub struct ParallelScanOutcome {
    pub signals: HashMap<String, Vec<Signal>>,
    pub performance: ParallelPerformance,
}

/// Runs one independent scan per exchange concurrently and aggregates a
/// performance breakdown: sequential-estimated vs. observed parallel
/// duration.
pub async fn multi_exchange_scan(
    contexts: &HashMap<String, (Arc<ExchangeContext>, Vec<Symbol>)>,
    failed: &[(String, String)],
    req: &ScanRequest,
) -> ParallelScanOutcome {
    let wall_start = Instant::now();

    let mut tasks = FuturesUnordered::new();
    for (exchange_id, (ctx, symbols)) in contexts {
        let exchange_id = exchange_id.clone();
        let ctx = ctx.clone();
        let symbols = symbols.clone();
        let req = req.clone();
        tasks.push(async move {
            let start = Instant::now();
            let outcome = single_exchange_scan(&ctx, &symbols, &req).await;
            (exchange_id, outcome, start.elapsed())
        });
    }

    let mut signals = HashMap::new();
    let mut per_exchange = Vec::new();
    let mut sequential_estimated = std::time::Duration::ZERO;

    while let Some((exchange_id, outcome, duration)) = tasks.next().await {
        sequential_estimated += duration;
        per_exchange.push(PerExchangeOutcome {
            exchange: exchange_id.clone(),
            success: true,
            duration,
            signal_count: outcome.signals.len(),
            error: None,
        });
        signals.insert(exchange_id, outcome.signals);
    }

    for (exchange_id, error) in failed {
        per_exchange.push(PerExchangeOutcome {
            exchange: exchange_id.clone(),
            success: false,
            duration: Duration::ZERO,
            signal_count: 0,
            error: Some(error.clone()),
        });
    }

    let parallel_duration = wall_start.elapsed();
    let speedup = if parallel_duration.as_secs_f64() > 0.0 {
        sequential_estimated.as_secs_f64() / parallel_duration.as_secs_f64()
    } else {
        1.0
    };
    let time_saved = sequential_estimated.saturating_sub(parallel_duration);

    ParallelScanOutcome {
        signals,
        performance: ParallelPerformance {
            parallel_duration,
            sequential_estimated,
            speedup,
            time_saved,
            per_exchange,
        },
    }
}
