// src/scan/timing.rs
//
// Mandatory timing instrumentation for scan responses.

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScanTiming {
    pub initialization: Duration,
    pub scan_execution: Duration,
    pub filtering: Duration,
    pub total: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerExchangeOutcome {
    pub exchange: String,
    pub success: bool,
    pub duration: Duration,
    pub signal_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParallelPerformance {
    pub parallel_duration: Duration,
    pub sequential_estimated: Duration,
    pub speedup: f64,
    pub time_saved: Duration,
    pub per_exchange: Vec<PerExchangeOutcome>,
}
