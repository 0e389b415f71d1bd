// src/ratelimit/mod.rs
//
// Per-adapter concurrency gate + circuit breaker. Follows the same
// guardian pattern as the risk-limits module this was adapted from:
// atomic counters, a background-observable "tripped" state, `tracing`
// on state transitions, rather than a single giant mutex.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use metrics::increment_counter;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::sleep;

use crate::utils::errors::ScanError;

pub struct RateGate {
    semaphore: Semaphore,
    delay_between_fetches: Duration,
    last_fetch: Mutex<Option<Instant>>,
    retry_attempts: u32,
    retry_delay: Duration,
    breaker: CircuitBreaker,
}

impl RateGate {
    pub fn new(
        max_concurrent_requests: usize,
        rate_limit_delay_ms: u64,
        retry_attempts: u32,
        retry_delay_ms: u64,
        circuit_breaker_threshold: u32,
        circuit_breaker_pause_secs: u64,
    ) -> Self {
        Self {
            semaphore: Semaphore::new(max_concurrent_requests.max(1)),
            delay_between_fetches: Duration::from_millis(rate_limit_delay_ms),
            last_fetch: Mutex::new(None),
            retry_attempts,
            retry_delay: Duration::from_millis(retry_delay_ms),
            breaker: CircuitBreaker::new(circuit_breaker_threshold, circuit_breaker_pause_secs),
        }
    }

    /// Runs `op` under the concurrency gate, retrying per policy on
    /// retryable errors and observing the circuit breaker before and
    /// after each attempt.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, ScanError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ScanError>>,
    {
        self.breaker.wait_if_tripped().await;

        let _permit = self.semaphore.acquire().await.expect("semaphore closed");
        self.pace().await;

        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(err) => {
                    if err.is_rate_limited() {
                        self.breaker.record_rate_limited();
                    } else {
                        self.breaker.record_success();
                    }

                    if attempt >= self.retry_attempts || !err.is_retryable() {
                        return Err(err);
                    }
                    attempt += 1;
                    sleep(self.retry_delay * (attempt + 1)).await;
                }
            }
        }
    }

    async fn pace(&self) {
        let mut last = self.last_fetch.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay_between_fetches {
                sleep(self.delay_between_fetches - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

pub struct CircuitBreaker {
    threshold: u32,
    pause: Duration,
    consecutive_rate_limits: AtomicU32,
    tripped: AtomicBool,
    trip_expires_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, pause_secs: u64) -> Self {
        Self {
            threshold,
            pause: Duration::from_secs(pause_secs),
            consecutive_rate_limits: AtomicU32::new(0),
            tripped: AtomicBool::new(false),
            trip_expires_at: Mutex::new(None),
        }
    }

    pub fn record_success(&self) {
        self.consecutive_rate_limits.store(0, Ordering::SeqCst);
    }

    pub fn record_rate_limited(&self) {
        let count = self.consecutive_rate_limits.fetch_add(1, Ordering::SeqCst) + 1;
        if count >= self.threshold {
            self.trip();
        }
    }

    fn trip(&self) {
        self.tripped.store(true, Ordering::SeqCst);
        self.consecutive_rate_limits.store(0, Ordering::SeqCst);
        tracing::warn!(pause_secs = self.pause.as_secs(), "circuit breaker tripped");
        increment_counter!("circuit_breaker_trips_total");
        let expires = Instant::now() + self.pause;
        if let Ok(mut guard) = self.trip_expires_at.try_lock() {
            *guard = Some(expires);
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    async fn wait_if_tripped(&self) {
        if !self.is_tripped() {
            return;
        }
        let expires_at = *self.trip_expires_at.lock().await;
        if let Some(expires_at) = expires_at {
            let remaining = expires_at.saturating_duration_since(Instant::now());
            if !remaining.is_zero() {
                sleep(remaining).await;
            }
        }
        self.tripped.store(false, Ordering::SeqCst);
        *self.trip_expires_at.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32 as Counter;

    #[tokio::test]
    async fn breaker_trips_after_threshold_and_pauses() {
        let gate = Arc::new(RateGate::new(10, 0, 0, 1, 3, 1));
        let calls = Arc::new(Counter::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let _ = gate
                .run(|| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(ScanError::RateLimited)
                    }
                })
                .await;
        }
        assert!(gate.breaker().is_tripped());

        let started = Instant::now();
        let _ = gate
            .run(|| async { Ok::<_, ScanError>(()) })
            .await;
        assert!(started.elapsed() >= Duration::from_millis(900));
        assert!(!gate.breaker().is_tripped());
    }

    #[tokio::test]
    async fn non_rate_limit_errors_reset_counter() {
        let breaker = CircuitBreaker::new(3, 60);
        breaker.record_rate_limited();
        breaker.record_rate_limited();
        breaker.record_success();
        breaker.record_rate_limited();
        assert!(!breaker.is_tripped());
    }

    #[tokio::test]
    async fn retries_transient_errors_up_to_policy() {
        let gate = RateGate::new(5, 0, 2, 1, 10, 60);
        let attempts = Arc::new(Counter::new(0));
        let attempts2 = attempts.clone();
        let result = gate
            .run(move || {
                let attempts = attempts2.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(ScanError::Transient("boom".into()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
