// src/cache/mod.rs
//
// Time-bounded OHLCV cache keyed by (symbol, timeframe, limit), built on
// `dashmap` the way `scheduler.rs` used `DashMap` for its task registry.
// Single-writer-per-key is enough (no miss coalescing): duplicated
// concurrent misses are bounded by the rate gate's concurrency cap.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::{Candle, Symbol, Timeframe};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    symbol: Symbol,
    timeframe: Timeframe,
    limit: usize,
}

struct Entry {
    candles: Vec<Candle>,
    inserted_at: Instant,
}

pub struct OhlcvCache {
    ttl: Duration,
    capacity: usize,
    entries: DashMap<CacheKey, Entry>,
    /// Insertion order for LRU eviction once `capacity` is exceeded.
    order: DashMap<CacheKey, Instant>,
}

impl OhlcvCache {
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: capacity.max(1),
            entries: DashMap::new(),
            order: DashMap::new(),
        }
    }

    pub fn get(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Option<Vec<Candle>> {
        let key = CacheKey { symbol: symbol.clone(), timeframe, limit };
        let entry = self.entries.get(&key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.candles.clone())
        } else {
            None
        }
    }

    pub fn put(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize, candles: Vec<Candle>) {
        let key = CacheKey { symbol: symbol.clone(), timeframe, limit };
        let now = Instant::now();
        self.entries.insert(key.clone(), Entry { candles, inserted_at: now });
        self.order.insert(key, now);
        self.evict_if_over_capacity();
    }

    fn evict_if_over_capacity(&self) {
        if self.entries.len() <= self.capacity {
            return;
        }
        // Evict the least-recently-inserted keys until back under capacity.
        let mut by_age: Vec<(CacheKey, Instant)> =
            self.order.iter().map(|kv| (kv.key().clone(), *kv.value())).collect();
        by_age.sort_by_key(|(_, t)| *t);
        let overflow = self.entries.len().saturating_sub(self.capacity);
        for (key, _) in by_age.into_iter().take(overflow) {
            self.entries.remove(&key);
            self.order.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(close: f64) -> Candle {
        Candle { ts: Utc::now(), open: close, high: close, low: close, close, volume: 1.0 }
    }

    #[test]
    fn hit_returns_identical_series_within_ttl() {
        let cache = OhlcvCache::new(300, 100);
        let sym = Symbol::new("ex", "BTC/USDT");
        let candles = vec![candle(1.0), candle(2.0)];
        cache.put(&sym, Timeframe::H1, 100, candles.clone());

        let hit = cache.get(&sym, Timeframe::H1, 100).expect("cache hit");
        assert_eq!(hit.len(), candles.len());
        for (a, b) in hit.iter().zip(candles.iter()) {
            assert_eq!(a.close, b.close);
        }
    }

    #[test]
    fn miss_on_expired_entry() {
        let cache = OhlcvCache::new(0, 100);
        let sym = Symbol::new("ex", "BTC/USDT");
        cache.put(&sym, Timeframe::H1, 100, vec![candle(1.0)]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&sym, Timeframe::H1, 100).is_none());
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let cache = OhlcvCache::new(300, 2);
        for i in 0..3 {
            let sym = Symbol::new("ex", format!("SYM{i}/USDT"));
            cache.put(&sym, Timeframe::H1, 100, vec![candle(1.0)]);
        }
        assert!(cache.len() <= 2);
    }
}
