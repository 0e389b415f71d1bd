// src/ringbuffer.rs
//
// Fixed-capacity, overwrite-oldest, thread-safe ring buffer. Backs the
// continuous pipeline's tick/candle/signal buffers (dashmap already
// guards the outer per-key map; this guards the per-key sequence).

use std::collections::VecDeque;
use std::sync::RwLock;

pub struct RingBuffer<T> {
    capacity: usize,
    inner: RwLock<VecDeque<T>>,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), inner: RwLock::new(VecDeque::with_capacity(capacity)) }
    }

    /// Appends one entry, evicting the oldest if the buffer is at capacity.
    pub fn push(&self, item: T) {
        let mut guard = self.inner.write().expect("ring buffer lock poisoned");
        if guard.len() >= self.capacity {
            guard.pop_front();
        }
        guard.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("ring buffer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot in insertion order, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.read().expect("ring buffer lock poisoned").iter().cloned().collect()
    }

    pub fn last(&self) -> Option<T> {
        self.inner.read().expect("ring buffer lock poisoned").back().cloned()
    }

    /// Last `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<T> {
        let guard = self.inner.read().expect("ring buffer lock poisoned");
        let len = guard.len();
        let skip = len.saturating_sub(n);
        guard.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_oldest_past_capacity() {
        let rb: RingBuffer<i32> = RingBuffer::new(3);
        for i in 0..5 {
            rb.push(i);
        }
        assert_eq!(rb.len(), 3);
        assert_eq!(rb.snapshot(), vec![2, 3, 4]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let rb: RingBuffer<i32> = RingBuffer::new(4);
        for i in 0..100 {
            rb.push(i);
            assert!(rb.len() <= 4);
        }
    }

    #[test]
    fn last_n_caps_at_available_length() {
        let rb: RingBuffer<i32> = RingBuffer::new(10);
        rb.push(1);
        rb.push(2);
        assert_eq!(rb.last_n(5), vec![1, 2]);
    }

    #[test]
    fn concurrent_push_never_exceeds_capacity() {
        use std::sync::Arc;
        use std::thread;

        let rb = Arc::new(RingBuffer::<i32>::new(50));
        let mut handles = Vec::new();
        for t in 0..8 {
            let rb = rb.clone();
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    rb.push(t * 1000 + i);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(rb.len(), 50);
    }
}
