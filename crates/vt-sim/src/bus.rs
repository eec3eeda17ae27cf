//! Simulated shared bus.
//!
//! A [`SimBus`] sits behind a `BusLock` like a real bus handle. It can report
//! each transaction to a [`BusRecorder`]. The recorder has its own lock,
//! independent of the bus lock, so several buses may report to one recorder
//! and any overlap between their transactions shows up in the record.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// One completed bus transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusTransaction {
    pub device: String,
    pub enter: Instant,
    pub exit: Instant,
}

/// Shared record of the most recent transactions, oldest dropped first.
#[derive(Debug, Clone)]
pub struct BusRecorder {
    window: Arc<Mutex<VecDeque<BusTransaction>>>,
    capacity: usize,
}

impl BusRecorder {
    /// Recorder keeping at most `capacity` transactions.
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, transaction: BusTransaction) {
        if self.capacity == 0 {
            return;
        }
        let mut window = self.window();
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(transaction);
    }

    pub fn transactions(&self) -> Vec<BusTransaction> {
        self.window().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.window().len()
    }

    pub fn is_empty(&self) -> bool {
        self.window().is_empty()
    }

    /// Number of recorded transaction pairs whose intervals intersect.
    pub fn overlapping_pairs(&self) -> usize {
        let mut sorted = self.transactions();
        sorted.sort_by_key(|t| t.enter);
        let mut count = 0;
        for (i, a) in sorted.iter().enumerate() {
            count += sorted[i + 1..]
                .iter()
                .take_while(|b| b.enter < a.exit)
                .count();
        }
        count
    }

    fn window(&self) -> MutexGuard<'_, VecDeque<BusTransaction>> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimBus {
    latency: Duration,
    recorder: Option<BusRecorder>,
}

impl SimBus {
    /// Bus where every transaction takes at least `latency`. Nothing is
    /// recorded.
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            recorder: None,
        }
    }

    /// Bus reporting every transaction to `recorder`.
    pub fn recorded(latency: Duration, recorder: &BusRecorder) -> Self {
        Self {
            latency,
            recorder: Some(recorder.clone()),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Run `f` as one transaction on behalf of `device`.
    pub fn transact<R>(&mut self, device: &str, f: impl FnOnce() -> R) -> R {
        let enter = Instant::now();
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let out = f();
        if let Some(recorder) = &self.recorder {
            recorder.record(BusTransaction {
                device: device.to_string(),
                enter,
                exit: Instant::now(),
            });
        }
        out
    }
}
