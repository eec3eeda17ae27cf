//! Time sources for the control loop.
//!
//! Controllers never call `Instant::now()` directly; they ask a [`Clock`]
//! for monotonic seconds. Production uses [`MonotonicClock`]; tests and the
//! accelerated simulation drive a [`ManualClock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time source in seconds.
pub trait Clock {
    fn now_s(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_s(&self) -> f64 {
        (**self).now_s()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_s(&self) -> f64 {
        (**self).now_s()
    }
}

/// Wall-clock backed monotonic time, anchored at construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_s(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_s: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_s.to_bits())),
        }
    }

    pub fn set(&self, t_s: f64) {
        self.bits.store(t_s.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, dt_s: f64) {
        // Single writer in practice; the CAS loop keeps concurrent advances exact.
        let mut current = self.bits.load(Ordering::SeqCst);
        loop {
            let next = (f64::from_bits(current) + dt_s).to_bits();
            match self
                .bits
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
