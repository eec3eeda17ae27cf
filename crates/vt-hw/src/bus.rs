//! Shared-bus arbitration.
//!
//! One [`BusLock`] exists per physical bus and owns that bus's handle. Every
//! driver addressing the bus receives a clone of the same lock and wraps it in
//! a [`BusArbiter`]; all transactions then run one at a time.
//!
//! Handing two different locks to drivers on the same physical bus is a
//! caller error that cannot be detected here.
//!
//! A driver built without a lock runs in single-owner mode: the arbiter gets
//! a private bus handle, and a warning is logged once at construction. Two
//! single-owner drivers on the same physical bus can interleave.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

/// Handle to one physical bus. Clones refer to the same bus.
pub struct BusLock<T> {
    name: Arc<str>,
    bus: Arc<Mutex<T>>,
}

impl<T> BusLock<T> {
    pub fn new(name: impl Into<String>, bus: T) -> Self {
        Self {
            name: Arc::from(name.into()),
            bus: Arc::new(Mutex::new(bus)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if both handles guard the same physical bus.
    pub fn same_bus(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.bus, &b.bus)
    }
}

impl<T> Clone for BusLock<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            bus: Arc::clone(&self.bus),
        }
    }
}

impl<T> fmt::Debug for BusLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusLock").field("name", &self.name).finish()
    }
}

/// Per-driver access point to a bus.
pub struct BusArbiter<T> {
    device: String,
    bus: Arc<Mutex<T>>,
    shared: bool,
}

impl<T> BusArbiter<T> {
    /// Arbiter sharing `lock` with every other driver on the same bus.
    pub fn shared(device: impl Into<String>, lock: &BusLock<T>) -> Self {
        Self {
            device: device.into(),
            bus: Arc::clone(&lock.bus),
            shared: true,
        }
    }

    /// Arbiter owning a private bus handle.
    pub fn exclusive(device: impl Into<String>, bus: T) -> Self {
        let device = device.into();
        warn!(
            device = %device,
            "no bus lock supplied; access is not thread-safe and concurrent use of this bus is undefined"
        );
        Self {
            device,
            bus: Arc::new(Mutex::new(bus)),
            shared: false,
        }
    }

    /// Shared if `lock` is given, otherwise single-owner over `fallback()`.
    pub fn new(
        device: impl Into<String>,
        lock: Option<&BusLock<T>>,
        fallback: impl FnOnce() -> T,
    ) -> Self {
        match lock {
            Some(lock) => Self::shared(device, lock),
            None => Self::exclusive(device, fallback()),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// False in single-owner mode.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Run `f` with exclusive access to the bus.
    ///
    /// Blocks until every other transaction on the same lock has finished. A
    /// transaction that panicked does not wedge the bus for everyone else.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.bus.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<T> fmt::Debug for BusArbiter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusArbiter")
            .field("device", &self.device)
            .field("shared", &self.shared)
            .finish()
    }
}
