// SenseHub - Shared I2C Bus
//
// One physical bus, three devices. Every transaction sequence runs while the
// caller holds the arbiter, so transactions from different tasks are totally
// ordered and never interleave at the byte level.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use crate::config::*;
use crate::error::{BusError, SensorError};

/// Point-to-point transfers addressed to a 7-bit device address.
///
/// Each call is one blocking transaction bounded by `timeout`. Implementations
/// report failures and never retry on their own.
pub trait BusTransport {
    fn write(&mut self, address: u8, bytes: &[u8], timeout: Duration) -> Result<(), BusError>;

    /// Write `bytes`, then read `buffer.len()` bytes after a repeated start.
    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
        timeout: Duration,
    ) -> Result<(), BusError>;

    fn read(&mut self, address: u8, buffer: &mut [u8], timeout: Duration) -> Result<(), BusError>;
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    fn write(&mut self, address: u8, bytes: &[u8], timeout: Duration) -> Result<(), BusError> {
        (**self).write(address, bytes, timeout)
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
        timeout: Duration,
    ) -> Result<(), BusError> {
        (**self).write_read(address, bytes, buffer, timeout)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], timeout: Duration) -> Result<(), BusError> {
        (**self).read(address, buffer, timeout)
    }
}

// ---------------------------------------------------------------------------
// Device descriptors
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: &'static str,
    pub address: u8,
}

pub const ACCELEROMETER: DeviceDescriptor = DeviceDescriptor {
    name: "accelerometer",
    address: I2C_ADDR_ACCELEROMETER,
};

pub const TH_SENSOR: DeviceDescriptor = DeviceDescriptor {
    name: "th_sensor",
    address: I2C_ADDR_TH_SENSOR,
};

pub const DISPLAY: DeviceDescriptor = DeviceDescriptor {
    name: "display",
    address: I2C_ADDR_DISPLAY,
};

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// Exclusive access to the bus while held; dropping it releases the bus.
pub type BusGuard<'a, T> = MutexGuard<'a, T>;

/// Mutual-exclusion gate in front of the bus transport.
///
/// Starts empty and is armed exactly once by [`BusArbiter::init`] when the bus
/// comes up. Acquiring an unarmed arbiter fails instead of handing out an
/// unsynchronised bus.
pub struct BusArbiter<T> {
    bus: OnceLock<Mutex<T>>,
}

impl<T> Default for BusArbiter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BusArbiter<T> {
    pub const fn new() -> Self {
        Self {
            bus: OnceLock::new(),
        }
    }

    pub fn with_transport(transport: T) -> Self {
        Self {
            bus: OnceLock::from(Mutex::new(transport)),
        }
    }

    /// Install the transport. Hands it back if the bus was already initialised.
    pub fn init(&self, transport: T) -> Result<(), T> {
        self.bus
            .set(Mutex::new(transport))
            .map_err(|mutex| mutex.into_inner().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn is_initialized(&self) -> bool {
        self.bus.get().is_some()
    }

    /// Block until the bus is held exclusively.
    pub fn acquire(&self) -> Result<BusGuard<'_, T>, SensorError> {
        let bus = self.bus.get().ok_or(SensorError::MutexUninitialized)?;
        // A panic in another holder leaves no half-written bus state behind,
        // the next transaction starts from a fresh START condition.
        Ok(bus.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Run `f` with the bus held; the bus is released when `f` returns.
    pub fn transaction<R, F>(&self, f: F) -> Result<R, SensorError>
    where
        F: FnOnce(&mut T) -> Result<R, SensorError>,
    {
        let mut bus = self.acquire()?;
        f(&mut bus)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::mock::MockBus;
    use super::*;

    #[test]
    fn uninitialized_arbiter_refuses_access() {
        let arbiter: BusArbiter<MockBus> = BusArbiter::new();
        assert!(!arbiter.is_initialized());
        assert_eq!(arbiter.acquire().err(), Some(SensorError::MutexUninitialized));
    }

    #[test]
    fn init_happens_once() {
        let arbiter = BusArbiter::new();
        assert!(arbiter.init(MockBus::new()).is_ok());
        assert!(arbiter.init(MockBus::new()).is_err());
        assert!(arbiter.is_initialized());
    }

    #[test]
    fn arbiter_built_with_transport_is_armed() {
        let arbiter = BusArbiter::with_transport(MockBus::new());
        assert!(arbiter.is_initialized());
        assert!(arbiter.init(MockBus::new()).is_err());
        assert!(arbiter.acquire().unwrap().log.is_empty());
    }

    #[test]
    fn transaction_releases_bus_on_error() {
        let arbiter = BusArbiter::with_transport(MockBus::new());
        let result: Result<(), _> = arbiter.transaction(|_| Err(SensorError::MutexUninitialized));
        assert!(result.is_err());
        // Would deadlock if the failed transaction kept the bus.
        assert!(arbiter.acquire().is_ok());
    }

    #[test]
    fn concurrent_holders_never_overlap() {
        let arbiter = Arc::new(BusArbiter::with_transport(MockBus::new()));
        let inside = Arc::new(AtomicBool::new(false));
        let entries = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..2)
            .map(|_| {
                let arbiter = Arc::clone(&arbiter);
                let inside = Arc::clone(&inside);
                let entries = Arc::clone(&entries);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let mut bus = arbiter.acquire().unwrap();
                        assert!(!inside.swap(true, Ordering::SeqCst), "two holders at once");
                        thread::yield_now();
                        bus.write(0x19, &[0x20, 0x57], Duration::ZERO).unwrap();
                        thread::yield_now();
                        inside.store(false, Ordering::SeqCst);
                        entries.fetch_add(1, Ordering::SeqCst);
                        drop(bus);
                        thread::yield_now();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(entries.load(Ordering::SeqCst), 400);
        assert_eq!(arbiter.acquire().unwrap().log.len(), 400);
    }
}
