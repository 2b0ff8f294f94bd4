// SenseHub - Shared Application State
//
// Created once at start-up and handed to every task by `Arc`. Samplers write,
// the display, uploader and HTTP handlers read.

use std::sync::{Arc, PoisonError, RwLock};

use crate::drivers::bus::BusArbiter;
use crate::events::{AccelReading, ClickEvent, ThReading};

/// Last-value cell. A reader sees either the previous or the new value, never a
/// mix of the two.
#[derive(Debug, Default)]
pub struct SharedReading<T> {
    value: RwLock<T>,
}

impl<T: Copy> SharedReading<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    pub fn store(&self, value: T) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn load(&self) -> T {
        *self.value.read().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct AppContext<T> {
    pub bus: Arc<BusArbiter<T>>,
    pub accel: SharedReading<AccelReading>,
    pub th: SharedReading<ThReading>,
    pub last_click: SharedReading<ClickEvent>,
}

impl<T> AppContext<T> {
    /// Context with an unarmed bus; samplers refuse to run until it is initialised.
    pub fn new() -> Self {
        Self::with_bus(Arc::new(BusArbiter::new()))
    }

    pub fn with_bus(bus: Arc<BusArbiter<T>>) -> Self {
        Self {
            bus,
            accel: SharedReading::default(),
            th: SharedReading::default(),
            last_click: SharedReading::default(),
        }
    }
}

impl<T> Default for AppContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn readers_never_see_a_torn_triple() {
        let cell = Arc::new(SharedReading::new(AccelReading::default()));
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let cell = Arc::clone(&cell);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for i in 0..2000 {
                    let v = i as f32;
                    cell.store(AccelReading { x_g: v, y_g: v, z_g: v });
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        while !done.load(Ordering::SeqCst) {
            let r = cell.load();
            assert!(r.x_g == r.y_g && r.y_g == r.z_g, "torn read: {:?}", r);
        }
        writer.join().unwrap();
        assert_eq!(cell.load().z_g, 1999.0);
    }

    #[test]
    fn new_context_starts_unarmed_with_zeroed_readings() {
        let ctx: AppContext<()> = AppContext::new();
        assert!(!ctx.bus.is_initialized());
        assert_eq!(ctx.th.load(), ThReading::default());
        assert_eq!(ctx.last_click.load(), ClickEvent::None);
    }
}
