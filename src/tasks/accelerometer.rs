// SenseHub - Accelerometer Task
//
// Samples the LIS3DH once per second: calibration, axes and click status in
// one bus section, logging outside it.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::*;
use crate::drivers::bus::{BusTransport, ACCELEROMETER};
use crate::drivers::lis3dh::Lis3dh;
use crate::error::SensorError;
use crate::events::AccelSample;
use crate::state::AppContext;

/// Run one locked read-and-decode section and publish the result.
pub fn accelerometer_cycle<T: BusTransport>(
    ctx: &AppContext<T>,
    imu: &Lis3dh,
) -> Result<AccelSample, SensorError> {
    ctx.bus.transaction(|bus| {
        let sample = imu.sample(bus)?;
        ctx.accel.store(sample.reading);
        ctx.last_click.store(sample.click);
        Ok(sample)
    })
}

pub fn accelerometer_task<T: BusTransport>(ctx: Arc<AppContext<T>>) {
    run(&ctx, &Lis3dh::new(ACCELEROMETER), ACCELEROMETER_PERIOD, None);
}

/// Sampling loop. `cycles` bounds the number of iterations for tests; the
/// firmware runs forever.
pub(crate) fn run<T: BusTransport>(
    ctx: &AppContext<T>,
    imu: &Lis3dh,
    interval: Duration,
    cycles: Option<usize>,
) {
    if !ctx.bus.is_initialized() {
        log::error!("i2c bus arbiter not initialized - accelerometer task exiting");
        return;
    }
    log::info!("Accelerometer task started");

    let mut remaining = cycles;
    while remaining != Some(0) {
        let tick_start = Instant::now();

        match accelerometer_cycle(ctx, imu) {
            Ok(sample) => {
                let r = sample.reading;
                log::info!("X: {:.2} g, Y: {:.2} g, Z: {:.2} g", r.x_g, r.y_g, r.z_g);
                if sample.click.is_click() {
                    log::info!("{}", sample.click.display_name());
                }
            }
            Err(e) if !e.is_transient() => {
                log::error!("{} - accelerometer task exiting", e);
                return;
            }
            Err(e) => log::error!("Skipping cycle: {}", e),
        }

        remaining = remaining.map(|n| n - 1);

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
