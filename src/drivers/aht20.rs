// SenseHub - AHT20 Temperature/Humidity Sensor Driver
//
// The sensor has no register map: a measurement is a trigger command, a fixed
// settle time, then a 6-byte fetch. `measure()` runs all three as one call.

use std::thread;
use std::time::Duration;

use bitflags::bitflags;

use crate::config::*;
use crate::drivers::bus::{BusTransport, DeviceDescriptor};
use crate::error::SensorError;
use crate::events::ThReading;

/// Trigger measurement (0xAC) with its two fixed parameter bytes.
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];
const RESULT_LEN: usize = 6;
/// 2^20, full scale of both 20-bit fields.
const FULL_SCALE: f32 = 1_048_576.0;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const BUSY = 1 << 7;
    }
}

/// Decode the packed result frame.
///
/// Byte 0 is status. Humidity is the top 20 bits of bytes 1..=3, temperature
/// the low nibble of byte 3 followed by bytes 4..=5.
pub fn decode(frame: &[u8; RESULT_LEN]) -> ThReading {
    let humidity_raw =
        ((frame[1] as u32) << 16 | (frame[2] as u32) << 8 | frame[3] as u32) >> 4;
    let temperature_raw =
        ((frame[3] as u32) << 16 | (frame[4] as u32) << 8 | frame[5] as u32) & 0xF_FFFF;

    ThReading {
        temperature_c: temperature_raw as f32 * 200.0 / FULL_SCALE - 50.0,
        humidity_pct: humidity_raw as f32 * 100.0 / FULL_SCALE,
    }
}

/// Progress of one measurement. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Triggered,
    Reading,
    Done,
    Failed(SensorError),
}

pub struct Aht20 {
    device: DeviceDescriptor,
    timeout: Duration,
    settle: Duration,
}

impl Aht20 {
    pub fn new(device: DeviceDescriptor) -> Self {
        Self {
            device,
            timeout: I2C_TRANSACTION_TIMEOUT,
            settle: TH_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Trigger, wait, fetch and decode. The caller must hold the bus for the
    /// whole call; a failed trigger never reaches the fetch.
    pub fn measure<T: BusTransport>(&self, bus: &mut T) -> Result<ThReading, SensorError> {
        let mut frame = [0u8; RESULT_LEN];
        let mut phase = Phase::Idle;

        loop {
            phase = match phase {
                Phase::Done => break,
                Phase::Failed(e) => {
                    log::trace!("{}: measurement failed: {}", self.device.name, e);
                    return Err(e);
                }
                current => self.advance(bus, current, &mut frame),
            };
        }

        if Status::from_bits_truncate(frame[0]).contains(Status::BUSY) {
            log::debug!("{}: busy flag still set after settle delay", self.device.name);
        }
        Ok(decode(&frame))
    }

    fn advance<T: BusTransport>(
        &self,
        bus: &mut T,
        phase: Phase,
        frame: &mut [u8; RESULT_LEN],
    ) -> Phase {
        let address = self.device.address;
        match phase {
            Phase::Idle => match bus.write(address, &CMD_TRIGGER, self.timeout) {
                Ok(()) => Phase::Triggered,
                Err(e) => Phase::Failed(SensorError::transport(self.device.name, "trigger", e)),
            },
            Phase::Triggered => {
                thread::sleep(self.settle);
                Phase::Reading
            }
            Phase::Reading => match bus.read(address, frame, self.timeout) {
                Ok(()) => Phase::Done,
                Err(e) => Phase::Failed(SensorError::transport(self.device.name, "fetch", e)),
            },
            terminal => terminal,
        }
    }
}
