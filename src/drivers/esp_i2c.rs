// SenseHub - ESP-IDF I2C Transport
//
// Wraps the esp-idf-hal master driver behind `BusTransport`, converting the
// per-transaction timeout into FreeRTOS ticks.

use std::time::Duration;

use esp_idf_hal::delay::TickType;
use esp_idf_hal::i2c::I2cDriver;
use esp_idf_sys::{esp_err_t, EspError, ESP_ERR_TIMEOUT};

use crate::drivers::bus::BusTransport;
use crate::error::BusError;

pub struct EspI2cBus {
    driver: I2cDriver<'static>,
}

impl EspI2cBus {
    pub fn new(driver: I2cDriver<'static>) -> Self {
        Self { driver }
    }
}

fn ticks(timeout: Duration) -> u32 {
    TickType::from(timeout).ticks()
}

/// The master driver reports a missing ACK as a generic failure, so anything
/// that is not a timeout counts as NACK.
fn classify(error: EspError) -> BusError {
    if error.code() == ESP_ERR_TIMEOUT as esp_err_t {
        BusError::Timeout
    } else {
        BusError::Nack
    }
}

impl BusTransport for EspI2cBus {
    fn write(&mut self, address: u8, bytes: &[u8], timeout: Duration) -> Result<(), BusError> {
        self.driver
            .write(address, bytes, ticks(timeout))
            .map_err(classify)
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
        timeout: Duration,
    ) -> Result<(), BusError> {
        self.driver
            .write_read(address, bytes, buffer, ticks(timeout))
            .map_err(classify)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], timeout: Duration) -> Result<(), BusError> {
        self.driver
            .read(address, buffer, ticks(timeout))
            .map_err(classify)
    }
}
