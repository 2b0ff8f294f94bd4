//! SenseHub firmware library.
//!
//! An accelerometer (LIS3DH), a temperature/humidity sensor (AHT20) and an
//! SSD1306 OLED share one I2C bus. Two periodic tasks sample the sensors
//! through a single bus arbiter, publish the readings into a shared
//! [`state::AppContext`], and hand them to the display and an HTTP uploader.
//!
//! Everything except the ESP-IDF bindings builds on the host, where the
//! drivers are tested against a scripted bus.

pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod net;
pub mod state;
pub mod tasks;
