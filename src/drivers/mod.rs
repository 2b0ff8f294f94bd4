pub mod aht20;
pub mod bus;
pub mod display;
pub mod lis3dh;

#[cfg(target_os = "espidf")]
pub mod esp_i2c;
