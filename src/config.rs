// SenseHub - Hardware & System Configuration
// Target: ESP32 DevKit (Xtensa), sensors and OLED on one I2C bus

use std::time::Duration;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_I2C_SDA: i32 = 21;
pub const PIN_I2C_SCL: i32 = 22;

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_FREQUENCY_HZ: u32 = 400_000;
pub const I2C_ADDR_TH_SENSOR: u8 = 0x38;
pub const I2C_ADDR_DISPLAY: u8 = 0x3C;
pub const I2C_ADDR_ACCELEROMETER: u8 = 0x19;

/// Upper bound for a single sensor transaction before it is reported as a timeout.
pub const I2C_TRANSACTION_TIMEOUT: Duration = Duration::from_millis(50);
/// Display frames are larger than sensor reads, so they get more headroom.
pub const I2C_DISPLAY_TIMEOUT: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED, 128x32)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 32;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 512
pub const DISPLAY_POWER_UP_DELAY: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_ACCELEROMETER: usize = 8192;
pub const STACK_TH_SENSOR: usize = 8192;
pub const STACK_WIFI: usize = 4096;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
pub const ACCELEROMETER_PERIOD: Duration = Duration::from_millis(1000);
pub const TH_SENSOR_PERIOD: Duration = Duration::from_millis(2000);
/// Time the TH sensor needs between the trigger command and a valid result.
pub const TH_SETTLE_DELAY: Duration = Duration::from_millis(10);
pub const WIFI_CHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Accelerometer click detection (LIS3DH CLICK_THS / TIME_* registers)
// ---------------------------------------------------------------------------
pub const CLICK_THRESHOLD: u8 = 20;
pub const CLICK_TIME_LIMIT: u8 = 10;
pub const CLICK_TIME_LATENCY: u8 = 20;
pub const CLICK_TIME_WINDOW: u8 = 40;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------
pub const HTTP_SERVER_PORT: u16 = 8000;
pub const HTTP_POST_BUFFER_SIZE: usize = 256;

pub const WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};
pub const WIFI_PASSWORD: &str = match option_env!("WIFI_PASSWORD") {
    Some(password) => password,
    None => "",
};
pub const SERVER_IP: &str = match option_env!("SERVER_IP") {
    Some(ip) => ip,
    None => "192.168.1.100",
};
pub const SERVER_PORT: &str = match option_env!("SERVER_PORT") {
    Some(port) => port,
    None => "8000",
};

/// Upload endpoint for temperature/humidity samples.
pub fn post_url() -> String {
    format!("http://{}:{}/th_sensor", SERVER_IP, SERVER_PORT)
}
