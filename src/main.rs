// SenseHub - Firmware Entry Point
//
// Boot sequence:
//   1. Bring up the I2C bus and arm the bus arbiter.
//   2. Configure the accelerometer and the OLED (splash screen).
//   3. Spawn the accelerometer and temperature/humidity tasks.
//   4. Start Wi-Fi; association and reconnects run in the background.
//   5. Start the HTTP server.
//
// A failed bus bring-up is logged and boot continues; both sampler tasks
// then refuse to run while the network side stays up. Network failures are
// logged and never stop the samplers.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("sensehub firmware only runs on an ESP-IDF target; use `cargo test` for the host build");
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use sensehub::config::*;
    use sensehub::drivers::bus::ACCELEROMETER;
    use sensehub::drivers::display::OledDisplay;
    use sensehub::drivers::esp_i2c::EspI2cBus;
    use sensehub::drivers::lis3dh::Lis3dh;
    use sensehub::net::client::HttpUploader;
    use sensehub::net::{server, wifi};
    use sensehub::state::AppContext;
    use sensehub::tasks;

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("SenseHub firmware starting…");

        // ---- Peripherals ------------------------------------------------------
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        // Shared state; the bus arbiter is armed below once the driver exists.
        let ctx: Arc<AppContext<EspI2cBus>> = Arc::new(AppContext::new());

        // ---- I2C bus (shared between sensors and OLED) -------------------------
        let i2c_config = I2cConfig::new().baudrate(I2C_FREQUENCY_HZ.Hz().into());
        match I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio21, // SDA
            peripherals.pins.gpio22, // SCL
            &i2c_config,
        ) {
            Ok(driver) => {
                if ctx.bus.init(EspI2cBus::new(driver)).is_err() {
                    log::warn!("I2C bus already initialised");
                }
                log::info!("I2C bus ready (SDA GPIO{}, SCL GPIO{})", PIN_I2C_SDA, PIN_I2C_SCL);
            }
            Err(e) => log::error!("Failed to create I2C bus: {}", e),
        }

        // ---- Devices ----------------------------------------------------------
        if let Err(e) = ctx
            .bus
            .transaction(|bus| Lis3dh::new(ACCELEROMETER).init(bus))
        {
            log::error!("Accelerometer init failed: {}", e);
        }

        let mut display = OledDisplay::new(Arc::clone(&ctx.bus));
        if let Err(e) = display.init() {
            log::error!("Display init failed: {}", e);
        }

        // ---- Spawn sampler tasks (FreeRTOS tasks via std::thread) -------------
        // Started before the network so a missing access point never stops sampling.
        let accel_ctx = Arc::clone(&ctx);
        thread::Builder::new()
            .name("accelerometer".into())
            .stack_size(STACK_ACCELEROMETER)
            .spawn(move || {
                tasks::accelerometer::accelerometer_task(accel_ctx);
            })?;

        let th_ctx = Arc::clone(&ctx);
        let uploader = HttpUploader::new(post_url());
        thread::Builder::new()
            .name("th_sensor".into())
            .stack_size(STACK_TH_SENSOR)
            .spawn(move || {
                tasks::th_sensor::th_sensor_task(th_ctx, display, uploader);
            })?;

        // ---- Network ----------------------------------------------------------
        match wifi::start(peripherals.modem, sysloop, nvs) {
            Ok(wifi) => {
                let spawned = thread::Builder::new()
                    .name("wifi".into())
                    .stack_size(STACK_WIFI)
                    .spawn(move || wifi::supervise(wifi));
                if let Err(e) = spawned {
                    log::error!("Failed to start Wi-Fi supervisor: {}", e);
                }
            }
            Err(e) => log::error!("Wi-Fi setup failed: {}", e),
        }

        log::info!("Starting HTTP server...");
        let _server = match server::start(Arc::clone(&ctx)) {
            Ok(server) => Some(server),
            Err(e) => {
                log::error!("HTTP server failed to start: {}", e);
                None
            }
        };

        // Main thread only keeps the server handle alive.
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }
}
