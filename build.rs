// SenseHub build script
//
// Emits the ESP-IDF link arguments when building for the device and forwards
// deployment settings (Wi-Fi credentials, upload server) from the environment
// or a local `.env` file into the crate as `option_env!` values.

const FORWARDED_KEYS: [&str; 4] = ["WIFI_SSID", "WIFI_PASSWORD", "SERVER_IP", "SERVER_PORT"];

fn main() {
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    println!("cargo:rerun-if-changed=build.rs");
    // A missing .env is fine: values may come from the real environment.
    if let Ok(path) = dotenvy::dotenv() {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    for key in FORWARDED_KEYS {
        println!("cargo:rerun-if-env-changed={key}");
        if let Ok(value) = std::env::var(key) {
            println!("cargo:rustc-env={key}={value}");
        }
    }
}
