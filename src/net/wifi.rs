// SenseHub - Wi-Fi Station (ESP-IDF)

use anyhow::anyhow;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::config::*;
use crate::error::NetError;
use crate::net::link::{self, Station};

pub type Wifi = BlockingWifi<EspWifi<'static>>;

impl Station for Wifi {
    fn is_connected(&mut self) -> bool {
        matches!(BlockingWifi::is_connected(self), Ok(true))
    }

    fn join(&mut self) -> Result<(), NetError> {
        let to_net = |e: esp_idf_svc::sys::EspError| NetError::Transport(e.to_string());

        self.connect().map_err(to_net)?;
        self.wait_netif_up().map_err(to_net)?;

        let ip = self.wifi().sta_netif().get_ip_info().map_err(to_net)?;
        log::info!("Wi-Fi IP: {}", ip.ip);
        Ok(())
    }
}

/// Configure and start the station. Association is left to [`supervise`], so
/// an unreachable access point never fails boot.
pub fn start(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> anyhow::Result<Wifi> {
    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), Some(nvs))?, sysloop)?;

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| anyhow!("SSID '{}' is too long", WIFI_SSID))?,
        password: WIFI_PASSWORD
            .try_into()
            .map_err(|_| anyhow!("Wi-Fi password is too long"))?,
        auth_method: if WIFI_PASSWORD.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;

    wifi.start()?;
    log::info!("Wi-Fi station started for '{}'", WIFI_SSID);
    Ok(wifi)
}

/// Join, then rejoin whenever the association drops. Never returns.
pub fn supervise(mut wifi: Wifi) {
    link::supervise(&mut wifi, WIFI_CHECK_INTERVAL, None);
}
