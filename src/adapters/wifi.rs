//! WiFi station-mode adapter.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: only credential validation is available.
//!
//! Bring-up retries a fixed number of times; after that the firmware keeps
//! running offline (buttons still work) and the MQTT client reports
//! `Disconnected` until the station comes back.

use core::fmt;

use crate::config::WifiConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
#[cfg(target_os = "espidf")]
use log::{info, warn};

#[cfg(target_os = "espidf")]
const CONNECT_ATTEMPTS: u32 = 5;
#[cfg(target_os = "espidf")]
const RETRY_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Check the configured credentials before touching the radio.
pub fn validate_credentials(cfg: &WifiConfig) -> Result<(), ConnectivityError> {
    if cfg.ssid.is_empty() {
        return Err(ConnectivityError::NoCredentials);
    }
    if cfg.ssid.len() > 32 || !is_printable_ascii(&cfg.ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !cfg.password.is_empty() && !(8..=64).contains(&cfg.password.len()) {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Station bring-up
// ───────────────────────────────────────────────────────────────

/// Start the station and block until the netif is up or every attempt
/// failed.  The returned driver must be kept alive for the connection to
/// persist.
#[cfg(target_os = "espidf")]
pub fn connect_station(
    modem: Modem,
    sys_loop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    cfg: &WifiConfig,
) -> anyhow::Result<EspWifi<'static>> {
    validate_credentials(cfg)?;

    let mut esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))?;
    let mut wifi = BlockingWifi::wrap(&mut esp_wifi, sys_loop)?;

    let auth_method = if cfg.password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: cfg
            .ssid
            .as_str()
            .try_into()
            .map_err(|_| ConnectivityError::InvalidSsid)?,
        password: cfg
            .password
            .as_str()
            .try_into()
            .map_err(|_| ConnectivityError::InvalidPassword)?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("WiFi: connecting to '{}'", cfg.ssid);

    for attempt in 1..=CONNECT_ATTEMPTS {
        match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => {
                info!("WiFi: connected on attempt {}", attempt);
                drop(wifi);
                return Ok(esp_wifi);
            }
            Err(e) => {
                warn!("WiFi: attempt {}/{} failed: {:?}", attempt, CONNECT_ATTEMPTS, e);
                let _ = wifi.disconnect();
                std::thread::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS));
            }
        }
    }
    Err(ConnectivityError::ConnectionFailed.into())
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
