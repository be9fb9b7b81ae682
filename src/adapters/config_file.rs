//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`] by reading a JSON document from the mounted
//! flash filesystem (`/spiffs` on the device, any path on the host).
//! Fields missing from the document keep their defaults.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

/// Default location of the configuration document on the device.
pub const DEFAULT_CONFIG_PATH: &str = "/spiffs/control-io.json";

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        let config: SystemConfig =
            serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}

/// Load through `port`, falling back to defaults on any failure.
pub fn load_or_default(port: &impl ConfigPort) -> SystemConfig {
    match port.load() {
        Ok(cfg) => {
            info!("Config loaded ({} schedule entries)", cfg.schedule.len());
            cfg
        }
        Err(ConfigError::NotFound) => {
            info!("No config file, using defaults");
            SystemConfig::default()
        }
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

/// Mount the SPIFFS partition at `/spiffs`.
#[cfg(target_os = "espidf")]
pub fn mount_storage() -> Result<(), ConfigError> {
    use esp_idf_sys::{esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, ESP_OK};

    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: conf and its string literal outlive the call; called once
    // from main before any file access.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK {
        warn!("SPIFFS mount failed (rc={})", ret);
        return Err(ConfigError::IoError);
    }
    info!("SPIFFS mounted at /spiffs");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount_storage() -> Result<(), ConfigError> {
    Ok(())
}
