use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::error::AppError;

pub const APP_NAME: &str = "ADB Deeplink Launcher";
pub const DATA_FILE_NAME: &str = "deeplinks.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdbSettings {
    pub command_path: String,
    pub devices_timeout_secs: u64,
    pub property_timeout_secs: u64,
    pub launch_timeout_secs: u64,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            command_path: String::new(),
            devices_timeout_secs: 10,
            property_timeout_secs: 2,
            launch_timeout_secs: 30,
        }
    }
}

impl AdbSettings {
    pub fn devices_timeout(&self) -> Duration {
        Duration::from_secs(self.devices_timeout_secs)
    }

    pub fn property_timeout(&self) -> Duration {
        Duration::from_secs(self.property_timeout_secs)
    }

    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the per-user data file location when non-empty.
    pub data_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("DEEPLINK_RUNNER_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deeplink_runner")
        .join("config.json")
}

pub fn backup_config_path(path: &Path) -> PathBuf {
    path.with_extension("backup.json")
}

/// Resolution order: env override, configured path, platform data dir.
pub fn data_path(config: &AppConfig) -> PathBuf {
    if let Ok(path) = std::env::var("DEEPLINK_RUNNER_DATA_PATH") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    let configured = config.storage.data_path.trim();
    if !configured.is_empty() {
        return PathBuf::from(configured);
    }
    default_data_path()
}

pub fn default_data_path() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAME).join(DATA_FILE_NAME)
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), ""))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::format(format!("Invalid config: {err}"), ""))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(config: &AppConfig, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if path.exists() {
        let _ = fs::copy(path, backup_config_path(path));
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), ""))?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), ""))?;
    Ok(())
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    let defaults = AdbSettings::default();
    if config.adb.devices_timeout_secs == 0 {
        config.adb.devices_timeout_secs = defaults.devices_timeout_secs;
    }
    if config.adb.property_timeout_secs == 0 {
        config.adb.property_timeout_secs = defaults.property_timeout_secs;
    }
    if config.adb.property_timeout_secs > config.adb.devices_timeout_secs {
        config.adb.property_timeout_secs = config.adb.devices_timeout_secs;
    }
    if config.adb.launch_timeout_secs == 0 {
        config.adb.launch_timeout_secs = defaults.launch_timeout_secs;
    }
    if config.logging.level.trim().is_empty() {
        config.logging.level = LoggingSettings::default().level;
    }
    config
}
