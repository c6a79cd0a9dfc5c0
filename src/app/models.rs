use serde::{Deserialize, Serialize};

pub const UNKNOWN_MODEL: &str = "Unknown";
pub const UNKNOWN_OS_VERSION: &str = "?";
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub serial: String,
    pub model: String,
    pub os_version: String,
}

impl Device {
    pub fn label(&self) -> String {
        format!("{} | {} | Android {}", self.serial, self.model, self.os_version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub name: String,
    pub deeplink: String,
}

impl FavoriteEntry {
    pub fn new(name: impl Into<String>, deeplink: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deeplink: deeplink.into(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}  →  {}", self.name, self.deeplink)
    }
}

/// On-disk shape of the data file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StoreData {
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportDocument {
    pub version: u32,
    pub history: Vec<String>,
    pub favorites: Vec<FavoriteEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub favorites_added: usize,
    pub history_added: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.favorites_added + self.history_added
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub serial: Option<String>,
    pub deeplink: String,
    pub recorded: bool,
    pub stdout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdbInfo {
    pub available: bool,
    pub version_output: String,
    pub command_path: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub trace_id: String,
    pub data: T,
}
