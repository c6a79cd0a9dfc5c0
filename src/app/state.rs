use std::path::PathBuf;

use tracing::info;

use crate::app::adb::client::AdbClient;
use crate::app::config::{data_path, AppConfig};
use crate::app::store::{JsonFileBackend, LinkStore};

/// Everything a session works against: resolved adb, loaded store, effective config.
pub struct AppState {
    pub config: AppConfig,
    pub adb: AdbClient,
    pub store: LinkStore,
}

impl AppState {
    pub fn new(config: AppConfig, adb: AdbClient, store: LinkStore) -> Self {
        Self { config, adb, store }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let data_file = data_path(&config);
        Self::open(config, data_file)
    }

    pub fn open(config: AppConfig, data_file: PathBuf) -> Self {
        let adb = AdbClient::from_settings(&config.adb);
        let store = LinkStore::open(Box::new(JsonFileBackend::new(data_file)));
        info!(
            adb = ?adb.program(),
            data = %store.location(),
            "session state ready"
        );
        Self::new(config, adb, store)
    }
}
