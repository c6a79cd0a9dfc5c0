#[cfg(test)]
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use crate::app::error::AppError;
use crate::app::models::{FavoriteEntry, StoreData};

/// Where the store document lives. `save` always receives the whole document.
pub trait StoreBackend {
    fn load(&self) -> StoreData;
    fn save(&self, data: &StoreData) -> Result<(), AppError>;
    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("backup.json")
    }

    fn keep_backup(&self) {
        let backup = self.backup_path();
        if let Err(err) = fs::copy(&self.path, &backup) {
            warn!(path = %backup.display(), error = %err, "failed to back up data file");
        }
    }
}

/// Keeps every well-formed entry of a data document. Returns the entries and
/// how many values were dropped (a non-object document counts as one).
pub fn salvage_store_data(document: &Value) -> (StoreData, usize) {
    let Some(object) = document.as_object() else {
        return (StoreData::default(), 1);
    };
    let mut data = StoreData::default();
    let mut skipped = 0;

    match object.get("history") {
        None | Some(Value::Null) => {}
        Some(Value::Array(entries)) => {
            for entry in entries {
                match entry.as_str() {
                    Some(link) => data.history.push(link.to_string()),
                    None => skipped += 1,
                }
            }
        }
        Some(_) => skipped += 1,
    }

    match object.get("favorites") {
        None | Some(Value::Null) => {}
        Some(Value::Array(entries)) => {
            for entry in entries {
                match serde_json::from_value::<FavoriteEntry>(entry.clone()) {
                    Ok(favorite) => data.favorites.push(favorite),
                    Err(_) => skipped += 1,
                }
            }
        }
        Some(_) => skipped += 1,
    }

    (data, skipped)
}

impl StoreBackend for JsonFileBackend {
    /// Missing and unreadable files start an empty store. Malformed entries are
    /// skipped; whenever anything is skipped the file is first copied to
    /// `*.backup.json` so the next full rewrite cannot lose it.
    fn load(&self) -> StoreData {
        if !self.path.exists() {
            return StoreData::default();
        }
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read data file");
                return StoreData::default();
            }
        };
        let (data, skipped) = match serde_json::from_str::<Value>(&raw) {
            Ok(document) => salvage_store_data(&document),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "data file is not valid JSON");
                (StoreData::default(), 1)
            }
        };
        if skipped > 0 {
            self.keep_backup();
            warn!(
                path = %self.path.display(),
                skipped,
                history = data.history.len(),
                favorites = data.favorites.len(),
                "skipped malformed data file entries"
            );
        }
        data
    }

    fn save(&self, data: &StoreData) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    AppError::system(format!("Failed to create data directory: {err}"), "")
                })?;
            }
        }
        let payload = serde_json::to_string_pretty(data)
            .map_err(|err| AppError::system(format!("Failed to serialize data: {err}"), ""))?;
        fs::write(&self.path, payload)
            .map_err(|err| AppError::system(format!("Failed to save data: {err}"), ""))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend. Clones share the same document, so a test can keep a handle
/// and inspect what the store wrote.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    saved: Rc<RefCell<Option<StoreData>>>,
    saves: Rc<RefCell<usize>>,
    fail_saves: Rc<RefCell<bool>>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn with_data(data: StoreData) -> Self {
        let backend = Self::default();
        *backend.saved.borrow_mut() = Some(data);
        backend
    }

    pub fn saved(&self) -> Option<StoreData> {
        self.saved.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.borrow_mut() = fail;
    }
}

#[cfg(test)]
impl StoreBackend for MemoryBackend {
    fn load(&self) -> StoreData {
        self.saved.borrow().clone().unwrap_or_default()
    }

    fn save(&self, data: &StoreData) -> Result<(), AppError> {
        if *self.fail_saves.borrow() {
            return Err(AppError::system("Failed to save data: disk unavailable", ""));
        }
        *self.saved.borrow_mut() = Some(data.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = JsonFileBackend::new(dir.path().join("deeplinks.json"));
        assert_eq!(backend.load(), StoreData::default());
        assert!(!backend.backup_path().exists());
    }

    #[test]
    fn corrupt_file_loads_empty_and_is_backed_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deeplinks.json");
        fs::write(&path, "{\"history\": [").expect("write");
        let backend = JsonFileBackend::new(&path);
        assert_eq!(backend.load(), StoreData::default());
        assert_eq!(
            fs::read_to_string(backend.backup_path()).expect("backup"),
            "{\"history\": ["
        );
    }

    #[test]
    fn malformed_entries_are_skipped_and_the_rest_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deeplinks.json");
        let raw = r#"{
            "history": ["app://a", 7, "app://b"],
            "favorites": [
                {"name": "A", "deeplink": "app://a"},
                {"deeplink": "app://nameless"}
            ]
        }"#;
        fs::write(&path, raw).expect("write");
        let backend = JsonFileBackend::new(&path);

        let data = backend.load();
        assert_eq!(data.history, vec!["app://a".to_string(), "app://b".to_string()]);
        assert_eq!(data.favorites, vec![FavoriteEntry::new("A", "app://a")]);
        assert_eq!(fs::read_to_string(backend.backup_path()).expect("backup"), raw);
    }

    #[test]
    fn well_formed_file_leaves_no_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deeplinks.json");
        fs::write(&path, r#"{"history": ["app://a"]}"#).expect("write");
        let backend = JsonFileBackend::new(&path);
        assert_eq!(backend.load().history, vec!["app://a".to_string()]);
        assert!(!backend.backup_path().exists());
    }

    #[test]
    fn salvage_counts_wrong_shapes() {
        let (data, skipped) = salvage_store_data(&json!(["app://a"]));
        assert_eq!(data, StoreData::default());
        assert_eq!(skipped, 1);

        let (data, skipped) = salvage_store_data(&json!({"history": "app://a", "favorites": null}));
        assert_eq!(data, StoreData::default());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn save_creates_parent_and_writes_pretty_unicode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ADB Deeplink Launcher").join("deeplinks.json");
        let backend = JsonFileBackend::new(&path);
        let data = StoreData {
            history: vec!["app://поиск".to_string()],
            favorites: vec![FavoriteEntry::new("Главная", "app://home")],
        };

        backend.save(&data).expect("save");

        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.contains("app://поиск"));
        assert!(raw.contains("\n  \"history\""));
        assert_eq!(backend.load(), data);
    }

    #[test]
    fn save_replaces_whole_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("deeplinks.json");
        let backend = JsonFileBackend::new(&path);
        backend
            .save(&StoreData {
                history: vec!["app://a".to_string(), "app://b".to_string()],
                favorites: Vec::new(),
            })
            .expect("first save");
        backend.save(&StoreData::default()).expect("second save");
        assert_eq!(backend.load(), StoreData::default());
    }

    #[test]
    fn memory_backend_can_fail_saves() {
        let backend = MemoryBackend::default();
        backend.set_fail_saves(true);
        let err = backend.save(&StoreData::default()).expect_err("expected failure");
        assert_eq!(err.code, "ERR_SYSTEM");
        assert_eq!(backend.save_count(), 0);
        assert_eq!(backend.saved(), None);
    }
}
