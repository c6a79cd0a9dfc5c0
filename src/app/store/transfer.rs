use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::app::error::AppError;
use crate::app::models::{
    ExportDocument, FavoriteEntry, ImportSummary, StoreData, EXPORT_VERSION,
};
use crate::app::store::LinkStore;

/// Validates an import document: an object with a `favorites` list of `{name, deeplink}`
/// and an optional `history` list of strings.
pub fn parse_import_document(document: &Value) -> Result<StoreData, AppError> {
    let Some(object) = document.as_object() else {
        return Err(AppError::format(
            "Invalid file format: expected a JSON object",
            "",
        ));
    };
    let Some(favorites) = object.get("favorites") else {
        return Err(AppError::format(
            "Invalid file format: missing \"favorites\"",
            "",
        ));
    };
    let favorites: Vec<FavoriteEntry> = serde_json::from_value(favorites.clone())
        .map_err(|err| AppError::format(format!("Invalid favorites: {err}"), ""))?;
    let history: Vec<String> = match object.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(history) => serde_json::from_value(history.clone())
            .map_err(|err| AppError::format(format!("Invalid history: {err}"), ""))?,
    };
    Ok(StoreData { history, favorites })
}

pub fn read_document(path: &Path) -> Result<Value, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::format(format!("Failed to read file: {err}"), ""))?;
    serde_json::from_str(&raw)
        .map_err(|err| AppError::format(format!("Failed to parse file: {err}"), ""))
}

impl LinkStore {
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument {
            version: EXPORT_VERSION,
            history: self.history().to_vec(),
            favorites: self.favorites().to_vec(),
        }
    }

    pub fn export_to_path(&self, path: &Path) -> Result<(), AppError> {
        let payload = serde_json::to_string_pretty(&self.export_document())
            .map_err(|err| AppError::system(format!("Failed to serialize export: {err}"), ""))?;
        fs::write(path, payload)
            .map_err(|err| AppError::system(format!("Failed to write export: {err}"), ""))
    }

    /// Appends entries not already present (exact value match) and persists.
    /// A rejected document leaves the store untouched.
    pub fn import_and_merge(&mut self, document: &Value) -> Result<ImportSummary, AppError> {
        let incoming = parse_import_document(document)?;
        let data = &mut self.data;

        let mut summary = ImportSummary::default();
        for favorite in incoming.favorites {
            if !data.favorites.contains(&favorite) {
                data.favorites.push(favorite);
                summary.favorites_added += 1;
            }
        }
        for link in incoming.history {
            if !data.history.contains(&link) {
                data.history.push(link);
                summary.history_added += 1;
            }
        }

        self.persist()?;
        Ok(summary)
    }

    pub fn import_from_path(&mut self, path: &Path) -> Result<ImportSummary, AppError> {
        let document = read_document(path)?;
        self.import_and_merge(&document)
    }
}
