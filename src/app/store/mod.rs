pub mod backend;
pub mod transfer;

use tracing::debug;

use crate::app::error::AppError;
use crate::app::models::{FavoriteEntry, StoreData};

#[cfg(test)]
pub use backend::MemoryBackend;
pub use backend::{JsonFileBackend, StoreBackend};

/// History and favorites, loaded once and rewritten in full after every change.
///
/// A failed write is reported to the caller but the in-memory change stays applied,
/// so memory and disk can differ until the next successful save.
pub struct LinkStore {
    data: StoreData,
    backend: Box<dyn StoreBackend>,
}

impl LinkStore {
    pub fn open(backend: Box<dyn StoreBackend>) -> Self {
        let data = backend.load();
        debug!(
            location = %backend.describe(),
            history = data.history.len(),
            favorites = data.favorites.len(),
            "store loaded"
        );
        Self { data, backend }
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    pub fn history(&self) -> &[String] {
        &self.data.history
    }

    pub fn favorites(&self) -> &[FavoriteEntry] {
        &self.data.favorites
    }

    pub fn location(&self) -> String {
        self.backend.describe()
    }

    pub fn persist(&self) -> Result<(), AppError> {
        self.backend.save(&self.data)
    }

    /// Inserts at the front unless already present; an existing entry keeps its place.
    pub fn record_launch(&mut self, deeplink: &str) -> Result<bool, AppError> {
        if self.data.history.iter().any(|entry| entry == deeplink) {
            return Ok(false);
        }
        self.data.history.insert(0, deeplink.to_string());
        self.persist()?;
        Ok(true)
    }

    pub fn add_favorite(&mut self, name: &str, deeplink: &str) -> Result<usize, AppError> {
        self.data.favorites.push(FavoriteEntry::new(name, deeplink));
        self.persist()?;
        Ok(self.data.favorites.len() - 1)
    }

    /// Returns `false` without writing when the index is out of range or the name is empty.
    pub fn rename_favorite(&mut self, index: usize, new_name: &str) -> Result<bool, AppError> {
        if new_name.is_empty() {
            return Ok(false);
        }
        let Some(favorite) = self.data.favorites.get_mut(index) else {
            return Ok(false);
        };
        favorite.name = new_name.to_string();
        self.persist()?;
        Ok(true)
    }

    pub fn delete_favorite(&mut self, index: usize) -> Result<Option<FavoriteEntry>, AppError> {
        if index >= self.data.favorites.len() {
            return Ok(None);
        }
        let removed = self.data.favorites.remove(index);
        self.persist()?;
        Ok(Some(removed))
    }

    pub fn clear_favorites(&mut self) -> Result<usize, AppError> {
        let removed = self.data.favorites.len();
        self.data.favorites.clear();
        self.persist()?;
        Ok(removed)
    }

    /// Clearing an already empty history does not touch the file.
    pub fn clear_history(&mut self) -> Result<usize, AppError> {
        if self.data.history.is_empty() {
            return Ok(0);
        }
        let removed = self.data.history.len();
        self.data.history.clear();
        self.persist()?;
        Ok(removed)
    }
}
