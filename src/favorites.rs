//! Named filter persistence store.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{filter::FilterSpec, types::FavoriteId};

/// Failure against the favorite store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesError {
    /// The favorite name was empty or whitespace.
    EmptyName,
    /// No favorite carries this id.
    MissingFavorite(FavoriteId),
    /// The stored spec JSON failed to encode or decode.
    Serde(String),
}

/// A named, serialized filter specification.
///
/// The filter spec rides as a JSON string: the store persists it verbatim
/// and never validates its semantics. Validation happens in the engine, at
/// use time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteFilter {
    /// Stable identity.
    pub id: FavoriteId,
    /// Display name, unique within the store.
    pub name: String,
    /// The serialized [`FilterSpec`].
    pub spec_json: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at_ms: u64,
}

/// In-memory favorite store, keyed by id with unique names.
#[derive(Debug, Default)]
pub struct FavoriteStore {
    records: HashMap<FavoriteId, FavoriteFilter>,
    next_id: FavoriteId,
}

impl FavoriteStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Rebuilds a store from persisted records.
    pub fn from_records(records: Vec<FavoriteFilter>) -> Self {
        let mut store = Self::new();
        for rec in records {
            store.next_id = store.next_id.max(rec.id.saturating_add(1));
            store.records.insert(rec.id, rec);
        }
        store
    }

    /// Saves `spec` under `name`, always materializing a new record.
    ///
    /// Saving over an existing name is a versioned replacement: the old
    /// record is dropped and a fresh id is assigned, never a hidden merge.
    /// Returns the new record plus the replaced id, if any.
    pub fn save(
        &mut self,
        name: &str,
        spec: &FilterSpec,
        created_at_ms: u64,
    ) -> Result<(FavoriteFilter, Option<FavoriteId>), FavoritesError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FavoritesError::EmptyName);
        }
        let spec_json =
            serde_json::to_string(spec).map_err(|e| FavoritesError::Serde(e.to_string()))?;

        let replaced = self
            .records
            .values()
            .find(|rec| rec.name == name)
            .map(|rec| rec.id);
        if let Some(old) = replaced {
            self.records.remove(&old);
        }

        let id = self.next_id;
        self.next_id += 1;
        let record = FavoriteFilter {
            id,
            name: name.to_string(),
            spec_json,
            created_at_ms,
        };
        self.records.insert(id, record.clone());
        Ok((record, replaced))
    }

    /// All favorites, ascending by id.
    pub fn list(&self) -> Vec<FavoriteFilter> {
        let mut out: Vec<FavoriteFilter> = self.records.values().cloned().collect();
        out.sort_by_key(|rec| rec.id);
        out
    }

    /// Looks up one favorite by id.
    pub fn get(&self, id: FavoriteId) -> Result<&FavoriteFilter, FavoritesError> {
        self.records
            .get(&id)
            .ok_or(FavoritesError::MissingFavorite(id))
    }

    /// Decodes the stored spec of favorite `id`.
    pub fn load_spec(&self, id: FavoriteId) -> Result<FilterSpec, FavoritesError> {
        let rec = self.get(id)?;
        serde_json::from_str(&rec.spec_json).map_err(|e| FavoritesError::Serde(e.to_string()))
    }

    /// Deletes favorite `id`, returning it.
    pub fn delete(&mut self, id: FavoriteId) -> Result<FavoriteFilter, FavoritesError> {
        self.records
            .remove(&id)
            .ok_or(FavoritesError::MissingFavorite(id))
    }

    /// Number of stored favorites.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
