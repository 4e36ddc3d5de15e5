//! Persistence abstraction and SQLite implementation.

pub mod sqlite;

use crate::{
    core::history::Draw, favorites::FavoriteFilter, op::StoredOp, suggestions::SavedSuggestion,
    types::OpSeq,
};

/// Failure inside a persistence backend.
#[derive(Debug)]
pub enum PersistError {
    /// SQLite-level failure.
    Sqlite(rusqlite::Error),
    /// Payload encode/decode failure.
    Serde(serde_json::Error),
    /// Any other backend failure.
    Message(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Everything a restarted process needs to rebuild its in-memory state.
///
/// The combination universe itself is regenerated, not persisted; only the
/// three mutable stores survive on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Recorded draws, ascending by contest number.
    pub draws: Vec<Draw>,
    /// Saved favorite filters.
    pub favorites: Vec<FavoriteFilter>,
    /// Saved suggestions.
    pub suggestions: Vec<SavedSuggestion>,
}

/// Durable backing store for the three mutable side stores.
pub trait Storage: Send {
    /// Applies a batch of ops atomically, returning the last applied
    /// sequence number.
    fn apply_ops(&mut self, ops: &[StoredOp]) -> PersistResult<OpSeq>;

    /// Forces buffered writes to durable media.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }

    /// Reads the full persisted state.
    fn load(&self) -> PersistResult<PersistedState>;
}
