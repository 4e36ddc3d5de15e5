//! Durable mutation op model handed to the persistence worker.

use serde::{Deserialize, Serialize};

use crate::{
    core::history::Draw,
    favorites::FavoriteFilter,
    suggestions::SavedSuggestion,
    types::{ContestNumber, FavoriteId, OpSeq, SuggestionId},
};

/// One durable mutation against the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideOp {
    /// Record an official draw.
    AppendDraw {
        /// The recorded draw.
        draw: Draw,
    },
    /// Remove one recorded draw.
    RemoveDraw {
        /// Contest number of the removed draw.
        contest_number: ContestNumber,
    },
    /// Drop every recorded draw.
    PurgeDraws,
    /// Persist a favorite, optionally replacing a prior version.
    SaveFavorite {
        /// The new record.
        favorite: FavoriteFilter,
        /// Id of the record this save versioned over, if any.
        replaced: Option<FavoriteId>,
    },
    /// Remove one favorite.
    DeleteFavorite {
        /// Id of the removed favorite.
        id: FavoriteId,
    },
    /// Persist a saved suggestion.
    SaveSuggestion {
        /// The new record.
        suggestion: SavedSuggestion,
    },
    /// Remove one saved suggestion.
    DeleteSuggestion {
        /// Id of the removed suggestion.
        id: SuggestionId,
    },
    /// Drop every saved suggestion.
    ClearSuggestions,
}

/// Op plus worker bookkeeping metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOp {
    /// Monotonic operation sequence.
    pub seq: OpSeq,
    /// Operation timestamp in milliseconds.
    pub ts_ms: u64,
    /// Operation body.
    pub op: SideOp,
}
