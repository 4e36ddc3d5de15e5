//! Runtime event stream payloads.

use crate::types::{ContestNumber, FavoriteId, OpSeq, SuggestionId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotoEvent {
    /// An official draw was recorded and scores republished.
    DrawRecorded {
        /// Contest number of the new draw.
        contest_number: ContestNumber,
    },
    /// A recorded draw was removed and scores republished.
    DrawRemoved {
        /// Contest number of the removed draw.
        contest_number: ContestNumber,
    },
    /// The whole draw history was purged and scores reset.
    DrawsPurged,
    /// A favorite filter was saved.
    FavoriteSaved {
        /// Id of the saved favorite.
        id: FavoriteId,
    },
    /// A favorite filter was deleted.
    FavoriteDeleted {
        /// Id of the deleted favorite.
        id: FavoriteId,
    },
    /// A suggestion was saved.
    SuggestionSaved {
        /// Id of the saved suggestion.
        id: SuggestionId,
    },
    /// A suggestion was deleted.
    SuggestionDeleted {
        /// Id of the deleted suggestion.
        id: SuggestionId,
    },
    /// The suggestion history was cleared.
    SuggestionsCleared,
    /// Persistence has reached at least this op sequence.
    DurableUpTo {
        /// Highest sequence known durable.
        op_seq: OpSeq,
    },
}
