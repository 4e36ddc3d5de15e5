//! Shared primitive IDs, grid constants, and filter enums.

use serde::{Deserialize, Serialize};

/// Stable combination identifier, assigned once at universe generation.
pub type ComboId = u32;
/// Monotonic operation sequence number.
pub type OpSeq = u64;
/// Official draw contest identifier.
pub type ContestNumber = u32;
/// Favorite filter identifier.
pub type FavoriteId = u64;
/// Saved suggestion identifier.
pub type SuggestionId = u64;

/// Highest playable number.
pub const POOL_SIZE: u8 = 25;
/// Numbers picked per combination and per official draw.
pub const PICK_SIZE: u8 = 15;
/// Side length of the canonical number grid (numbers 1..=25 laid out row-major).
pub const GRID_SIDE: u8 = 5;
/// Largest possible combination sum (11 + 12 + ... + 25).
pub const MAX_SUM: u16 = 270;

/// Shortest consecutive-run length tracked per combination.
pub const MIN_RUN_LENGTH: u8 = 2;
/// Longest consecutive-run length tracked per combination.
pub const MAX_RUN_LENGTH: u8 = 8;
/// Number of tracked run lengths (2 through 8).
pub const RUN_LENGTHS: usize = (MAX_RUN_LENGTH - MIN_RUN_LENGTH + 1) as usize;

/// Tri-state constraint over the `was_drawn` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawnFilter {
    /// No constraint.
    #[default]
    Any,
    /// Only combinations matching some recorded draw.
    Drawn,
    /// Only combinations matching no recorded draw.
    NotDrawn,
}
