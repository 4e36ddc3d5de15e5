//! Combination domain records and derived-attribute computation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ComboId, GRID_SIDE, MAX_RUN_LENGTH, MIN_RUN_LENGTH, POOL_SIZE, RUN_LENGTHS};

/// Rejection raised when building a [`NumberSet`] from raw numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSetError {
    /// A number fell outside 1..=25.
    OutOfRange(u8),
    /// The same number appeared twice.
    Duplicate(u8),
}

impl fmt::Display for NumberSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(n) => write!(f, "number {n} outside 1..={POOL_SIZE}"),
            Self::Duplicate(n) => write!(f, "number {n} listed twice"),
        }
    }
}

/// Set of lottery numbers in 1..=25, stored as a 25-bit mask.
///
/// Serializes as a sorted list of numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "Vec<u8>", try_from = "Vec<u8>")]
pub struct NumberSet(u32);

impl NumberSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from raw numbers, rejecting out-of-range and duplicate entries.
    pub fn from_numbers(numbers: &[u8]) -> Result<Self, NumberSetError> {
        let mut set = Self::empty();
        for &n in numbers {
            if n < 1 || n > POOL_SIZE {
                return Err(NumberSetError::OutOfRange(n));
            }
            if set.contains(n) {
                return Err(NumberSetError::Duplicate(n));
            }
            set.insert(n);
        }
        Ok(set)
    }

    /// Adds `n` to the set. Out-of-range numbers are ignored.
    pub fn insert(&mut self, n: u8) {
        if (1..=POOL_SIZE).contains(&n) {
            self.0 |= 1 << (n - 1);
        }
    }

    /// Returns true when `n` is a member.
    pub fn contains(self, n: u8) -> bool {
        (1..=POOL_SIZE).contains(&n) && self.0 & (1 << (n - 1)) != 0
    }

    /// Number of members.
    pub fn len(self) -> u8 {
        self.0.count_ones() as u8
    }

    /// Returns true when no number is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (1..=POOL_SIZE).filter(move |&n| self.contains(n))
    }

    /// Size of the intersection with `other`.
    pub fn intersection_count(self, other: Self) -> u8 {
        (self.0 & other.0).count_ones() as u8
    }

    /// Returns true when every member of `other` is also a member of `self`.
    pub fn is_superset_of(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true when the sets share no member.
    pub fn is_disjoint(self, other: Self) -> bool {
        self.0 & other.0 == 0
    }

    /// Canonical 25-character binary mask, leftmost character for number 1.
    pub fn mask_string(self) -> String {
        (1..=POOL_SIZE)
            .map(|n| if self.contains(n) { '1' } else { '0' })
            .collect()
    }
}

impl From<NumberSet> for Vec<u8> {
    fn from(set: NumberSet) -> Self {
        set.iter().collect()
    }
}

impl TryFrom<Vec<u8>> for NumberSet {
    type Error = NumberSetError;

    fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_numbers(&numbers)
    }
}

/// Immutable universe row: a candidate selection plus its precomputed attributes.
///
/// The two history-dependent attributes (`match_score`, `was_drawn`) live in
/// [`crate::core::history::ScoreTable`], not on the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    /// Stable identity.
    pub id: ComboId,
    /// The selected numbers.
    pub numbers: NumberSet,
    /// Sum of the selected numbers.
    pub sum: u16,
    /// Count of even members.
    pub even_count: u8,
    /// Count of odd members.
    pub odd_count: u8,
    /// Count of maximal runs of exactly k consecutive numbers, k = 2..=8.
    pub run_counts: [u8; RUN_LENGTHS],
    /// Per-row selection counts of the 5x5 grid, rendered as five digits.
    pub row_pattern: String,
    /// Per-column selection counts of the 5x5 grid, rendered as five digits.
    pub column_pattern: String,
    /// Number of grid rows holding at least one selected number.
    pub row_occupancy: u8,
    /// Number of grid columns holding at least one selected number.
    pub column_occupancy: u8,
}

impl Combination {
    /// Materializes a row, computing every derived attribute from `numbers`.
    pub fn new(id: ComboId, numbers: NumberSet) -> Self {
        let mut sum = 0u16;
        let mut even_count = 0u8;
        let mut rows = [0u8; GRID_SIDE as usize];
        let mut cols = [0u8; GRID_SIDE as usize];

        for n in numbers.iter() {
            sum += u16::from(n);
            if n % 2 == 0 {
                even_count += 1;
            }
            rows[usize::from((n - 1) / GRID_SIDE)] += 1;
            cols[usize::from((n - 1) % GRID_SIDE)] += 1;
        }

        let mut run_counts = [0u8; RUN_LENGTHS];
        let mut run_len = 0u8;
        for n in 1..=POOL_SIZE {
            if numbers.contains(n) {
                run_len += 1;
            } else {
                close_run(&mut run_counts, run_len);
                run_len = 0;
            }
        }
        close_run(&mut run_counts, run_len);

        Self {
            id,
            numbers,
            sum,
            even_count,
            odd_count: numbers.len() - even_count,
            run_counts,
            row_pattern: pattern_string(&rows),
            column_pattern: pattern_string(&cols),
            row_occupancy: occupancy(&rows),
            column_occupancy: occupancy(&cols),
        }
    }

    /// Count of maximal runs of exactly `length` consecutive numbers.
    ///
    /// `length` must lie in 2..=8.
    pub fn run_count(&self, length: u8) -> u8 {
        debug_assert!((MIN_RUN_LENGTH..=MAX_RUN_LENGTH).contains(&length));
        self.run_counts[usize::from(length - MIN_RUN_LENGTH)]
    }

    /// Canonical string rendering: the 25-character binary mask.
    pub fn sequence(&self) -> String {
        self.numbers.mask_string()
    }
}

fn close_run(run_counts: &mut [u8; RUN_LENGTHS], run_len: u8) {
    if (MIN_RUN_LENGTH..=MAX_RUN_LENGTH).contains(&run_len) {
        run_counts[usize::from(run_len - MIN_RUN_LENGTH)] += 1;
    }
}

fn pattern_string(counts: &[u8; GRID_SIDE as usize]) -> String {
    counts.iter().map(|&c| char::from(b'0' + c)).collect()
}

fn occupancy(counts: &[u8; GRID_SIDE as usize]) -> u8 {
    counts.iter().filter(|&&c| c > 0).count() as u8
}
