//! Official draw history and the history-dependent score snapshot.

use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    combo::NumberSet,
    core::store::ComboStore,
    types::{ContestNumber, PICK_SIZE},
};

/// Failure while mutating or loading the draw history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// A draw with this contest number already exists.
    DuplicateContest(ContestNumber),
    /// No draw carries this contest number.
    MissingContest(ContestNumber),
    /// The draw payload is malformed.
    InvalidDraw {
        /// Human-readable cause.
        reason: String,
    },
}

/// One official draw outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    /// Unique, monotonically increasing contest identifier.
    pub contest_number: ContestNumber,
    /// Calendar date of the draw.
    pub date: NaiveDate,
    /// The 15 drawn numbers.
    pub numbers: NumberSet,
}

/// Append-only chronological list of official draws.
///
/// Kept sorted by contest number; the latest draw is the one with the
/// highest contest number, so a backfilled old contest never shifts the
/// match-score reference.
#[derive(Debug, Default)]
pub struct DrawHistory {
    draws: Vec<Draw>,
    by_contest: HashMap<ContestNumber, usize>,
}

impl DrawHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a history from persisted draws, validating each entry.
    pub fn from_draws(draws: Vec<Draw>) -> Result<Self, HistoryError> {
        let mut history = Self::new();
        for draw in draws {
            history.append(draw)?;
        }
        Ok(history)
    }

    /// Appends one draw.
    ///
    /// Fails with [`HistoryError::DuplicateContest`] when the contest number
    /// already exists and [`HistoryError::InvalidDraw`] when the payload does
    /// not hold exactly 15 numbers. Validation runs before any mutation.
    pub fn append(&mut self, draw: Draw) -> Result<(), HistoryError> {
        validate_draw(&draw)?;
        if self.by_contest.contains_key(&draw.contest_number) {
            return Err(HistoryError::DuplicateContest(draw.contest_number));
        }

        let at = self
            .draws
            .partition_point(|d| d.contest_number < draw.contest_number);
        self.draws.insert(at, draw);
        self.reindex();
        Ok(())
    }

    /// Removes the draw with `contest_number`, returning it.
    pub fn remove(&mut self, contest_number: ContestNumber) -> Result<Draw, HistoryError> {
        let at = self
            .by_contest
            .get(&contest_number)
            .copied()
            .ok_or(HistoryError::MissingContest(contest_number))?;
        let removed = self.draws.remove(at);
        self.reindex();
        Ok(removed)
    }

    /// Clears every draw.
    pub fn purge(&mut self) {
        self.draws.clear();
        self.by_contest.clear();
    }

    /// The draw with the highest contest number, if any.
    pub fn latest(&self) -> Option<&Draw> {
        self.draws.last()
    }

    /// All draws, ascending by contest number.
    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    /// Number of recorded draws.
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Returns true when no draw is recorded.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Returns true when `contest_number` is recorded.
    pub fn contains(&self, contest_number: ContestNumber) -> bool {
        self.by_contest.contains_key(&contest_number)
    }

    fn reindex(&mut self) {
        self.by_contest.clear();
        for (idx, draw) in self.draws.iter().enumerate() {
            self.by_contest.insert(draw.contest_number, idx);
        }
    }
}

/// Checks the draw payload shape: exactly 15 distinct numbers in range.
///
/// Range and uniqueness are guaranteed by [`NumberSet`] construction, so only
/// the cardinality is checked here.
pub fn validate_draw(draw: &Draw) -> Result<(), HistoryError> {
    let count = draw.numbers.len();
    if count != PICK_SIZE {
        return Err(HistoryError::InvalidDraw {
            reason: format!("expected {PICK_SIZE} numbers, got {count}"),
        });
    }
    Ok(())
}

/// Immutable snapshot of the history-dependent attributes for every row.
///
/// Rebuilt as a whole on each history mutation and published with an atomic
/// swap; readers always observe one complete generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTable {
    points: Vec<u8>,
    drawn: Vec<bool>,
    latest_contest: Option<ContestNumber>,
}

impl ScoreTable {
    /// The zero state: no draws, every score 0, nothing drawn.
    pub fn zeroed(store: &ComboStore) -> Self {
        Self {
            points: vec![0; store.len()],
            drawn: vec![false; store.len()],
            latest_contest: None,
        }
    }

    /// Full recomputation from the current history.
    ///
    /// `points` is the intersection size against the latest draw; `drawn`
    /// marks the exact row matching each recorded draw's numbers.
    pub fn compute(store: &ComboStore, history: &DrawHistory) -> Self {
        let mut table = Self::zeroed(store);

        if let Some(latest) = history.latest() {
            for (idx, rec) in store.records().iter().enumerate() {
                table.points[idx] = rec.numbers.intersection_count(latest.numbers);
            }
            table.latest_contest = Some(latest.contest_number);
        }

        for draw in history.draws() {
            if let Some(id) = store.find_by_numbers(draw.numbers) {
                if let Some(idx) = store.position_of(id) {
                    table.drawn[idx] = true;
                }
            }
        }

        tracing::debug!(
            rows = store.len(),
            draws = history.len(),
            latest = ?table.latest_contest,
            "score table rebuilt"
        );
        table
    }

    /// Match score of the row at dense position `idx`.
    pub fn points_at(&self, idx: usize) -> u8 {
        self.points[idx]
    }

    /// Whether the row at dense position `idx` matches a recorded draw.
    pub fn drawn_at(&self, idx: usize) -> bool {
        self.drawn[idx]
    }

    /// Contest number the scores were computed against, if any.
    pub fn latest_contest(&self) -> Option<ContestNumber> {
        self.latest_contest
    }
}
