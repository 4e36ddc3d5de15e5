//! Filter compilation and paginated query execution.

/// Spec validation and predicate compilation.
pub mod plan;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    combo::{Combination, NumberSet},
    core::{
        history::{Draw, DrawHistory, HistoryError, ScoreTable},
        store::{ComboStore, StoreError},
    },
    filter::{FilterError, FilterSpec, PageResult},
    types::{ComboId, ContestNumber, DrawnFilter},
};

/// Combination summary returned to callers, joined with the row's
/// history-dependent attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboView {
    /// Stable identity.
    pub id: ComboId,
    /// The selected numbers, ascending.
    pub numbers: Vec<u8>,
    /// 25-character binary mask rendering.
    pub sequence: String,
    /// Sum of the selected numbers.
    pub sum: u16,
    /// Count of even members.
    pub even_count: u8,
    /// Count of odd members.
    pub odd_count: u8,
    /// Per-row selection counts rendered as five digits.
    pub row_pattern: String,
    /// Per-column selection counts rendered as five digits.
    pub column_pattern: String,
    /// Points against the latest recorded draw.
    pub match_score: u8,
    /// Whether the numbers match some recorded draw exactly.
    pub was_drawn: bool,
}

/// Compiles filter specifications into predicate plans, executes them over
/// the universe and the score snapshot, and paginates deterministically.
///
/// Owns the static [`ComboStore`], the [`DrawHistory`], and the current
/// [`ScoreTable`] generation. History mutations rebuild the table off to the
/// side and publish it with one `Arc` swap.
pub struct FilterEngine {
    store: ComboStore,
    history: DrawHistory,
    scores: Arc<ScoreTable>,
}

impl FilterEngine {
    /// Engine over a universe with no recorded draws.
    pub fn new(store: ComboStore) -> Self {
        let scores = Arc::new(ScoreTable::zeroed(&store));
        Self {
            store,
            history: DrawHistory::new(),
            scores,
        }
    }

    /// Engine over a universe with a preloaded draw history.
    pub fn with_history(store: ComboStore, history: DrawHistory) -> Self {
        let scores = Arc::new(ScoreTable::compute(&store, &history));
        Self {
            store,
            history,
            scores,
        }
    }

    /// The underlying universe store.
    pub fn store(&self) -> &ComboStore {
        &self.store
    }

    /// The recorded draw history.
    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    /// The current score snapshot.
    pub fn scores(&self) -> Arc<ScoreTable> {
        Arc::clone(&self.scores)
    }

    /// Validates, compiles, and executes `spec`, returning one page.
    ///
    /// The result is reproducible from the same spec and the same history
    /// state: candidates come back ascending by id and pagination is a pure
    /// slice of that order. A page past the end yields empty content with
    /// correct totals.
    pub fn search(&self, spec: &FilterSpec) -> Result<PageResult<ComboView>, FilterError> {
        let plan = plan::compile(spec)?;
        let mut ids = self.store.query_by_bounds(&plan.statics);

        if plan.needs_history() {
            let scores = &self.scores;
            ids.retain(|&id| {
                let Some(idx) = self.store.position_of(id) else {
                    return false;
                };
                plan.points.contains(scores.points_at(idx))
                    && match plan.drawn {
                        DrawnFilter::Any => true,
                        DrawnFilter::Drawn => scores.drawn_at(idx),
                        DrawnFilter::NotDrawn => !scores.drawn_at(idx),
                    }
            });
        }

        tracing::debug!(candidates = ids.len(), page = plan.page, "filter query executed");
        Ok(PageResult::paginate(ids, plan.page, plan.page_size).map(|id| self.view_of(id)))
    }

    /// Looks up one combination by id, joined with its current scores.
    pub fn get(&self, id: ComboId) -> Result<ComboView, StoreError> {
        self.store.get(id)?;
        Ok(self.view_of(id))
    }

    /// Records an official draw and republishes the score snapshot.
    ///
    /// Validation and the duplicate-contest check run before any mutation,
    /// so a rejected draw leaves the prior snapshot untouched.
    pub fn record_draw(&mut self, draw: Draw) -> Result<(), HistoryError> {
        self.history.append(draw)?;
        self.publish_scores();
        Ok(())
    }

    /// Removes a recorded draw and republishes the score snapshot against
    /// the remaining draws.
    pub fn remove_draw(&mut self, contest_number: ContestNumber) -> Result<Draw, HistoryError> {
        let removed = self.history.remove(contest_number)?;
        self.publish_scores();
        Ok(removed)
    }

    /// Clears the history and resets every score to the zero state.
    pub fn purge_draws(&mut self) {
        self.history.purge();
        self.scores = Arc::new(ScoreTable::zeroed(&self.store));
    }

    /// Points `numbers` would score against the latest recorded draw.
    pub fn match_score_for(&self, numbers: NumberSet) -> u8 {
        self.history
            .latest()
            .map(|draw| numbers.intersection_count(draw.numbers))
            .unwrap_or(0)
    }

    fn publish_scores(&mut self) {
        self.scores = Arc::new(ScoreTable::compute(&self.store, &self.history));
    }

    fn view_of(&self, id: ComboId) -> ComboView {
        let idx = self.store.position_of(id).unwrap_or_default();
        let rec = &self.store.records()[idx];
        view(rec, self.scores.points_at(idx), self.scores.drawn_at(idx))
    }
}

fn view(rec: &Combination, match_score: u8, was_drawn: bool) -> ComboView {
    ComboView {
        id: rec.id,
        numbers: rec.numbers.iter().collect(),
        sequence: rec.sequence(),
        sum: rec.sum,
        even_count: rec.even_count,
        odd_count: rec.odd_count,
        row_pattern: rec.row_pattern.clone(),
        column_pattern: rec.column_pattern.clone(),
        match_score,
        was_drawn,
    }
}
