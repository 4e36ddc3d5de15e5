//! Saved-suggestion history store and CSV export.

use serde::{Deserialize, Serialize};

use crate::{
    combo::NumberSet,
    filter::{MAX_PAGE_SIZE, PageResult},
    types::SuggestionId,
};

/// Failure against the suggestion store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionsError {
    /// The suggestion carried no numbers.
    EmptyNumbers,
    /// The suggestion numbers failed to parse.
    InvalidNumbers {
        /// Human-readable cause.
        reason: String,
    },
    /// No suggestion carries this id.
    MissingSuggestion(SuggestionId),
}

/// A combination a user generated and chose to keep, with the score it held
/// against the latest draw at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSuggestion {
    /// Stable identity.
    pub id: SuggestionId,
    /// The saved numbers.
    pub numbers: NumberSet,
    /// Free-form label, e.g. "15-number game".
    pub kind: String,
    /// Points against the latest draw at the moment of saving.
    pub match_score: u8,
    /// Creation timestamp in epoch milliseconds.
    pub created_at_ms: u64,
}

/// Append-only suggestion history with explicit deletion and bulk purge.
#[derive(Debug, Default)]
pub struct SuggestionStore {
    records: Vec<SavedSuggestion>,
    next_id: SuggestionId,
}

impl SuggestionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Rebuilds a store from persisted records.
    pub fn from_records(mut records: Vec<SavedSuggestion>) -> Self {
        records.sort_by_key(|rec| rec.id);
        let next_id = records
            .last()
            .map(|rec| rec.id.saturating_add(1))
            .unwrap_or(1);
        Self { records, next_id }
    }

    /// Appends one suggestion.
    pub fn save(
        &mut self,
        numbers: NumberSet,
        kind: &str,
        match_score: u8,
        created_at_ms: u64,
    ) -> Result<SavedSuggestion, SuggestionsError> {
        if numbers.is_empty() {
            return Err(SuggestionsError::EmptyNumbers);
        }

        let id = self.next_id;
        self.next_id += 1;
        let record = SavedSuggestion {
            id,
            numbers,
            kind: kind.to_string(),
            match_score,
            created_at_ms,
        };
        self.records.push(record.clone());
        Ok(record)
    }

    /// One page of the history, newest first (creation time descending, id
    /// descending on ties). `page_size` is clamped to 1..=[`MAX_PAGE_SIZE`].
    pub fn list_page(&self, page: u32, page_size: u32) -> PageResult<SavedSuggestion> {
        let mut ordered: Vec<SavedSuggestion> = self.records.clone();
        ordered.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then(b.id.cmp(&a.id))
        });
        PageResult::paginate(ordered, page, page_size.clamp(1, MAX_PAGE_SIZE))
    }

    /// All suggestions, ascending by id.
    pub fn all(&self) -> &[SavedSuggestion] {
        &self.records
    }

    /// Looks up one suggestion by id.
    pub fn get(&self, id: SuggestionId) -> Result<&SavedSuggestion, SuggestionsError> {
        self.records
            .iter()
            .find(|rec| rec.id == id)
            .ok_or(SuggestionsError::MissingSuggestion(id))
    }

    /// Deletes suggestion `id`, returning it.
    pub fn delete(&mut self, id: SuggestionId) -> Result<SavedSuggestion, SuggestionsError> {
        let at = self
            .records
            .iter()
            .position(|rec| rec.id == id)
            .ok_or(SuggestionsError::MissingSuggestion(id))?;
        Ok(self.records.remove(at))
    }

    /// Removes every suggestion, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.records.len();
        self.records.clear();
        dropped
    }

    /// Renders the full history as CSV bytes, one record per line after the
    /// header. Numbers are space-separated and zero-padded to two digits.
    pub fn export_csv(&self) -> Vec<u8> {
        let mut out = String::from("id,numbers,kind,match_score,created_at_ms\n");
        for rec in &self.records {
            let numbers = rec
                .numbers
                .iter()
                .map(|n| format!("{n:02}"))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                rec.id,
                csv_escape(&numbers),
                csv_escape(&rec.kind),
                rec.match_score,
                rec.created_at_ms
            ));
        }
        out.into_bytes()
    }

    /// Number of stored suggestions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
