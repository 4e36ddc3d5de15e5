//! Read-only combination store and index-backed query execution.

use hashbrown::{HashMap, HashSet};

use crate::{
    combo::{Combination, NumberSet},
    core::indices::{Bounds, RangeIndex, VecIndex},
    types::{ComboId, POOL_SIZE, RUN_LENGTHS},
};

/// Lookup failure against the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No combination carries this id.
    MissingCombo(ComboId),
}

/// Pattern membership constraint over `row_pattern` / `column_pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFilter {
    /// The pattern strings to test against.
    pub patterns: HashSet<String>,
    /// True: the pattern must be in the set. False: must not be.
    pub include: bool,
}

impl PatternFilter {
    fn accepts(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern) == self.include
    }
}

/// History-independent constraints resolvable from store indexes alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPredicates {
    /// Bound on the combination sum.
    pub sum: Bounds<u16>,
    /// Bound on the even-number count.
    pub even: Bounds<u8>,
    /// Bound on the odd-number count.
    pub odd: Bounds<u8>,
    /// Bounds on consecutive-run counts, index 0 for runs of length 2.
    pub runs: [Bounds<u8>; RUN_LENGTHS],
    /// Bound on row occupancy.
    pub row_occupancy: Bounds<u8>,
    /// Bound on column occupancy.
    pub column_occupancy: Bounds<u8>,
    /// Numbers every candidate must contain.
    pub required: NumberSet,
    /// Numbers no candidate may contain.
    pub excluded: NumberSet,
    /// Row pattern membership constraint.
    pub row_patterns: Option<PatternFilter>,
    /// Column pattern membership constraint.
    pub column_patterns: Option<PatternFilter>,
}

impl Default for StaticPredicates {
    fn default() -> Self {
        Self {
            sum: Bounds::default(),
            even: Bounds::default(),
            odd: Bounds::default(),
            runs: [Bounds::default(); RUN_LENGTHS],
            row_occupancy: Bounds::default(),
            column_occupancy: Bounds::default(),
            required: NumberSet::empty(),
            excluded: NumberSet::empty(),
            row_patterns: None,
            column_patterns: None,
        }
    }
}

impl StaticPredicates {
    /// Returns true when `rec` satisfies every constraint.
    pub fn matches(&self, rec: &Combination) -> bool {
        self.sum.contains(rec.sum)
            && self.even.contains(rec.even_count)
            && self.odd.contains(rec.odd_count)
            && self
                .runs
                .iter()
                .zip(rec.run_counts.iter())
                .all(|(b, &count)| b.contains(count))
            && self.row_occupancy.contains(rec.row_occupancy)
            && self.column_occupancy.contains(rec.column_occupancy)
            && rec.numbers.is_superset_of(self.required)
            && rec.numbers.is_disjoint(self.excluded)
            && self
                .row_patterns
                .as_ref()
                .is_none_or(|p| p.accepts(&rec.row_pattern))
            && self
                .column_patterns
                .as_ref()
                .is_none_or(|p| p.accepts(&rec.column_pattern))
    }
}

/// The static universe plus one sorted index per bounded attribute, an
/// inverted number index, and a hash index per pattern kind.
///
/// Read-only after construction; the history-dependent attributes are kept
/// off to the side in [`crate::core::history::ScoreTable`] so a draw append
/// never touches these indexes.
#[derive(Debug)]
pub struct ComboStore {
    records: Vec<Combination>,
    pos: HashMap<ComboId, usize>,
    by_numbers: HashMap<NumberSet, ComboId>,
    sum_idx: RangeIndex<u16>,
    even_idx: RangeIndex<u8>,
    odd_idx: RangeIndex<u8>,
    run_idx: [RangeIndex<u8>; RUN_LENGTHS],
    row_occ_idx: RangeIndex<u8>,
    col_occ_idx: RangeIndex<u8>,
    by_number: Vec<Vec<ComboId>>,
    by_row_pattern: VecIndex<String>,
    by_col_pattern: VecIndex<String>,
}

impl ComboStore {
    /// Builds the store and all indexes from a materialized universe.
    ///
    /// Records are sorted by ascending id; ids must be unique.
    pub fn new(mut records: Vec<Combination>) -> Self {
        records.sort_by_key(|r| r.id);

        let mut store = Self {
            records: Vec::new(),
            pos: HashMap::new(),
            by_numbers: HashMap::new(),
            sum_idx: RangeIndex::new(),
            even_idx: RangeIndex::new(),
            odd_idx: RangeIndex::new(),
            run_idx: std::array::from_fn(|_| RangeIndex::new()),
            row_occ_idx: RangeIndex::new(),
            col_occ_idx: RangeIndex::new(),
            by_number: vec![Vec::new(); usize::from(POOL_SIZE)],
            by_row_pattern: VecIndex::new(),
            by_col_pattern: VecIndex::new(),
        };

        for (idx, rec) in records.iter().enumerate() {
            store.pos.insert(rec.id, idx);
            store.by_numbers.insert(rec.numbers, rec.id);
            store.insert_indices(rec);
        }
        store.records = records;
        store
    }

    fn insert_indices(&mut self, rec: &Combination) {
        self.sum_idx.insert(rec.sum, rec.id);
        self.even_idx.insert(rec.even_count, rec.id);
        self.odd_idx.insert(rec.odd_count, rec.id);
        for (i, &count) in rec.run_counts.iter().enumerate() {
            self.run_idx[i].insert(count, rec.id);
        }
        self.row_occ_idx.insert(rec.row_occupancy, rec.id);
        self.col_occ_idx.insert(rec.column_occupancy, rec.id);
        for n in rec.numbers.iter() {
            self.by_number[usize::from(n - 1)].push(rec.id);
        }
        self.by_row_pattern
            .entry(rec.row_pattern.clone())
            .or_default()
            .push(rec.id);
        self.by_col_pattern
            .entry(rec.column_pattern.clone())
            .or_default()
            .push(rec.id);
    }

    /// Number of rows in the universe.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true for an empty universe.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up one combination by id.
    pub fn get(&self, id: ComboId) -> Result<&Combination, StoreError> {
        self.pos
            .get(&id)
            .map(|&idx| &self.records[idx])
            .ok_or(StoreError::MissingCombo(id))
    }

    /// Dense position of `id` within [`Self::records`], if present.
    pub fn position_of(&self, id: ComboId) -> Option<usize> {
        self.pos.get(&id).copied()
    }

    /// All rows, ascending by id.
    pub fn records(&self) -> &[Combination] {
        &self.records
    }

    /// Id of the row whose numbers equal `numbers` exactly, if any.
    pub fn find_by_numbers(&self, numbers: NumberSet) -> Option<ComboId> {
        self.by_numbers.get(&numbers).copied()
    }

    /// Executes a static predicate set against the indexes.
    ///
    /// The smallest-estimate inclusive predicate seeds the candidate list
    /// (short-circuiting to empty when its index holds nothing in range);
    /// every remaining constraint, including the exclusion predicates, is
    /// then verified per record. Results come back in ascending id order,
    /// the one externally meaningful deterministic order, since every other
    /// attribute can tie.
    pub fn query_by_bounds(&self, preds: &StaticPredicates) -> Vec<ComboId> {
        let mut candidates = match self.smallest_seed(preds) {
            Some(seed) if seed.is_empty() => return Vec::new(),
            Some(seed) => seed,
            None => self.records.iter().map(|r| r.id).collect(),
        };

        candidates.retain(|&id| {
            self.pos
                .get(&id)
                .is_some_and(|&idx| preds.matches(&self.records[idx]))
        });
        candidates.sort_unstable();
        candidates
    }

    /// Materializes the inclusive predicate with the fewest candidate ids,
    /// or `None` when no inclusive predicate is active.
    fn smallest_seed(&self, preds: &StaticPredicates) -> Option<Vec<ComboId>> {
        enum Seed<'a> {
            Range16(&'a RangeIndex<u16>, Bounds<u16>),
            Range8(&'a RangeIndex<u8>, Bounds<u8>),
            Number(u8),
            Patterns(&'a VecIndex<String>, &'a HashSet<String>),
        }

        let mut best: Option<(usize, Seed<'_>)> = None;
        macro_rules! consider {
            ($estimate:expr, $seed:expr $(,)?) => {{
                let estimate = $estimate;
                if best.as_ref().is_none_or(|(n, _)| estimate < *n) {
                    best = Some((estimate, $seed));
                }
            }};
        }

        if preds.sum.is_active() {
            consider!(
                self.sum_idx.count_in(preds.sum),
                Seed::Range16(&self.sum_idx, preds.sum),
            );
        }
        if preds.even.is_active() {
            consider!(
                self.even_idx.count_in(preds.even),
                Seed::Range8(&self.even_idx, preds.even),
            );
        }
        if preds.odd.is_active() {
            consider!(
                self.odd_idx.count_in(preds.odd),
                Seed::Range8(&self.odd_idx, preds.odd),
            );
        }
        for (i, bounds) in preds.runs.iter().enumerate() {
            if bounds.is_active() {
                consider!(
                    self.run_idx[i].count_in(*bounds),
                    Seed::Range8(&self.run_idx[i], *bounds),
                );
            }
        }
        if preds.row_occupancy.is_active() {
            consider!(
                self.row_occ_idx.count_in(preds.row_occupancy),
                Seed::Range8(&self.row_occ_idx, preds.row_occupancy),
            );
        }
        if preds.column_occupancy.is_active() {
            consider!(
                self.col_occ_idx.count_in(preds.column_occupancy),
                Seed::Range8(&self.col_occ_idx, preds.column_occupancy),
            );
        }
        for n in preds.required.iter() {
            consider!(self.by_number[usize::from(n - 1)].len(), Seed::Number(n));
        }
        if let Some(filter) = preds.row_patterns.as_ref().filter(|f| f.include) {
            let estimate = filter
                .patterns
                .iter()
                .filter_map(|p| self.by_row_pattern.get(p))
                .map(Vec::len)
                .sum();
            consider!(estimate, Seed::Patterns(&self.by_row_pattern, &filter.patterns));
        }
        if let Some(filter) = preds.column_patterns.as_ref().filter(|f| f.include) {
            let estimate = filter
                .patterns
                .iter()
                .filter_map(|p| self.by_col_pattern.get(p))
                .map(Vec::len)
                .sum();
            consider!(estimate, Seed::Patterns(&self.by_col_pattern, &filter.patterns));
        }

        best.map(|(_, seed)| match seed {
            Seed::Range16(idx, bounds) => idx.ids_in(bounds),
            Seed::Range8(idx, bounds) => idx.ids_in(bounds),
            Seed::Number(n) => self.by_number[usize::from(n - 1)].clone(),
            Seed::Patterns(index, patterns) => {
                let mut ids = Vec::new();
                for pattern in patterns {
                    if let Some(bucket) = index.get(pattern) {
                        ids.extend_from_slice(bucket);
                    }
                }
                ids
            }
        })
    }
}
