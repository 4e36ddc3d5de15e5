//! FilterSpec validation and predicate compilation.

use hashbrown::HashSet;

use crate::{
    combo::NumberSet,
    core::{
        indices::Bounds,
        store::{PatternFilter, StaticPredicates},
    },
    filter::{FilterError, FilterSpec, MAX_PAGE_SIZE},
    types::{
        DrawnFilter, GRID_SIDE, MAX_RUN_LENGTH, MAX_SUM, MIN_RUN_LENGTH, PICK_SIZE, POOL_SIZE,
    },
};

/// Executable form of a validated [`FilterSpec`]: static predicates for the
/// store, history-dependent predicates for the engine's final pass, and the
/// page window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Constraints resolvable from store indexes alone.
    pub statics: StaticPredicates,
    /// Bound on the match score against the latest draw.
    pub points: Bounds<u8>,
    /// Tri-state constraint on `was_drawn`.
    pub drawn: DrawnFilter,
    /// Zero-based page index.
    pub page: u32,
    /// Validated page size.
    pub page_size: u32,
}

impl Plan {
    /// Returns true when the plan must consult the score table.
    pub fn needs_history(&self) -> bool {
        self.points.is_active() || self.drawn != DrawnFilter::Any
    }
}

/// Validates `spec` and compiles it into a [`Plan`].
///
/// Every rejection names the offending field by its wire spelling.
pub fn compile(spec: &FilterSpec) -> Result<Plan, FilterError> {
    let points = checked_bounds("pointsMin", spec.points_min, "pointsMax", spec.points_max, PICK_SIZE)?;
    let sum = checked_bounds("sumMin", spec.sum_min, "sumMax", spec.sum_max, MAX_SUM)?;
    let even = checked_bounds("evenMin", spec.even_min, "evenMax", spec.even_max, PICK_SIZE)?;
    let odd = checked_bounds("oddMin", spec.odd_min, "oddMax", spec.odd_max, PICK_SIZE)?;
    let row_occupancy = checked_bounds("rowMin", spec.row_min, "rowMax", spec.row_max, GRID_SIDE)?;
    let column_occupancy =
        checked_bounds("columnMin", spec.column_min, "columnMax", spec.column_max, GRID_SIDE)?;

    let runs = compile_runs(spec)?;
    let required = number_list("requiredNumbers", &spec.required_numbers)?;
    let excluded = number_list("excludedNumbers", &spec.excluded_numbers)?;
    if let Some(number) = required.iter().find(|&n| excluded.contains(n)) {
        return Err(FilterError::RequiredExcludedOverlap { number });
    }

    let row_patterns = pattern_filter(
        "selectedRowPatterns",
        &spec.selected_row_patterns,
        spec.include_row_patterns,
    )?;
    let column_patterns = pattern_filter(
        "selectedColumnPatterns",
        &spec.selected_column_patterns,
        spec.include_column_patterns,
    )?;

    let drawn = fold_drawn(spec)?;

    if spec.page_size == 0 || spec.page_size > MAX_PAGE_SIZE {
        return Err(FilterError::InvalidField {
            field: "pageSize",
            reason: format!("must lie in 1..={MAX_PAGE_SIZE}, got {}", spec.page_size),
        });
    }

    Ok(Plan {
        statics: StaticPredicates {
            sum,
            even,
            odd,
            runs,
            row_occupancy,
            column_occupancy,
            required,
            excluded,
            row_patterns,
            column_patterns,
        },
        points,
        drawn,
        page: spec.page,
        page_size: spec.page_size,
    })
}

fn checked_bounds<T>(
    min_field: &'static str,
    min: Option<T>,
    max_field: &'static str,
    max: Option<T>,
    cap: T,
) -> Result<Bounds<T>, FilterError>
where
    T: Copy + Ord + std::fmt::Display,
{
    if let Some(lo) = min {
        if lo > cap {
            return Err(FilterError::InvalidField {
                field: min_field,
                reason: format!("{lo} exceeds the maximum of {cap}"),
            });
        }
    }
    if let Some(hi) = max {
        if hi > cap {
            return Err(FilterError::InvalidField {
                field: max_field,
                reason: format!("{hi} exceeds the maximum of {cap}"),
            });
        }
    }
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(FilterError::InvalidField {
                field: min_field,
                reason: format!("lower bound {lo} exceeds upper bound {hi}"),
            });
        }
    }
    Ok(Bounds::new(min, max))
}

fn compile_runs(spec: &FilterSpec) -> Result<[Bounds<u8>; crate::types::RUN_LENGTHS], FilterError> {
    let mut runs = [Bounds::default(); crate::types::RUN_LENGTHS];
    let mut seen = [false; crate::types::RUN_LENGTHS];
    for bound in &spec.runs {
        if !(MIN_RUN_LENGTH..=MAX_RUN_LENGTH).contains(&bound.length) {
            return Err(FilterError::InvalidField {
                field: "runs",
                reason: format!(
                    "run length must lie in {MIN_RUN_LENGTH}..={MAX_RUN_LENGTH}, got {}",
                    bound.length
                ),
            });
        }
        let slot = usize::from(bound.length - MIN_RUN_LENGTH);
        if seen[slot] {
            return Err(FilterError::InvalidField {
                field: "runs",
                reason: format!("run length {} listed twice", bound.length),
            });
        }
        seen[slot] = true;
        // A 15-number selection fits at most floor(15 / k) runs of length k.
        let cap = PICK_SIZE / bound.length;
        runs[slot] = checked_bounds("runs", bound.min, "runs", bound.max, cap)?;
    }
    Ok(runs)
}

fn number_list(field: &'static str, numbers: &[u8]) -> Result<NumberSet, FilterError> {
    let mut set = NumberSet::empty();
    for &n in numbers {
        if !(1..=POOL_SIZE).contains(&n) {
            return Err(FilterError::InvalidField {
                field,
                reason: format!("number {n} outside 1..={POOL_SIZE}"),
            });
        }
        set.insert(n);
    }
    Ok(set)
}

fn pattern_filter(
    field: &'static str,
    patterns: &[String],
    include: bool,
) -> Result<Option<PatternFilter>, FilterError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut set = HashSet::with_capacity(patterns.len());
    for pattern in patterns {
        let well_formed = pattern.len() == usize::from(GRID_SIDE)
            && pattern.bytes().all(|b| (b'0'..=b'0' + GRID_SIDE).contains(&b));
        if !well_formed {
            return Err(FilterError::InvalidField {
                field,
                reason: format!(
                    "pattern {pattern:?} must be {GRID_SIDE} digits, each at most {GRID_SIDE}"
                ),
            });
        }
        set.insert(pattern.clone());
    }
    Ok(Some(PatternFilter {
        patterns: set,
        include,
    }))
}

/// Folds the legacy boolean exclusion toggle into the tri-state filter.
fn fold_drawn(spec: &FilterSpec) -> Result<DrawnFilter, FilterError> {
    if !spec.exclude_any_previously_drawn {
        return Ok(spec.already_drawn);
    }
    match spec.already_drawn {
        DrawnFilter::Any | DrawnFilter::NotDrawn => Ok(DrawnFilter::NotDrawn),
        DrawnFilter::Drawn => Err(FilterError::InvalidField {
            field: "excludeAnyPreviouslyDrawn",
            reason: "contradicts alreadyDrawn = drawn".to_string(),
        }),
    }
}
