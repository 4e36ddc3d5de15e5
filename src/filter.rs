//! Filter specification and page result types.
//!
//! [`FilterSpec`] is the one canonical shape for a query; historical
//! field-naming variants from older clients are a transport-adapter concern
//! and never reach this module. Validation happens once, at compile time in
//! [`crate::engine::plan`], never in the side stores that persist specs.

use serde::{Deserialize, Serialize};

use crate::types::DrawnFilter;

/// Page size applied when a spec leaves `page_size` unset.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Hard cap on `page_size`; larger requests are rejected, not clamped.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Rejection raised when a [`FilterSpec`] fails validation.
///
/// Always names the offending field using its wire spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A field carried a value outside its legal domain.
    InvalidField {
        /// Wire name of the rejected field.
        field: &'static str,
        /// Human-readable cause.
        reason: String,
    },
    /// `requiredNumbers` and `excludedNumbers` share a member.
    RequiredExcludedOverlap {
        /// A number present in both lists.
        number: u8,
    },
}

/// Inclusive bound pair on the count of runs of exactly `length` consecutive
/// numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunBound {
    /// Run length, 2..=8.
    pub length: u8,
    /// Lower bound, unconstrained when absent.
    #[serde(default)]
    pub min: Option<u8>,
    /// Upper bound, unconstrained when absent.
    #[serde(default)]
    pub max: Option<u8>,
}

/// Canonical multi-predicate filter configuration.
///
/// Every field is optional; an absent bound means unconstrained. Serializes
/// with the camelCase names the web client speaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Lower bound on the match score against the latest draw.
    pub points_min: Option<u8>,
    /// Upper bound on the match score against the latest draw.
    pub points_max: Option<u8>,
    /// Lower bound on the combination sum.
    pub sum_min: Option<u16>,
    /// Upper bound on the combination sum.
    pub sum_max: Option<u16>,
    /// Lower bound on the even-number count.
    pub even_min: Option<u8>,
    /// Upper bound on the even-number count.
    pub even_max: Option<u8>,
    /// Lower bound on the odd-number count.
    pub odd_min: Option<u8>,
    /// Upper bound on the odd-number count.
    pub odd_max: Option<u8>,
    /// Bounds on consecutive-run counts, one entry per run length.
    pub runs: Vec<RunBound>,
    /// Lower bound on row occupancy.
    pub row_min: Option<u8>,
    /// Upper bound on row occupancy.
    pub row_max: Option<u8>,
    /// Lower bound on column occupancy.
    pub column_min: Option<u8>,
    /// Upper bound on column occupancy.
    pub column_max: Option<u8>,
    /// Numbers every result must contain.
    pub required_numbers: Vec<u8>,
    /// Numbers no result may contain.
    pub excluded_numbers: Vec<u8>,
    /// Row patterns to match (or avoid, per `include_row_patterns`).
    pub selected_row_patterns: Vec<String>,
    /// When true, `row_pattern` must be one of the selected patterns;
    /// when false, none of them.
    pub include_row_patterns: bool,
    /// Column patterns to match (or avoid, per `include_column_patterns`).
    pub selected_column_patterns: Vec<String>,
    /// Membership direction for the selected column patterns.
    pub include_column_patterns: bool,
    /// Tri-state constraint on `was_drawn`.
    pub already_drawn: DrawnFilter,
    /// Legacy toggle kept for compatibility; true folds into
    /// `already_drawn = NotDrawn`.
    pub exclude_any_previously_drawn: bool,
    /// Zero-based page index.
    pub page: u32,
    /// Page size, 1..=[`MAX_PAGE_SIZE`].
    pub page_size: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            points_min: None,
            points_max: None,
            sum_min: None,
            sum_max: None,
            even_min: None,
            even_max: None,
            odd_min: None,
            odd_max: None,
            runs: Vec::new(),
            row_min: None,
            row_max: None,
            column_min: None,
            column_max: None,
            required_numbers: Vec::new(),
            excluded_numbers: Vec::new(),
            selected_row_patterns: Vec::new(),
            include_row_patterns: true,
            selected_column_patterns: Vec::new(),
            include_column_patterns: true,
            already_drawn: DrawnFilter::Any,
            exclude_any_previously_drawn: false,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of an ordered result set plus total-count metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    /// The records on this page, in result order.
    pub content: Vec<T>,
    /// Size of the full (unpaginated) result set.
    pub total_elements: u64,
    /// Number of pages at the requested page size.
    pub total_pages: u32,
    /// Zero-based index of this page.
    pub page: u32,
}

impl<T> PageResult<T> {
    /// Slices `items` into the requested page.
    ///
    /// A page past the end yields empty content with correct totals.
    /// `page_size` must be nonzero.
    pub fn paginate(items: Vec<T>, page: u32, page_size: u32) -> Self {
        debug_assert!(page_size > 0);
        let total_elements = items.len() as u64;
        let size = u64::from(page_size.max(1));
        let total_pages = total_elements.div_ceil(size) as u32;
        let start = u64::from(page) * size;

        let content = if start >= total_elements {
            Vec::new()
        } else {
            items
                .into_iter()
                .skip(start as usize)
                .take(size as usize)
                .collect()
        };

        Self {
            content,
            total_elements,
            total_pages,
            page,
        }
    }

    /// Maps the page content, keeping the totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page: self.page,
        }
    }
}
