use chrono::NaiveDate;

use lotofiltro::{
    combo::NumberSet,
    core::{
        history::{Draw, HistoryError},
        store::ComboStore,
    },
    engine::FilterEngine,
    filter::{FilterError, FilterSpec, RunBound},
    types::{ComboId, DrawnFilter},
    universe,
};

fn small_engine() -> FilterEngine {
    FilterEngine::new(ComboStore::new(universe::enumerate(9, 5)))
}

fn set(numbers: &[u8]) -> NumberSet {
    NumberSet::from_numbers(numbers).expect("numbers")
}

fn draw(contest_number: u32, numbers: &[u8]) -> Draw {
    Draw {
        contest_number,
        date: NaiveDate::from_ymd_opt(2025, 4, 12).expect("date"),
        numbers: set(numbers),
    }
}

/// Five hand-picked 15-number rows; ids follow input order.
fn pick15_engine() -> FilterEngine {
    let sets = [
        set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
        set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 16]),
        set(&[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]),
        set(&[2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]),
        set(&[1, 2, 3, 4, 5, 7, 9, 11, 13, 15, 17, 19, 21, 23, 25]),
    ];
    FilterEngine::new(ComboStore::new(universe::from_sets(sets)))
}

fn result_ids(engine: &FilterEngine, spec: &FilterSpec) -> Vec<ComboId> {
    engine
        .search(spec)
        .expect("valid spec")
        .content
        .iter()
        .map(|view| view.id)
        .collect()
}

fn invalid_field(engine: &FilterEngine, spec: &FilterSpec) -> &'static str {
    match engine.search(spec) {
        Err(FilterError::InvalidField { field, .. }) => field,
        other => panic!("expected InvalidField, got {other:?}"),
    }
}

#[test]
fn validation_names_the_offending_field() {
    let engine = small_engine();

    let spec = FilterSpec {
        even_min: Some(16),
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "evenMin");

    let spec = FilterSpec {
        sum_min: Some(100),
        sum_max: Some(50),
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "sumMin");

    let spec = FilterSpec {
        page_size: 0,
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "pageSize");

    let spec = FilterSpec {
        page_size: 500,
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "pageSize");

    let spec = FilterSpec {
        runs: vec![
            RunBound {
                length: 2,
                min: Some(1),
                max: None,
            },
            RunBound {
                length: 2,
                min: None,
                max: Some(3),
            },
        ],
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "runs");

    let spec = FilterSpec {
        runs: vec![RunBound {
            length: 9,
            min: Some(1),
            max: None,
        }],
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "runs");

    let spec = FilterSpec {
        selected_row_patterns: vec!["5550".to_string()],
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "selectedRowPatterns");

    let spec = FilterSpec {
        required_numbers: vec![26],
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "requiredNumbers");

    let spec = FilterSpec {
        already_drawn: DrawnFilter::Drawn,
        exclude_any_previously_drawn: true,
        ..FilterSpec::default()
    };
    assert_eq!(invalid_field(&engine, &spec), "excludeAnyPreviouslyDrawn");
}

#[test]
fn overlapping_required_and_excluded_sets_are_rejected() {
    let engine = small_engine();
    let spec = FilterSpec {
        required_numbers: vec![1, 2, 3],
        excluded_numbers: vec![3, 4],
        ..FilterSpec::default()
    };
    assert_eq!(
        engine.search(&spec),
        Err(FilterError::RequiredExcludedOverlap { number: 3 })
    );
}

#[test]
fn pagination_slices_the_same_ordered_candidate_set() {
    let engine = small_engine();

    let unpaginated = result_ids(
        &engine,
        &FilterSpec {
            page_size: 200,
            ..FilterSpec::default()
        },
    );
    assert_eq!(unpaginated.len(), 126);

    let page0 = engine
        .search(&FilterSpec {
            page_size: 10,
            ..FilterSpec::default()
        })
        .expect("page 0");
    let page1 = engine
        .search(&FilterSpec {
            page: 1,
            page_size: 10,
            ..FilterSpec::default()
        })
        .expect("page 1");

    assert_eq!(page0.total_elements, 126);
    assert_eq!(page0.total_pages, 13);
    assert_eq!(page1.page, 1);

    let mut joined: Vec<ComboId> = page0.content.iter().map(|v| v.id).collect();
    joined.extend(page1.content.iter().map(|v| v.id));
    assert_eq!(joined, unpaginated[..20].to_vec());

    let disjoint: Vec<ComboId> = page1
        .content
        .iter()
        .map(|v| v.id)
        .filter(|id| page0.content.iter().any(|v| v.id == *id))
        .collect();
    assert!(disjoint.is_empty());
}

#[test]
fn page_past_the_end_keeps_totals() {
    let engine = small_engine();
    let page = engine
        .search(&FilterSpec {
            page: 50,
            page_size: 10,
            ..FilterSpec::default()
        })
        .expect("valid spec");

    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 126);
    assert_eq!(page.total_pages, 13);
    assert_eq!(page.page, 50);
}

#[test]
fn points_filter_against_empty_history_uses_zero_scores() {
    let engine = small_engine();

    let none = result_ids(
        &engine,
        &FilterSpec {
            points_min: Some(1),
            ..FilterSpec::default()
        },
    );
    assert!(none.is_empty());

    let all = result_ids(
        &engine,
        &FilterSpec {
            points_max: Some(0),
            page_size: 200,
            ..FilterSpec::default()
        },
    );
    assert_eq!(all.len(), 126);
}

#[test]
fn drawn_tri_state_tracks_recorded_draws() {
    let mut engine = pick15_engine();
    engine
        .record_draw(draw(1000, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]))
        .expect("record");

    let drawn_spec = FilterSpec {
        already_drawn: DrawnFilter::Drawn,
        ..FilterSpec::default()
    };
    assert_eq!(result_ids(&engine, &drawn_spec), vec![1]);

    let not_drawn_spec = FilterSpec {
        already_drawn: DrawnFilter::NotDrawn,
        ..FilterSpec::default()
    };
    assert_eq!(result_ids(&engine, &not_drawn_spec), vec![2, 3, 4, 5]);

    // The legacy toggle folds into the same constraint.
    let legacy_spec = FilterSpec {
        exclude_any_previously_drawn: true,
        ..FilterSpec::default()
    };
    assert_eq!(result_ids(&engine, &legacy_spec), vec![2, 3, 4, 5]);

    engine.purge_draws();
    assert_eq!(result_ids(&engine, &not_drawn_spec), vec![1, 2, 3, 4, 5]);
    assert!(result_ids(&engine, &drawn_spec).is_empty());
}

#[test]
fn match_scores_follow_the_latest_draw() {
    let mut engine = pick15_engine();
    engine
        .record_draw(draw(1000, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]))
        .expect("record");

    // Intersections against row 1: 15, 14, 5, 14, 10.
    let high = FilterSpec {
        points_min: Some(14),
        ..FilterSpec::default()
    };
    assert_eq!(result_ids(&engine, &high), vec![1, 2, 4]);

    let low = FilterSpec {
        points_max: Some(10),
        ..FilterSpec::default()
    };
    assert_eq!(result_ids(&engine, &low), vec![3, 5]);

    // A newer contest becomes the score reference; removing it restores the
    // previous one.
    engine
        .record_draw(draw(
            1001,
            &[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25],
        ))
        .expect("record second");
    let perfect = FilterSpec {
        points_min: Some(15),
        ..FilterSpec::default()
    };
    assert_eq!(result_ids(&engine, &perfect), vec![3]);

    engine.remove_draw(1001).expect("remove");
    assert_eq!(result_ids(&engine, &perfect), vec![1]);
}

#[test]
fn history_conflicts_and_invalid_draws_leave_scores_untouched() {
    let mut engine = pick15_engine();
    engine
        .record_draw(draw(1000, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]))
        .expect("record");

    let dup = engine.record_draw(draw(
        1000,
        &[11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25],
    ));
    assert_eq!(dup, Err(HistoryError::DuplicateContest(1000)));

    let short = engine.record_draw(draw(1001, &[1, 2, 3]));
    assert!(matches!(short, Err(HistoryError::InvalidDraw { .. })));

    let missing = engine.remove_draw(9999);
    assert_eq!(missing, Err(HistoryError::MissingContest(9999)));

    // Scores still reflect the only accepted draw.
    let perfect = FilterSpec {
        points_min: Some(15),
        ..FilterSpec::default()
    };
    assert_eq!(result_ids(&engine, &perfect), vec![1]);
}

#[test]
fn runs_and_pattern_predicates_compose_with_paging() {
    let engine = small_engine();

    // Every selection with at least one run of exactly two consecutive
    // numbers, verified against a full scan.
    let spec = FilterSpec {
        runs: vec![RunBound {
            length: 2,
            min: Some(1),
            max: None,
        }],
        page_size: 200,
        ..FilterSpec::default()
    };
    let ids = result_ids(&engine, &spec);
    let expected: Vec<ComboId> = engine
        .store()
        .records()
        .iter()
        .filter(|rec| rec.run_count(2) >= 1)
        .map(|rec| rec.id)
        .collect();
    assert_eq!(ids, expected);
}
