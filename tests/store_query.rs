use hashbrown::HashSet;

use lotofiltro::{
    combo::NumberSet,
    core::{
        indices::Bounds,
        store::{ComboStore, PatternFilter, StaticPredicates, StoreError},
    },
    types::ComboId,
    universe,
};

fn numbers_of(store: &ComboStore, id: ComboId) -> Vec<u8> {
    store.get(id).expect("id").numbers.iter().collect()
}

fn full_scan(store: &ComboStore, preds: &StaticPredicates) -> Vec<ComboId> {
    store
        .records()
        .iter()
        .filter(|rec| preds.matches(rec))
        .map(|rec| rec.id)
        .collect()
}

#[test]
fn sum_and_odd_bounds_narrow_conjunctively() {
    // The 3-of-5 universe: ten combinations.
    let store = ComboStore::new(universe::enumerate(5, 3));
    assert_eq!(store.len(), 10);

    let preds = StaticPredicates {
        sum: Bounds::new(Some(9), None),
        odd: Bounds::new(Some(2), None),
        ..StaticPredicates::default()
    };
    let ids = store.query_by_bounds(&preds);
    let results: Vec<Vec<u8>> = ids.iter().map(|&id| numbers_of(&store, id)).collect();

    // {1,3,5} passes both predicates; {2,3,4} has sum 9 but only one odd.
    assert!(results.contains(&vec![1, 3, 5]));
    assert!(!results.contains(&vec![2, 3, 4]));
    for numbers in &results {
        let sum: u8 = numbers.iter().sum();
        let odd = numbers.iter().filter(|n| *n % 2 == 1).count();
        assert!(sum >= 9);
        assert!(odd >= 2);
    }
    assert_eq!(ids, full_scan(&store, &preds));
}

#[test]
fn required_numbers_yield_only_supersets() {
    let store = ComboStore::new(universe::enumerate(5, 3));
    let preds = StaticPredicates {
        required: NumberSet::from_numbers(&[1, 2]).expect("required"),
        ..StaticPredicates::default()
    };

    let ids = store.query_by_bounds(&preds);
    let results: Vec<Vec<u8>> = ids.iter().map(|&id| numbers_of(&store, id)).collect();
    assert_eq!(results, vec![vec![1, 2, 3], vec![1, 2, 4], vec![1, 2, 5]]);
}

#[test]
fn excluded_numbers_yield_only_disjoint_results() {
    let store = ComboStore::new(universe::enumerate(5, 3));
    let preds = StaticPredicates {
        excluded: NumberSet::from_numbers(&[1]).expect("excluded"),
        ..StaticPredicates::default()
    };

    let ids = store.query_by_bounds(&preds);
    assert_eq!(ids.len(), 4); // C(4,3) without number 1
    for id in ids {
        assert!(!numbers_of(&store, id).contains(&1));
    }
}

#[test]
fn pattern_filters_use_set_membership() {
    let store = ComboStore::new(universe::enumerate(5, 3));

    // Numbers 1..=5 all sit in grid row 1; their columns are distinct, so the
    // column pattern "11100" pins the selection {1,2,3} exactly.
    let include = StaticPredicates {
        column_patterns: Some(PatternFilter {
            patterns: HashSet::from_iter(["11100".to_string()]),
            include: true,
        }),
        ..StaticPredicates::default()
    };
    let ids = store.query_by_bounds(&include);
    assert_eq!(ids.len(), 1);
    assert_eq!(numbers_of(&store, ids[0]), vec![1, 2, 3]);

    let exclude = StaticPredicates {
        column_patterns: Some(PatternFilter {
            patterns: HashSet::from_iter(["11100".to_string()]),
            include: false,
        }),
        ..StaticPredicates::default()
    };
    assert_eq!(store.query_by_bounds(&exclude).len(), 9);
}

#[test]
fn index_query_agrees_with_full_scan_across_predicate_kinds() {
    let store = ComboStore::new(universe::enumerate(9, 5));
    assert_eq!(store.len(), 126);

    let cases = vec![
        StaticPredicates {
            sum: Bounds::new(Some(20), Some(30)),
            ..StaticPredicates::default()
        },
        StaticPredicates {
            even: Bounds::new(Some(2), Some(3)),
            odd: Bounds::new(None, Some(3)),
            ..StaticPredicates::default()
        },
        StaticPredicates {
            runs: {
                let mut runs = [Bounds::default(); 7];
                runs[0] = Bounds::new(Some(1), Some(2)); // runs of length 2
                runs
            },
            ..StaticPredicates::default()
        },
        StaticPredicates {
            row_occupancy: Bounds::new(Some(2), Some(2)),
            required: NumberSet::from_numbers(&[4]).expect("required"),
            excluded: NumberSet::from_numbers(&[9]).expect("excluded"),
            ..StaticPredicates::default()
        },
    ];

    for preds in cases {
        let ids = store.query_by_bounds(&preds);
        assert_eq!(ids, full_scan(&store, &preds), "preds {preds:?}");
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ascending id order");
    }
}

#[test]
fn impossible_bounds_short_circuit_to_empty() {
    let store = ComboStore::new(universe::enumerate(5, 3));
    let preds = StaticPredicates {
        sum: Bounds::new(Some(100), None),
        ..StaticPredicates::default()
    };
    assert!(store.query_by_bounds(&preds).is_empty());
}

#[test]
fn get_reports_missing_ids() {
    let store = ComboStore::new(universe::enumerate(5, 3));
    assert!(store.get(1).is_ok());
    assert_eq!(store.get(999), Err(StoreError::MissingCombo(999)));
}
