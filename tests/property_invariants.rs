use proptest::prelude::*;

use lotofiltro::{
    combo::NumberSet,
    core::{
        indices::Bounds,
        store::{ComboStore, StaticPredicates},
    },
    engine::FilterEngine,
    filter::{FilterSpec, RunBound},
    types::ComboId,
    universe,
};

fn opt_bound(max: u8) -> impl Strategy<Value = Option<u8>> {
    prop::option::of(0..=max)
}

fn number_set(pool: u8) -> impl Strategy<Value = NumberSet> {
    prop::collection::btree_set(1..=pool, 0..3).prop_map(|numbers| {
        let mut set = NumberSet::empty();
        for n in numbers {
            set.insert(n);
        }
        set
    })
}

fn predicates() -> impl Strategy<Value = StaticPredicates> {
    (
        prop::option::of(0u16..=40),
        prop::option::of(0u16..=40),
        opt_bound(5),
        opt_bound(5),
        opt_bound(2),
        opt_bound(5),
        number_set(8),
        number_set(8),
    )
        .prop_map(
            |(sum_min, sum_max, even_min, odd_max, run2_min, row_max, required, excluded)| {
                let mut runs = [Bounds::default(); 7];
                runs[0] = Bounds::new(run2_min, None);
                StaticPredicates {
                    sum: Bounds::new(sum_min, sum_max),
                    even: Bounds::new(even_min, None),
                    odd: Bounds::new(None, odd_max),
                    runs,
                    row_occupancy: Bounds::new(None, row_max),
                    required,
                    excluded,
                    ..StaticPredicates::default()
                }
            },
        )
}

fn full_scan(store: &ComboStore, preds: &StaticPredicates) -> Vec<ComboId> {
    store
        .records()
        .iter()
        .filter(|rec| preds.matches(rec))
        .map(|rec| rec.id)
        .collect()
}

proptest! {
    #[test]
    fn index_query_matches_full_scan(preds in predicates()) {
        let store = ComboStore::new(universe::enumerate(8, 4));

        let ids = store.query_by_bounds(&preds);
        prop_assert_eq!(&ids, &full_scan(&store, &preds));
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn page_concatenation_equals_unpaginated_prefix(
        page_size in 1u32..=20,
        pages in 1u32..=4,
        sum_lo in 0u16..=30,
    ) {
        let engine = FilterEngine::new(ComboStore::new(universe::enumerate(8, 4)));
        let base = FilterSpec {
            sum_min: Some(sum_lo),
            ..FilterSpec::default()
        };

        let unpaginated = engine
            .search(&FilterSpec { page_size: 200, ..base.clone() })
            .expect("unpaginated");
        let all_ids: Vec<ComboId> = unpaginated.content.iter().map(|v| v.id).collect();
        prop_assert_eq!(unpaginated.total_elements as usize, all_ids.len());

        let mut joined = Vec::new();
        for page in 0..pages {
            let result = engine
                .search(&FilterSpec { page, page_size, ..base.clone() })
                .expect("page");
            prop_assert_eq!(result.total_elements, unpaginated.total_elements);
            joined.extend(result.content.iter().map(|v| v.id));
        }

        let want = (pages * page_size) as usize;
        let prefix: Vec<ComboId> = all_ids.iter().copied().take(want).collect();
        prop_assert_eq!(joined, prefix);
    }

    #[test]
    fn filter_spec_round_trips_through_json(
        sum_min in prop::option::of(0u16..=270),
        even_max in opt_bound(15),
        run2 in opt_bound(7),
        page in 0u32..=10,
        required in prop::collection::vec(1u8..=25, 0..4),
        pattern in "[0-5]{5}",
    ) {
        let spec = FilterSpec {
            sum_min,
            even_max,
            runs: vec![RunBound { length: 2, min: run2, max: None }],
            required_numbers: required,
            selected_row_patterns: vec![pattern],
            include_row_patterns: false,
            page,
            ..FilterSpec::default()
        };

        let json = serde_json::to_string(&spec).expect("encode");
        let back: FilterSpec = serde_json::from_str(&json).expect("decode");
        prop_assert_eq!(back, spec);
    }
}
