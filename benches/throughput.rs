use criterion::{Criterion, criterion_group, criterion_main};

use lotofiltro::{
    combo::NumberSet,
    core::{
        history::{Draw, DrawHistory, ScoreTable},
        indices::Bounds,
        store::{ComboStore, StaticPredicates},
    },
    universe,
};

fn bench_store_build(c: &mut Criterion) {
    c.bench_function("store_build_20_15", |b| {
        b.iter(|| {
            let store = ComboStore::new(universe::enumerate(20, 15));
            assert_eq!(store.len(), 15_504);
        });
    });
}

fn bench_bounded_query(c: &mut Criterion) {
    let store = ComboStore::new(universe::enumerate(20, 15));

    let preds = StaticPredicates {
        sum: Bounds::new(Some(140), Some(170)),
        even: Bounds::new(Some(7), Some(8)),
        required: NumberSet::from_numbers(&[3, 7]).expect("required"),
        excluded: NumberSet::from_numbers(&[20]).expect("excluded"),
        ..StaticPredicates::default()
    };

    c.bench_function("query_by_bounds_20_15", |b| {
        b.iter(|| {
            let ids = store.query_by_bounds(&preds);
            assert!(!ids.is_empty());
        });
    });
}

fn bench_score_recompute(c: &mut Criterion) {
    let store = ComboStore::new(universe::enumerate(20, 15));
    let draw = Draw {
        contest_number: 1,
        date: chrono::NaiveDate::from_ymd_opt(2025, 1, 4).expect("date"),
        numbers: NumberSet::from_numbers(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15])
            .expect("numbers"),
    };
    let history = DrawHistory::from_draws(vec![draw]).expect("history");

    c.bench_function("score_table_recompute_20_15", |b| {
        b.iter(|| {
            let table = ScoreTable::compute(&store, &history);
            assert_eq!(table.latest_contest(), Some(1));
        });
    });
}

criterion_group!(
    benches,
    bench_store_build,
    bench_bounded_query,
    bench_score_recompute
);
criterion_main!(benches);
