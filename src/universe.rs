//! Deterministic materialization of the combination universe.

use crate::{
    combo::{Combination, NumberSet},
    types::{ComboId, PICK_SIZE, POOL_SIZE},
};

/// Row count of the full 15-of-25 universe, C(25,15).
pub const FULL_UNIVERSE_LEN: usize = 3_268_760;

/// Enumerates every 15-of-25 combination in lexicographic order.
///
/// Ids are sequential starting at 1 and stable across runs, so a regenerated
/// universe is identical to the one any persisted reference was created
/// against.
pub fn full_universe() -> Vec<Combination> {
    enumerate(POOL_SIZE, PICK_SIZE)
}

/// Enumerates every `pick`-element combination over the numbers 1..=`pool`,
/// in lexicographic order, with ids from 1.
///
/// The full universe uses (25, 15); tests use smaller shapes.
pub fn enumerate(pool: u8, pick: u8) -> Vec<Combination> {
    assert!(pick >= 1 && pick <= pool && pool <= POOL_SIZE);

    let pick_n = usize::from(pick);
    let mut current: Vec<u8> = (1..=pick).collect();
    let mut out = Vec::new();
    let mut id: ComboId = 1;

    loop {
        let mut numbers = NumberSet::empty();
        for &n in &current {
            numbers.insert(n);
        }
        out.push(Combination::new(id, numbers));
        id += 1;

        // Advance to the next lexicographic selection, if any.
        let mut i = pick_n;
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            if current[i] < pool - (pick - 1 - i as u8) {
                break;
            }
        }
        current[i] += 1;
        for j in i + 1..pick_n {
            current[j] = current[j - 1] + 1;
        }
    }
}

/// Materializes a universe from explicit number sets, ids assigned from 1 in
/// input order.
pub fn from_sets<I>(sets: I) -> Vec<Combination>
where
    I: IntoIterator<Item = NumberSet>,
{
    sets.into_iter()
        .enumerate()
        .map(|(i, numbers)| Combination::new(i as ComboId + 1, numbers))
        .collect()
}
