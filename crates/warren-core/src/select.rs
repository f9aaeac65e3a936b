// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Weighted candidate selection.
//!
//! A rule matched at K sites contributes K candidates carrying the same
//! weight, so its aggregate probability scales with both its declared weight
//! and its number of match sites.
use crate::prng::Prng;
use crate::search::Candidate;

/// Weight as seen by the selector: non-finite or non-positive weights count as 0.
fn effective(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Draws an index with probability proportional to `weight(item)`.
///
/// Draws `u` uniformly from `[0, total)` and walks the list subtracting each
/// weight until the remainder is `<= 0`. When every weight is zero the draw
/// falls back to a uniform index. Returns `None` only for an empty slice.
pub fn pick_weighted<T, F>(items: &[T], weight: F, rng: &mut Prng) -> Option<usize>
where
    F: Fn(&T) -> f64,
{
    if items.is_empty() {
        return None;
    }
    let total: f64 = items.iter().map(|item| effective(weight(item))).sum();
    if total <= 0.0 || !total.is_finite() {
        return Some(rng.next_index(items.len()));
    }

    let mut remainder = rng.next_f64() * total;
    let mut last_positive = 0;
    for (index, item) in items.iter().enumerate() {
        let w = effective(weight(item));
        if w == 0.0 {
            continue;
        }
        last_positive = index;
        remainder -= w;
        if remainder <= 0.0 {
            return Some(index);
        }
    }
    // Rounding can leave a sliver of remainder after the final subtraction.
    Some(last_positive)
}

/// Picks one candidate, weighted by its rule's weight.
pub fn select<'a, 'r>(candidates: &'a [Candidate<'r>], rng: &mut Prng) -> Option<&'a Candidate<'r>> {
    pick_weighted(candidates, |c| c.weight(), rng).map(|i| &candidates[i])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_slice_yields_none() {
        let mut rng = Prng::from_seed_u64(0);
        assert_eq!(pick_weighted::<f64, _>(&[], |w| *w, &mut rng), None);
    }

    #[test]
    fn zero_weights_are_never_drawn_when_others_exist() {
        let mut rng = Prng::from_seed_u64(3);
        let weights = [0.0, 2.0, f64::NAN, -1.0, 1.0];
        for _ in 0..2_000 {
            let i = pick_weighted(&weights, |w| *w, &mut rng).unwrap();
            assert!(i == 1 || i == 4, "drew index {i}");
        }
    }

    #[test]
    fn all_zero_weights_fall_back_to_uniform() {
        let mut rng = Prng::from_seed_u64(5);
        let weights = [0.0; 4];
        let mut seen = [false; 4];
        for _ in 0..400 {
            seen[pick_weighted(&weights, |w| *w, &mut rng).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn weighted_groups_converge_to_their_share() {
        let mut weights = vec![3.0; 1000];
        weights.extend(std::iter::repeat(1.0).take(1000));
        let mut rng = Prng::from_seed_u64(0x5eed);
        let trials: u32 = 20_000;
        let heavy = (0..trials)
            .filter(|_| pick_weighted(&weights, |w| *w, &mut rng).unwrap() < 1000)
            .count();
        let share = heavy as f64 / f64::from(trials);
        assert!((share - 0.75).abs() < 0.02, "share {share}");
    }
}
