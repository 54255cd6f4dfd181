use rand::Rng;
use rand::seq::SliceRandom;

/// Uniform in-place shuffle (Fisher–Yates).
///
/// `SliceRandom::shuffle` walks from the last index down to 1 and swaps each
/// slot with one drawn uniformly from `0..=i`, so every permutation is
/// equally likely. Pass a seeded RNG for reproducible orders.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_handles_trivial_slices() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = Vec::new();
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut single = vec![9];
        shuffle(&mut single, &mut rng);
        assert_eq!(single, vec![9]);
    }

    #[test]
    fn same_seed_gives_same_order() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut StdRng::seed_from_u64(42));
        shuffle(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn matches_slice_shuffle_for_same_seed() {
        let mut ours: Vec<u32> = (0..20).collect();
        let mut theirs = ours.clone();
        shuffle(&mut ours, &mut StdRng::seed_from_u64(5));
        theirs.shuffle(&mut StdRng::seed_from_u64(5));
        assert_eq!(ours, theirs);
    }

    #[test]
    fn permutations_are_uniform() {
        // 6 permutations of 3 items; chi-square with 5 degrees of freedom.
        const TRIALS: usize = 60_000;
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
        for _ in 0..TRIALS {
            let mut items = [0_u8, 1, 2];
            shuffle(&mut items, &mut rng);
            *counts.entry(items).or_default() += 1;
        }

        assert_eq!(counts.len(), 6);
        #[allow(clippy::cast_precision_loss)]
        let expected = TRIALS as f64 / 6.0;
        let chi_square: f64 = counts
            .values()
            .map(|&observed| {
                #[allow(clippy::cast_precision_loss)]
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // p = 0.001 critical value for 5 dof is 20.52.
        assert!(chi_square < 20.52, "chi-square {chi_square} too large");
    }
}
