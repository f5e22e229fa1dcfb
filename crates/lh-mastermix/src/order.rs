//! Walk orderings for the greedy assignment.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::keys::ReagentKey;

/// Source of reordered walks for retry attempts.
pub trait WalkOrder {
    /// Reorder `keys` for the attempt identified by `seed`.
    fn arrange(&mut self, seed: u64, keys: &mut [ReagentKey]);
}

/// Seeded uniform shuffle. The same seed always yields the same order.
#[derive(Clone, Debug, Default)]
pub struct SeededShuffle;

impl WalkOrder for SeededShuffle {
    fn arrange(&mut self, seed: u64, keys: &mut [ReagentKey]) {
        let mut rng = StdRng::seed_from_u64(seed);
        keys.shuffle(&mut rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<ReagentKey> {
        (0..20).map(|i| ReagentKey::new(format!("R{i}"), i as f64)).collect()
    }

    #[test]
    fn shuffle_is_reproducible() {
        let mut a = keys();
        let mut b = keys();
        SeededShuffle.arrange(7, &mut a);
        SeededShuffle.arrange(7, &mut b);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_by(|x, y| x.volume().total_cmp(&y.volume()));
        assert_eq!(sorted, keys());
    }
}
