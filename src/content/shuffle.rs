use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Hands out shuffle seeds, never repeating the previous session's seed.
#[derive(Debug, Default)]
pub struct SeedSequence {
    last: Option<u64>,
}

impl SeedSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_seed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u64 {
        let mut seed = rng.gen::<u64>();
        while Some(seed) == self.last {
            seed = rng.gen::<u64>();
        }
        self.last = Some(seed);
        seed
    }

    pub fn next_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StdRng {
        StdRng::seed_from_u64(self.next_seed(rng))
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

pub(crate) fn shuffled<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items
}

/// Answer choices for `pool[target_idx]`: the target plus up to `count - 1`
/// distractors taken in order after the target (wrapping), in random order.
///
/// Duplicate words in the pool are skipped so a round never offers the same
/// choice twice.
pub(crate) fn choices_with_distractors<R: Rng + ?Sized>(
    pool: &[String],
    target_idx: usize,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let target = &pool[target_idx];
    let mut choices = vec![target.clone()];
    let mut offset = 1;
    while choices.len() < count && offset < pool.len() {
        let candidate = &pool[(target_idx + offset) % pool.len()];
        if !choices.contains(candidate) {
            choices.push(candidate.clone());
        }
        offset += 1;
    }
    shuffled(choices, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn consecutive_seeds_differ() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seeds = SeedSequence::new();
        let mut previous = seeds.next_seed(&mut rng);
        for _ in 0..100 {
            let seed = seeds.next_seed(&mut rng);
            assert_ne!(seed, previous);
            previous = seed;
        }
        assert_eq!(seeds.last(), Some(previous));
    }

    #[test]
    fn distractors_include_target_once() {
        let pool = words(&["cat", "dog", "sun", "hat"]);
        let mut rng = StdRng::seed_from_u64(1);
        let choices = choices_with_distractors(&pool, 3, 3, &mut rng);
        assert_eq!(choices.len(), 3);
        assert_eq!(choices.iter().filter(|c| *c == "hat").count(), 1);
        let mut sorted = choices.clone();
        sorted.sort();
        assert_eq!(sorted, words(&["cat", "dog", "hat"]));
    }

    #[test]
    fn distractors_limited_by_pool() {
        let pool = words(&["cat", "dog"]);
        let mut rng = StdRng::seed_from_u64(1);
        let choices = choices_with_distractors(&pool, 0, 5, &mut rng);
        assert_eq!(choices.len(), 2);
    }

    #[test]
    fn duplicate_pool_entries_are_skipped() {
        let pool = words(&["cat", "cat", "dog"]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut choices = choices_with_distractors(&pool, 0, 3, &mut rng);
        choices.sort();
        assert_eq!(choices, words(&["cat", "dog"]));
    }

    #[test]
    fn shuffled_keeps_elements() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut out = shuffled(vec![1, 2, 3, 4, 5], &mut rng);
        out.sort();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }
}
