// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples with a SEEDED rng and splits them into a
// training and a validation set. The seed is part of the run
// configuration: the same seed over the same samples always
// produces the same split, which the reproducibility tests
// depend on.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// `train_fraction` is the proportion kept for training,
/// e.g. 0.9 keeps 90%.
pub fn split_train_val<T>(
    mut samples: Vec<T>,
    train_fraction: f64,
    seed: u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val) = split_train_val(items, 0.8, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (mut train, val) = split_train_val(items, 0.7, 42);
        train.extend(val);
        train.sort();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let (t1, v1) = split_train_val((0..100).collect::<Vec<_>>(), 0.8, 7);
        let (t2, v2) = split_train_val((0..100).collect::<Vec<_>>(), 0.8, 7);
        assert_eq!(t1, t2);
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_different_seed_different_order() {
        let (t1, _) = split_train_val((0..100).collect::<Vec<_>>(), 0.8, 1);
        let (t2, _) = split_train_val((0..100).collect::<Vec<_>>(), 0.8, 2);
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val) = split_train_val(items, 0.8, 42);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val) = split_train_val(items, 1.0, 42);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
