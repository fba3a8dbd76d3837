// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples and splits them into a training set (used to
// update weights) and a validation set (used to measure how the
// model does on pairs it has never seen).
//
// Pair files are usually grouped by source sentence, so the
// shuffle matters: without it the validation set would hold one
// topic only.
//
// Reference: rand crate documentation (SliceRandom)

use rand::seq::SliceRandom;

/// Shuffle `samples` and split into (train, validation).
///
/// `train_fraction` is the proportion kept for training,
/// e.g. 0.8 keeps 80% for training and 20% for validation.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let mut rng = rand::thread_rng();
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

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
        let items: Vec<usize> = (0..200).collect();
        let (train, val)      = split_train_val(items, 0.9);
        assert_eq!(train.len(), 180);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..37).collect();
        let (mut train, val)  = split_train_val(items, 0.6);
        train.extend(val);
        train.sort_unstable();
        assert_eq!(train, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.8);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 1.0);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
