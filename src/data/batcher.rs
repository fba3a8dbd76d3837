// ============================================================
// Layer 4 — Pair Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<PairSample>
// into tensors for one forward pass.
//
//   Input:  N PairSamples, each with exactly `seq_len` token ids
//   Output: PairBatch with
//             tokens      [N, seq_len]  (Int)
//             similarity  [N]           (Float)
//             lengths     [N]           (Int)
//
// The declared sequence width is a hard contract: a sample with
// a different token count means the dataset was encoded for the
// other model variant (or with a different sequence_length), and
// the batcher fails immediately instead of silently truncating
// or padding.
//
// The raw label values are carried alongside the tensor so the
// step executor can compute exact batch statistics without a
// device round-trip.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::PairSample;

// ─── PairBatch ────────────────────────────────────────────────────────────────
/// A batch of labelled pairs ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// Token id sequences — shape: [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Ground-truth similarity scores — shape: [batch_size]
    pub similarity: Tensor<B, 1>,

    /// True (unpadded) sequence lengths — shape: [batch_size]
    pub lengths: Tensor<B, 1, Int>,

    /// The same labels as `similarity`, host-side
    pub raw_similarity: Vec<f32>,
}

// ─── PairBatcher ──────────────────────────────────────────────────────────────
/// Stacks samples into batches, checking the declared width.
#[derive(Clone, Debug)]
pub struct PairBatcher {
    /// Token count every sample must have
    seq_len: usize,
}

impl PairBatcher {
    pub fn new(seq_len: usize) -> Self {
        Self { seq_len }
    }
}

impl<B: Backend> Batcher<B, PairSample, PairBatch<B>> for PairBatcher {
    fn batch(&self, items: Vec<PairSample>, device: &B::Device) -> PairBatch<B> {
        let batch_size = items.len();

        // Shape contract: every sample matches the declared width.
        for item in &items {
            assert_eq!(
                item.tokens.len(),
                self.seq_len,
                "sample has {} tokens but the model expects {}",
                item.tokens.len(),
                self.seq_len,
            );
        }

        let token_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.tokens.iter().map(|&t| t as i32))
            .collect();

        let labels: Vec<f32> = items.iter().map(|s| s.similarity).collect();
        let lengths: Vec<i32> = items.iter().map(|s| s.length as i32).collect();

        let tokens = Tensor::<B, 1, Int>::from_ints(token_flat.as_slice(), device)
            .reshape([batch_size, self.seq_len]);

        let similarity = Tensor::<B, 1>::from_floats(labels.as_slice(), device);
        let lengths    = Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), device);

        PairBatch {
            tokens,
            similarity,
            lengths,
            raw_similarity: labels,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn sample(tokens: Vec<u32>, similarity: f32) -> PairSample {
        let length = tokens.len();
        PairSample { tokens, length, similarity }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = PairBatcher::new(4);
        let device  = Default::default();
        let batch: PairBatch<TestBackend> = batcher.batch(
            vec![sample(vec![3, 4, 5, 0], 0.8), sample(vec![6, 7, 0, 0], 0.2)],
            &device,
        );
        assert_eq!(batch.tokens.dims(), [2, 4]);
        assert_eq!(batch.similarity.dims(), [2]);
        assert_eq!(batch.lengths.dims(), [2]);
        assert_eq!(batch.raw_similarity, vec![0.8, 0.2]);
    }

    #[test]
    #[should_panic(expected = "expects 4")]
    fn test_wrong_width_fails() {
        let batcher = PairBatcher::new(4);
        let device  = Default::default();
        // 3 tokens against a declared width of 4: must fail, never pad
        let _: PairBatch<TestBackend> =
            batcher.batch(vec![sample(vec![3, 4, 5], 0.5)], &device);
    }
}
