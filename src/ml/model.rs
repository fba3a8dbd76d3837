// ============================================================
// Layer 5 — Base Similarity Model
// ============================================================
// The plain variant: embedding lookup → (Bi)LSTM encoder →
// two dense+dropout blocks → scalar relatedness score.
//
// Input shape contract: [batch, 2*sequence_length + 1] — the
// two sentences sit in fixed half-windows joined by a [SEP]
// token, and the whole padded width is always encoded.
//
// The dense stack is deliberately NOT configurable: width 128
// and drop probability 0.2 are fixed, matching the published
// architecture. Everything about the encoder (depth, width,
// dropout, bidirectionality) is config-driven.
//
// This module also defines the SimilarityScorer trait: the
// graph-construction strategy the shared step executor is
// parameterized over. Both variants implement it; neither
// inherits step logic from the other.
//
// Reference: Mueller & Thyagarajan (2016) siamese LSTM similarity
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, Linear, LinearConfig},
    prelude::*,
};

use crate::data::batcher::PairBatch;

/// Width of the two fixed dense blocks after the encoder.
pub const DENSE_WIDTH: usize = 128;

/// Drop probability of the fixed dense blocks (keep prob 0.8).
pub const DENSE_DROPOUT: f64 = 0.2;

// ─── ModelConfig ──────────────────────────────────────────────────────────────
// Hyperparameters shared by both variants. Immutable for the
// lifetime of the model.
#[derive(Config, Debug)]
pub struct ModelConfig {
    pub vocab_size:      usize,
    pub embedding_dim:   usize,
    pub sequence_length: usize,
    pub hidden_units:    usize,

    #[config(default = 1)]
    pub rnn_layers: usize,

    #[config(default = 0.0)]
    pub dropout: f64,

    #[config(default = false)]
    pub bidirectional: bool,

    #[config(default = 0.0)]
    pub l2_reg_beta: f64,

    #[config(default = 64)]
    pub batch_size: usize,

    #[config(default = 3)]
    pub num_hops: usize,
}

// ─── Scoring contract ─────────────────────────────────────────────────────────
/// What one forward pass produces. The attention fields are
/// empty for the base variant; the attention variant fills one
/// distribution per hop and the full memory history (seed plus
/// one state per hop) for introspection.
#[derive(Debug)]
pub struct ScoreOutput<B: Backend> {
    /// Predicted similarity, shape [batch]
    pub score: Tensor<B, 1>,

    /// One attention distribution per hop, each [batch, seq]
    pub attentions: Vec<Tensor<B, 2>>,

    /// Memory history: seed plus one state per hop, each [batch, hidden]
    pub memories: Vec<Tensor<B, 2>>,
}

impl<B: Backend> ScoreOutput<B> {
    /// Output of a variant without attention introspection.
    pub fn plain(score: Tensor<B, 1>) -> Self {
        Self {
            score,
            attentions: Vec::new(),
            memories:   Vec::new(),
        }
    }
}

/// Graph-construction strategy the step executor runs. Each
/// variant supplies its own scoring graph; the train/evaluate
/// step logic itself is shared and lives in the step executor.
pub trait SimilarityScorer<B: Backend>: Module<B> {
    /// Token width every batch must have.
    fn expected_seq_len(&self) -> usize;

    /// One forward pass over a batch.
    fn score(&self, batch: &PairBatch<B>) -> ScoreOutput<B>;

    /// Sum of squared dense weights, for L2 regularization.
    fn l2_penalty(&self) -> Tensor<B, 1>;
}

// ─── SimilarityModel ──────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SimilarityModel<B: Backend> {
    embedding: Embedding<B>,
    encoder:   crate::ml::encoder::LstmEncoder<B>,
    dense1:    Linear<B>,
    dense2:    Linear<B>,
    head:      Linear<B>,
    dropout:   Dropout,
    seq_len:   usize,
}

impl ModelConfig {
    /// Build the base variant. The embedding table comes from the
    /// embedding builder so pretrained weights are already in place.
    pub fn init_plain<B: Backend>(
        &self,
        embedding: Embedding<B>,
        device:    &B::Device,
    ) -> SimilarityModel<B> {
        let encoder = crate::ml::encoder::LstmEncoderConfig::new(
            self.embedding_dim,
            self.hidden_units,
        )
        .with_layers(self.rnn_layers)
        .with_dropout(self.dropout)
        .with_bidirectional(self.bidirectional)
        .init(device);

        let dense1 = LinearConfig::new(encoder.output_width(), DENSE_WIDTH).init(device);
        let dense2 = LinearConfig::new(DENSE_WIDTH, DENSE_WIDTH).init(device);
        let head   = LinearConfig::new(DENSE_WIDTH, 1).init(device);

        SimilarityModel {
            embedding,
            encoder,
            dense1,
            dense2,
            head,
            dropout: DropoutConfig::new(DENSE_DROPOUT).init(),
            // Two sentence windows plus the separator
            seq_len: 2 * self.sequence_length + 1,
        }
    }
}

impl<B: Backend> SimilarityModel<B> {
    /// tokens: [batch, 2*sequence_length+1] → scores: [batch]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch, seq] = tokens.dims();
        assert_eq!(
            seq, self.seq_len,
            "token batch is {} wide but the model was built for {}",
            seq, self.seq_len,
        );

        let embedded = self.embedding.forward(tokens);      // [b, seq, dim]
        let summary  = self.encoder.forward_summary(embedded); // [b, width]

        let x = self.dropout.forward(self.dense1.forward(summary));
        let x = self.dropout.forward(self.dense2.forward(x));

        // [b, 1] → [b]: squeeze the singleton output dimension
        self.head.forward(x).reshape([batch])
    }
}

impl<B: Backend> SimilarityScorer<B> for SimilarityModel<B> {
    fn expected_seq_len(&self) -> usize {
        self.seq_len
    }

    fn score(&self, batch: &PairBatch<B>) -> ScoreOutput<B> {
        ScoreOutput::plain(self.forward(batch.tokens.clone()))
    }

    fn l2_penalty(&self) -> Tensor<B, 1> {
        self.dense1.weight.val().powf_scalar(2.0).sum()
            + self.dense2.weight.val().powf_scalar(2.0).sum()
            + self.head.weight.val().powf_scalar(2.0).sum()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::embedding::build_embedding;

    type TestBackend = burn::backend::NdArray;

    fn tiny_model(sequence_length: usize) -> SimilarityModel<TestBackend> {
        let device = Default::default();
        let cfg    = ModelConfig::new(20, 8, sequence_length, 8);
        let emb    = build_embedding(20, 8, None, &device).unwrap();
        cfg.init_plain(emb, &device)
    }

    #[test]
    fn test_forward_scores_one_per_example() {
        let model  = tiny_model(5);
        let device = Default::default();
        let tokens = Tensor::<TestBackend, 2, Int>::zeros([3, 11], &device);
        let scores = model.forward(tokens);
        assert_eq!(scores.dims(), [3]);
    }

    #[test]
    fn test_declared_width_is_two_windows_plus_separator() {
        let model = tiny_model(5);
        assert_eq!(model.expected_seq_len(), 11);
    }

    #[test]
    #[should_panic(expected = "built for 11")]
    fn test_wrong_width_fails() {
        let model  = tiny_model(5);
        let device = Default::default();
        let tokens = Tensor::<TestBackend, 2, Int>::zeros([2, 7], &device);
        let _ = model.forward(tokens);
    }

    #[test]
    fn test_l2_penalty_is_positive() {
        let model = tiny_model(3);
        let penalty: f32 = model.l2_penalty().into_scalar().elem();
        assert!(penalty > 0.0);
    }
}
