// ============================================================
// Layer 5 — Episodic Memory Attention Variant
// ============================================================
// The attention variant: embedding lookup → (Bi)LSTM encoder
// emitting per-timestep "facts" → multi-hop episodic memory →
// scalar relatedness score.
//
// Per hop:
//   1. the attention gate soft-attends over the facts using
//      (previous memory, context seed, fact) features, masking
//      positions at or beyond the true sequence length
//   2. the hop's OWN dense layer (untied weights, ReLU) maps
//      concat(previous memory, episode, seed) to the next
//      memory state
//
// The gate is shared across hops; the memory-update layers are
// not. The unroll is static: num_hops is fixed at construction.
//
// The context seed is a REQUIRED external input. It has no
// default: construction fails when the seed's width disagrees
// with hidden_units, and the harness fails earlier when no
// seed was supplied at all.
//
// Every forward pass records the full memory history (seed plus
// one state per hop) and one attention distribution per hop for
// introspection.
//
// Reference: Kumar et al. (2016) Dynamic Memory Networks
//            Xiong et al. (2016) DMN+ attention gate features
//            Burn Book §3 (Building Blocks)

use anyhow::{bail, Result};
use burn::{
    module::Param,
    nn::{Embedding, Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, softmax, tanh},
};

use crate::data::batcher::PairBatch;
use crate::ml::model::{ModelConfig, ScoreOutput, SimilarityScorer};

// Softmax mask value for padded positions.
const MASKED: f64 = -1e9;

// ─── AttentionGate ────────────────────────────────────────────────────────────
/// Two-layer gate producing one episode per hop: features built
/// from (fact, memory, seed) interactions → tanh hidden layer →
/// scalar score per timestep → masked softmax over time.
#[derive(Module, Debug)]
pub struct AttentionGate<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
}

impl<B: Backend> AttentionGate<B> {
    fn new(hidden_units: usize, device: &B::Device) -> Self {
        Self {
            fc1: LinearConfig::new(4 * hidden_units, hidden_units)
                .with_initializer(Initializer::XavierUniform { gain: 1.0 })
                .init(device),
            fc2: LinearConfig::new(hidden_units, 1)
                .with_initializer(Initializer::XavierUniform { gain: 1.0 })
                .init(device),
        }
    }

    /// Attend over `facts` and return (episode, attention).
    ///
    /// facts:   [batch, seq, hidden]
    /// memory:  [batch, hidden]
    /// seed:    [batch, hidden]
    /// lengths: [batch] — positions at or beyond are masked out
    pub fn episode(
        &self,
        facts:   &Tensor<B, 3>,
        memory:  &Tensor<B, 2>,
        seed:    &Tensor<B, 2>,
        lengths: &Tensor<B, 1, Int>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, seq, hidden] = facts.dims();

        let mem = memory.clone().unsqueeze_dim::<3>(1).expand([batch, seq, hidden]);
        let sd  = seed.clone().unsqueeze_dim::<3>(1).expand([batch, seq, hidden]);

        // Interaction features per timestep: [batch, seq, 4*hidden]
        let features = Tensor::cat(
            vec![
                facts.clone() * mem.clone(),
                facts.clone() * sd.clone(),
                (facts.clone() - mem).abs(),
                (facts.clone() - sd).abs(),
            ],
            2,
        );

        let scores = self
            .fc2
            .forward(tanh(self.fc1.forward(features)))
            .reshape([batch, seq]);

        // Mask padding so attention stays on real tokens
        let device    = scores.device();
        let positions = Tensor::<B, 1, Int>::arange(0..seq as i64, &device)
            .reshape([1, seq])
            .expand([batch, seq]);
        let limits = lengths.clone().reshape([batch, 1]).expand([batch, seq]);
        let scores = scores.mask_fill(positions.greater_equal(limits), MASKED);

        let attention = softmax(scores, 1); // [batch, seq]

        let weighted = facts.clone()
            * attention.clone().unsqueeze_dim::<3>(2).expand([batch, seq, hidden]);
        let episode = weighted.sum_dim(1).reshape([batch, hidden]);

        (episode, attention)
    }
}

// ─── AttentionSimilarityModel ─────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct AttentionSimilarityModel<B: Backend> {
    embedding:   Embedding<B>,
    encoder:     crate::ml::encoder::LstmEncoder<B>,
    gate:        AttentionGate<B>,
    /// One untied memory-update layer per hop
    hop_updates: Vec<Linear<B>>,
    score_head:  Linear<B>,
    /// Learned per-hidden-dimension fact scaling, broadcast over
    /// batch and time
    attention_weights: Param<Tensor<B, 1>>,
    /// Externally supplied context seed, broadcast over the batch
    seed:    Tensor<B, 1>,
    seq_len: usize,
}

impl ModelConfig {
    /// Build the attention variant. `seed` is the required context
    /// seed; a width mismatch against hidden_units is a hard error.
    pub fn init_attention<B: Backend>(
        &self,
        embedding: Embedding<B>,
        seed:      &[f32],
        device:    &B::Device,
    ) -> Result<AttentionSimilarityModel<B>> {
        if seed.len() != self.hidden_units {
            bail!(
                "Context seed has width {} but hidden_units is {}",
                seed.len(),
                self.hidden_units,
            );
        }

        let encoder = crate::ml::encoder::LstmEncoderConfig::new(
            self.embedding_dim,
            self.hidden_units,
        )
        .with_layers(self.rnn_layers)
        .with_dropout(self.dropout)
        .with_bidirectional(self.bidirectional)
        .init(device);

        let h = self.hidden_units;
        let hop_updates = (0..self.num_hops)
            .map(|_| {
                LinearConfig::new(3 * h, h)
                    .with_initializer(Initializer::XavierUniform { gain: 1.0 })
                    .init(device)
            })
            .collect();

        Ok(AttentionSimilarityModel {
            embedding,
            encoder,
            gate: AttentionGate::new(h, device),
            hop_updates,
            score_head: LinearConfig::new(2 * h, 1)
                .with_initializer(Initializer::XavierUniform { gain: 1.0 })
                .init(device),
            attention_weights: Initializer::Normal { mean: 0.0, std: 0.05 }.init([h], device),
            seed: Tensor::<B, 1>::from_floats(seed, device),
            seq_len: self.sequence_length,
        })
    }
}

impl<B: Backend> AttentionSimilarityModel<B> {
    pub fn num_hops(&self) -> usize {
        self.hop_updates.len()
    }
}

impl<B: Backend> SimilarityScorer<B> for AttentionSimilarityModel<B> {
    fn expected_seq_len(&self) -> usize {
        self.seq_len
    }

    fn score(&self, batch: &PairBatch<B>) -> ScoreOutput<B> {
        let [batch_size, seq] = batch.tokens.dims();
        assert_eq!(
            seq, self.seq_len,
            "token batch is {} wide but the model was built for {}",
            seq, self.seq_len,
        );

        let embedded = self.embedding.forward(batch.tokens.clone());
        let facts    = self.encoder.forward_facts(embedded); // [b, seq, h]
        let [_, _, hidden] = facts.dims();

        // Scale facts by the learned per-dimension weights
        let weights = self
            .attention_weights
            .val()
            .reshape([1, 1, hidden])
            .expand([batch_size, seq, hidden]);
        let facts = facts * weights;

        let seed = self
            .seed
            .clone()
            .reshape([1, hidden])
            .expand([batch_size, hidden]);

        let mut memory     = seed.clone();
        let mut memories   = vec![memory.clone()];
        let mut attentions = Vec::with_capacity(self.hop_updates.len());

        for hop in &self.hop_updates {
            let (episode, attention) =
                self.gate.episode(&facts, &memory, &seed, &batch.lengths);
            attentions.push(attention);

            let concat = Tensor::cat(vec![memory, episode, seed.clone()], 1);
            memory = relu(hop.forward(concat));
            memories.push(memory.clone());
        }

        let score = self
            .score_head
            .forward(Tensor::cat(vec![memory, seed], 1))
            .reshape([batch_size]);

        ScoreOutput {
            score,
            attentions,
            memories,
        }
    }

    fn l2_penalty(&self) -> Tensor<B, 1> {
        let mut penalty = self.gate.fc1.weight.val().powf_scalar(2.0).sum()
            + self.gate.fc2.weight.val().powf_scalar(2.0).sum()
            + self.score_head.weight.val().powf_scalar(2.0).sum();
        for hop in &self.hop_updates {
            penalty = penalty + hop.weight.val().powf_scalar(2.0).sum();
        }
        penalty
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::{PairBatch, PairBatcher};
    use crate::data::dataset::PairSample;
    use crate::ml::embedding::build_embedding;
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = burn::backend::NdArray;

    fn tiny_model(num_hops: usize) -> AttentionSimilarityModel<TestBackend> {
        let device = Default::default();
        let cfg = ModelConfig::new(20, 6, 8, 6).with_num_hops(num_hops);
        let emb = build_embedding(20, 6, None, &device).unwrap();
        let seed = vec![0.1f32; 6];
        cfg.init_attention(emb, &seed, &device).unwrap()
    }

    fn tiny_batch(lengths: &[usize]) -> PairBatch<TestBackend> {
        let device  = Default::default();
        let batcher = PairBatcher::new(8);
        let samples = lengths
            .iter()
            .map(|&len| {
                let mut tokens = vec![5u32; len];
                tokens.resize(8, 0);
                PairSample { tokens, length: len, similarity: 0.5 }
            })
            .collect();
        batcher.batch(samples, &device)
    }

    #[test]
    fn test_three_hops_three_attentions_four_memories() {
        let model = tiny_model(3);
        let out   = model.score(&tiny_batch(&[8, 5]));
        assert_eq!(out.attentions.len(), 3);
        // Memory history: seed plus one state per hop
        assert_eq!(out.memories.len(), 4);
        assert_eq!(out.score.dims(), [2]);
    }

    #[test]
    fn test_seed_width_mismatch_fails() {
        let device = Default::default();
        let cfg = ModelConfig::new(20, 6, 8, 6);
        let emb = build_embedding::<TestBackend>(20, 6, None, &device).unwrap();
        let result = cfg.init_attention(emb, &[0.1, 0.2], &device);
        assert!(result.is_err());
    }

    #[test]
    fn test_attention_rows_are_distributions() {
        let model = tiny_model(2);
        let out   = model.score(&tiny_batch(&[8, 4]));

        let attn: Vec<f32> = out.attentions[0].clone().into_data().to_vec().unwrap();
        let row_sum: f32 = attn[..8].iter().sum();
        assert!((row_sum - 1.0).abs() < 1e-4);

        // Second example has true length 4: padded positions get ~0 mass
        assert!(attn[8 + 4..].iter().all(|&a| a < 1e-6));
    }
}
