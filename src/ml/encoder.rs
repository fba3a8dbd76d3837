// ============================================================
// Layer 5 — Recurrent Sequence Encoder
// ============================================================
// The configurable LSTM block both model variants encode with:
// stacked layers, hidden width, inter-layer dropout, optional
// bidirectionality — all config-driven.
//
// Two read-outs over the same stack:
//
//   forward_summary — one fixed-width vector per example: the
//                     final-timestep output. Sequences are
//                     always encoded at their full padded
//                     length (no dynamic-length handling).
//
//   forward_facts   — one vector per timestep ("facts") for
//                     the episodic memory module. When the
//                     encoder is bidirectional the two
//                     directional halves are summed so facts
//                     keep width hidden_units.
//
// Reference: Hochreiter & Schmidhuber (1997) LSTM
//            Xiong et al. (2016) — directional fact summing
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{BiLstm, BiLstmConfig, Dropout, DropoutConfig, Lstm, LstmConfig},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct LstmEncoderConfig {
    pub d_input:      usize,
    pub hidden_units: usize,

    #[config(default = 1)]
    pub layers: usize,

    #[config(default = 0.0)]
    pub dropout: f64,

    #[config(default = false)]
    pub bidirectional: bool,
}

impl LstmEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmEncoder<B> {
        let mut uni: Vec<Lstm<B>>   = Vec::new();
        let mut bi:  Vec<BiLstm<B>> = Vec::new();

        // Layer l takes the previous layer's output width as input.
        for layer in 0..self.layers.max(1) {
            if self.bidirectional {
                let d_in = if layer == 0 { self.d_input } else { 2 * self.hidden_units };
                bi.push(BiLstmConfig::new(d_in, self.hidden_units, true).init(device));
            } else {
                let d_in = if layer == 0 { self.d_input } else { self.hidden_units };
                uni.push(LstmConfig::new(d_in, self.hidden_units, true).init(device));
            }
        }

        LstmEncoder {
            uni,
            bi,
            dropout:       DropoutConfig::new(self.dropout).init(),
            bidirectional: self.bidirectional,
            hidden_units:  self.hidden_units,
        }
    }
}

#[derive(Module, Debug)]
pub struct LstmEncoder<B: Backend> {
    uni:           Vec<Lstm<B>>,
    bi:            Vec<BiLstm<B>>,
    dropout:       Dropout,
    bidirectional: bool,
    hidden_units:  usize,
}

impl<B: Backend> LstmEncoder<B> {
    /// Width of the per-timestep output of the top layer.
    pub fn output_width(&self) -> usize {
        if self.bidirectional {
            2 * self.hidden_units
        } else {
            self.hidden_units
        }
    }

    /// Run the full stack, returning every timestep of the top
    /// layer: [batch, seq, output_width].
    fn forward_stack(&self, embedded: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut x = embedded;

        if self.bidirectional {
            let last = self.bi.len() - 1;
            for (i, layer) in self.bi.iter().enumerate() {
                let (out, _) = layer.forward(x, None);
                x = if i < last { self.dropout.forward(out) } else { out };
            }
        } else {
            let last = self.uni.len() - 1;
            for (i, layer) in self.uni.iter().enumerate() {
                let (out, _) = layer.forward(x, None);
                x = if i < last { self.dropout.forward(out) } else { out };
            }
        }

        x
    }

    /// One fixed-width vector per example: the output at the
    /// final (padded) timestep. Shape: [batch, output_width].
    pub fn forward_summary(&self, embedded: Tensor<B, 3>) -> Tensor<B, 2> {
        let out = self.forward_stack(embedded);
        let [batch, seq, width] = out.dims();
        out.slice([0..batch, seq - 1..seq, 0..width])
            .reshape([batch, width])
    }

    /// Per-timestep facts for the episodic memory module.
    /// Always [batch, seq, hidden_units]: a bidirectional stack
    /// sums its two directional halves.
    pub fn forward_facts(&self, embedded: Tensor<B, 3>) -> Tensor<B, 3> {
        let out = self.forward_stack(embedded);

        if !self.bidirectional {
            return out;
        }

        let [batch, seq, width] = out.dims();
        let h = width / 2;
        let forward  = out.clone().slice([0..batch, 0..seq, 0..h]);
        let backward = out.slice([0..batch, 0..seq, h..width]);
        forward + backward
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn embedded(batch: usize, seq: usize, dim: usize) -> Tensor<TestBackend, 3> {
        Tensor::zeros([batch, seq, dim], &Default::default())
    }

    #[test]
    fn test_summary_shape_unidirectional() {
        let device  = Default::default();
        let encoder = LstmEncoderConfig::new(6, 8).with_layers(2).init::<TestBackend>(&device);
        let summary = encoder.forward_summary(embedded(3, 5, 6));
        assert_eq!(summary.dims(), [3, 8]);
        assert_eq!(encoder.output_width(), 8);
    }

    #[test]
    fn test_summary_shape_bidirectional() {
        let device  = Default::default();
        let encoder = LstmEncoderConfig::new(6, 8)
            .with_bidirectional(true)
            .init::<TestBackend>(&device);
        let summary = encoder.forward_summary(embedded(2, 5, 6));
        assert_eq!(summary.dims(), [2, 16]);
        assert_eq!(encoder.output_width(), 16);
    }

    #[test]
    fn test_facts_keep_hidden_width() {
        let device  = Default::default();
        let encoder = LstmEncoderConfig::new(4, 7)
            .with_bidirectional(true)
            .init::<TestBackend>(&device);
        // Directional halves are summed: width stays hidden_units
        let facts = encoder.forward_facts(embedded(2, 6, 4));
        assert_eq!(facts.dims(), [2, 6, 7]);
    }
}
