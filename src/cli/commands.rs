// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `evaluate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{ModelVariant, TrainConfig};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a similarity model on a labelled pair file
    Train(TrainArgs),

    /// Evaluate a trained checkpoint on a labelled pair file
    Evaluate(EvaluateArgs),
}

/// CLI-side mirror of the model variant selection.
/// The application layer never sees clap types.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    /// Paired windows → LSTM summary → dense stack
    Plain,
    /// Packed window → episodic memory attention hops
    Attention,
}

impl From<VariantArg> for ModelVariant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Plain     => ModelVariant::Plain,
            VariantArg::Attention => ModelVariant::Attention,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Tab-separated pair file: sentence1 TAB sentence2 TAB score
    #[arg(long, default_value = "data/pairs.tsv")]
    pub data: String,

    /// Directory for checkpoints, vocabulary, and config
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Directory for per-step scalar summaries.
    /// Omit to disable instrumentation entirely.
    #[arg(long)]
    pub summary_dir: Option<String>,

    /// Which model variant to build
    #[arg(long, value_enum, default_value = "plain")]
    pub variant: VariantArg,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Fraction of pairs kept for training (rest is validation)
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Per-sentence window for the plain variant (full window is
    /// 2*sequence_length+1); whole-pair window for attention
    #[arg(long, default_value_t = 30)]
    pub sequence_length: usize,

    /// Hidden width of the LSTM encoder (and the memory states)
    #[arg(long, default_value_t = 128)]
    pub hidden_units: usize,

    /// Width of each token embedding vector
    #[arg(long, default_value_t = 100)]
    pub embedding_dim: usize,

    /// Number of stacked LSTM layers
    #[arg(long, default_value_t = 1)]
    pub rnn_layers: usize,

    /// Dropout between stacked LSTM layers
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Encode in both directions (--bidirectional false to disable)
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub bidirectional: bool,

    /// L2 regularization weight; 0 disables the penalty term
    #[arg(long, default_value_t = 0.0)]
    pub l2_reg_beta: f64,

    /// Number of samples per optimizer step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Episodic memory hops (attention variant only)
    #[arg(long, default_value_t = 3)]
    pub num_hops: usize,

    /// Pretrained embedding matrix as JSON [[f32; dim]; vocab]
    #[arg(long)]
    pub embedding_weights: Option<String>,

    /// Context seed as a JSON float array of width hidden_units.
    /// Required by the attention variant.
    #[arg(long)]
    pub context_seed: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:         a.data,
            checkpoint_dir:    a.checkpoint_dir,
            summary_dir:       a.summary_dir,
            epochs:            a.epochs,
            lr:                a.lr,
            train_fraction:    a.train_fraction,
            sequence_length:   a.sequence_length,
            hidden_units:      a.hidden_units,
            embedding_dim:     a.embedding_dim,
            rnn_layers:        a.rnn_layers,
            dropout:           a.dropout,
            bidirectional:     a.bidirectional,
            l2_reg_beta:       a.l2_reg_beta,
            batch_size:        a.batch_size,
            num_hops:          a.num_hops,
            variant:           a.variant.into(),
            embedding_weights: a.embedding_weights,
            context_seed:      a.context_seed,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Tab-separated pair file to evaluate on
    #[arg(long, default_value = "data/eval_pairs.tsv")]
    pub data: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
