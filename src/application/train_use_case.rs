// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load labelled pairs        (Layer 4 - data)
//   Step 2: Clean the sentences        (Layer 4 - data)
//   Step 3: Build / load vocabulary    (Layer 6 - infra)
//   Step 4: Encode pairs for the       (Layer 4 - data)
//           configured variant
//   Step 5: Split train/validation     (Layer 4 - data)
//   Step 6: Save config                (Layer 6 - infra)
//   Step 7: Set up summaries           (Layer 6 - infra)
//   Step 8: Run training loop          (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{encode_packed, encode_paired, PairDataset, PairSample},
    loader::{load_context_seed, TsvLoader},
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::traits::PairSource;
use crate::infra::{checkpoint::CheckpointManager, summary::SummaryWriter, vocab_store::VocabStore};
use crate::ml::embedding::{load_pretrained_weights, ProjectorConfig};
use crate::ml::model::ModelConfig;
use crate::ml::trainer::run_training;

// ─── Model variant selection ─────────────────────────────────────────────────
/// Which scoring graph to build. Both variants share the step
/// executor; they differ only in construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Paired windows → LSTM summary → dense stack → score
    Plain,
    /// Packed window → facts → episodic memory hops → score
    Attention,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so it can
// be saved alongside the checkpoints and reloaded for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:      String,
    pub checkpoint_dir: String,
    /// Summary directory; None disables per-step instrumentation
    pub summary_dir: Option<String>,

    pub epochs:         usize,
    pub lr:             f64,
    pub train_fraction: f64,

    // Model hyperparameters (vocab_size is discovered from the
    // corpus, so it is not part of this struct)
    pub sequence_length: usize,
    pub hidden_units:    usize,
    pub embedding_dim:   usize,
    pub rnn_layers:      usize,
    pub dropout:         f64,
    pub bidirectional:   bool,
    pub l2_reg_beta:     f64,
    pub batch_size:      usize,
    pub num_hops:        usize,

    pub variant: ModelVariant,

    /// Optional pretrained embedding matrix (JSON)
    pub embedding_weights: Option<String>,

    /// Context seed for the attention variant (JSON float array).
    /// Required when variant == Attention; there is no default.
    pub context_seed: Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:         "data/pairs.tsv".to_string(),
            checkpoint_dir:    "checkpoints".to_string(),
            summary_dir:       None,
            epochs:            10,
            lr:                1e-3,
            train_fraction:    0.8,
            sequence_length:   30,
            hidden_units:      128,
            embedding_dim:     100,
            rnn_layers:        1,
            dropout:           0.5,
            bidirectional:     true,
            l2_reg_beta:       0.0,
            batch_size:        64,
            num_hops:          3,
            variant:           ModelVariant::Plain,
            embedding_weights: None,
            context_seed:      None,
        }
    }
}

impl TrainConfig {
    /// The immutable model configuration, once the vocabulary
    /// size is known.
    pub fn model_config(&self, vocab_size: usize) -> ModelConfig {
        ModelConfig::new(
            vocab_size,
            self.embedding_dim,
            self.sequence_length,
            self.hidden_units,
        )
        .with_rnn_layers(self.rnn_layers)
        .with_dropout(self.dropout)
        .with_bidirectional(self.bidirectional)
        .with_l2_reg_beta(self.l2_reg_beta)
        .with_batch_size(self.batch_size)
        .with_num_hops(self.num_hops)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load labelled pairs ───────────────────────────────────────
        tracing::info!("Loading sentence pairs from '{}'", cfg.data_path);
        let loader = TsvLoader::new(&cfg.data_path);
        let pairs  = loader.load_all()?;

        // ── Step 2: Clean sentences ───────────────────────────────────────────
        let preprocessor = Preprocessor::new();
        let pairs: Vec<_> = pairs
            .iter()
            .map(|p| {
                crate::domain::sentence_pair::SentencePair::new(
                    preprocessor.clean(&p.first),
                    preprocessor.clean(&p.second),
                    p.score,
                )
            })
            .collect();

        // ── Step 3: Build / load vocabulary ───────────────────────────────────
        let vocab_store = VocabStore::new(&cfg.checkpoint_dir);
        let corpus: Vec<String> = pairs
            .iter()
            .flat_map(|p| [p.first.clone(), p.second.clone()])
            .collect();
        let tokenizer  = vocab_store.load_or_build(&corpus)?;
        let vocab_size = tokenizer.get_vocab_size(true);
        tracing::info!("Vocabulary ready: {} entries", vocab_size);

        // ── Step 4: Encode pairs for the configured variant ───────────────────
        let samples: Vec<PairSample> = pairs
            .iter()
            .map(|p| match cfg.variant {
                ModelVariant::Plain => {
                    encode_paired(&tokenizer, &p.first, &p.second, p.score, cfg.sequence_length)
                }
                ModelVariant::Attention => {
                    encode_packed(&tokenizer, &p.first, &p.second, p.score, cfg.sequence_length)
                }
            })
            .collect::<Result<_>>()?;
        tracing::info!("Encoded {} samples", samples.len());

        // ── Step 5: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );
        let train_dataset = PairDataset::new(train_samples);
        let val_dataset   = PairDataset::new(val_samples);

        // ── Step 6: Save config for evaluation ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        // ── Step 7: Optional instrumentation ──────────────────────────────────
        let summaries = match &cfg.summary_dir {
            Some(dir) => {
                let writer = SummaryWriter::create(dir.clone())?;
                writer.register_embeddings(&ProjectorConfig {
                    metadata_path: vocab_store.metadata_path().display().to_string(),
                })?;
                Some(writer)
            }
            None => None,
        };

        // ── Step 8: External model inputs, then the loop ──────────────────────
        let pretrained = cfg
            .embedding_weights
            .as_ref()
            .map(load_pretrained_weights)
            .transpose()
            .context("Failed to load pretrained embedding weights")?;

        let context_seed = cfg
            .context_seed
            .as_ref()
            .map(load_context_seed)
            .transpose()
            .context("Failed to load the context seed")?;

        let model_cfg = cfg.model_config(vocab_size);
        run_training(
            cfg,
            &model_cfg,
            train_dataset,
            val_dataset,
            ckpt_manager,
            summaries,
            pretrained,
            context_seed,
        )
    }
}
