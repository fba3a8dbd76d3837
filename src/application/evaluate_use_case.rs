// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Loads a trained checkpoint and runs a full evaluation pass
// over a labelled pair file:
//
//   1. Load the saved training config (architecture + variant)
//   2. Load the saved vocabulary (same token ids as training)
//   3. Encode the evaluation pairs for that variant
//   4. Rebuild the model and load the latest weights
//   5. One evaluate_step per batch; the streaming accumulators
//      aggregate the dataset-wide correlation and error
//
// The attention variant needs its context seed again: the saved
// config records the seed path, and evaluation fails loudly if
// it is gone.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use burn::{data::dataloader::batcher::Batcher, module::AutodiffModule};

use crate::application::train_use_case::{ModelVariant, TrainConfig};
use crate::data::{
    batcher::{PairBatch, PairBatcher},
    dataset::{encode_packed, encode_paired, PairSample},
    loader::{load_context_seed, TsvLoader},
    preprocessor::Preprocessor,
};
use crate::domain::traits::PairSource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::embedding::{build_embedding, load_pretrained_weights};
use crate::ml::model::SimilarityScorer;
use crate::ml::stepper::StepRunner;
use crate::ml::trainer::{TrainBackend, ValidBackend};

pub struct EvaluateUseCase {
    data_path:      String,
    checkpoint_dir: String,
}

impl EvaluateUseCase {
    pub fn new(data_path: impl Into<String>, checkpoint_dir: impl Into<String>) -> Self {
        Self {
            data_path:      data_path.into(),
            checkpoint_dir: checkpoint_dir.into(),
        }
    }

    pub fn execute(&self) -> Result<()> {
        // ── Step 1: Saved config and vocabulary ───────────────────────────────
        let ckpt_manager = CheckpointManager::new(&self.checkpoint_dir);
        let cfg = ckpt_manager.load_config()?;

        let vocab_store = VocabStore::new(&self.checkpoint_dir);
        let tokenizer   = vocab_store.load()?;
        let vocab_size  = tokenizer.get_vocab_size(true);

        // ── Step 2: Encode the evaluation pairs ───────────────────────────────
        let loader = TsvLoader::new(&self.data_path);
        let pairs  = loader.load_all()?;
        if pairs.is_empty() {
            bail!("No pairs to evaluate in '{}'", self.data_path);
        }

        let preprocessor = Preprocessor::new();
        let samples: Vec<PairSample> = pairs
            .iter()
            .map(|p| {
                let first  = preprocessor.clean(&p.first);
                let second = preprocessor.clean(&p.second);
                match cfg.variant {
                    ModelVariant::Plain => {
                        encode_paired(&tokenizer, &first, &second, p.score, cfg.sequence_length)
                    }
                    ModelVariant::Attention => {
                        encode_packed(&tokenizer, &first, &second, p.score, cfg.sequence_length)
                    }
                }
            })
            .collect::<Result<_>>()?;

        // ── Step 3: Rebuild the model and load the weights ────────────────────
        let device    = Default::default();
        let model_cfg = cfg.model_config(vocab_size);
        let pretrained = cfg
            .embedding_weights
            .as_ref()
            .map(load_pretrained_weights)
            .transpose()
            .context("Failed to load pretrained embedding weights")?;
        let embedding = build_embedding::<TrainBackend>(
            vocab_size,
            cfg.embedding_dim,
            pretrained.as_deref(),
            &device,
        )?;

        match cfg.variant {
            ModelVariant::Plain => {
                let model = model_cfg.init_plain(embedding, &device);
                let model = ckpt_manager.load_model(model, &device)?;
                let runner = StepRunner::new(model, cfg.lr, cfg.l2_reg_beta);
                run_evaluation(runner, samples, cfg.batch_size)
            }
            ModelVariant::Attention => {
                let Some(seed_path) = &cfg.context_seed else {
                    bail!("The saved config has no context seed path; cannot rebuild the attention variant");
                };
                let seed  = load_context_seed(seed_path)?;
                let model = model_cfg.init_attention(embedding, &seed, &device)?;
                let model = ckpt_manager.load_model(model, &device)?;
                let runner = StepRunner::new(model, cfg.lr, cfg.l2_reg_beta);
                run_evaluation(runner, samples, cfg.batch_size)
            }
        }
    }
}

/// One evaluate_step per batch; dataset-wide metrics come from
/// the runner's streaming accumulators.
fn run_evaluation<M>(
    mut runner: StepRunner<TrainBackend, M>,
    samples:    Vec<PairSample>,
    batch_size: usize,
) -> Result<()>
where
    M: SimilarityScorer<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: SimilarityScorer<ValidBackend>,
{
    let batcher = PairBatcher::new(runner.model().expected_seq_len());
    let device  = Default::default();

    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;

    for chunk in samples.chunks(batch_size.max(1)) {
        let batch: PairBatch<ValidBackend> = batcher.batch(chunk.to_vec(), &device);
        let eval = runner.evaluate_step(&batch, true)?;
        loss_sum += eval.loss;
        batches  += 1;
    }

    let avg_loss = loss_sum / batches as f64;
    println!(
        "Evaluated {} pairs | loss={:.4} | pearson={:.4} | mse={:.4}",
        runner.streaming_count(),
        avg_loss,
        runner.streaming_pearson(),
        runner.streaming_mse(),
    );

    Ok(())
}
