// ============================================================
// Layer 5 — Training Loop
// ============================================================
// The epoch loop around the step executor.
//
// Per epoch:
//   1. one train_step per training batch (optimizer update,
//      global step, optional training summaries)
//   2. reset the streaming accumulators — metrics are
//      per-epoch, not globally cumulative
//   3. one evaluate_step per validation batch; the streaming
//      accumulators aggregate the dataset-wide correlation and
//      error
//   4. one metrics CSV row, one checkpoint
//
// Training runs on the autodiff backend; validation batches are
// built on the inner backend so evaluation pays no autodiff
// overhead and dropout stays off.
//
// Reference: Kingma & Ba (2015) Adam
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::{data::dataloader::DataLoaderBuilder, module::AutodiffModule};

use crate::application::train_use_case::{ModelVariant, TrainConfig};
use crate::data::batcher::{PairBatch, PairBatcher};
use crate::data::dataset::{PairDataset, PairSample};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::infra::summary::SummaryWriter;
use crate::ml::embedding::build_embedding;
use crate::ml::model::{ModelConfig, SimilarityScorer};
use crate::ml::stepper::StepRunner;

// CPU backend on purpose: the model is small and training must
// work on hosts without a GPU adapter.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
pub type ValidBackend = burn::backend::NdArray;

/// Build the configured variant and run the full training loop.
pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &ModelConfig,
    train_dataset: PairDataset,
    val_dataset:   PairDataset,
    ckpt_manager:  CheckpointManager,
    summaries:     Option<SummaryWriter>,
    pretrained:    Option<Vec<Vec<f32>>>,
    context_seed:  Option<Vec<f32>>,
) -> Result<()> {
    let device = Default::default();

    let embedding = build_embedding::<TrainBackend>(
        model_cfg.vocab_size,
        model_cfg.embedding_dim,
        pretrained.as_deref(),
        &device,
    )?;

    match cfg.variant {
        ModelVariant::Plain => {
            let model = model_cfg.init_plain(embedding, &device);
            tracing::info!(
                "Base model ready: {} LSTM layers, hidden={}, window={}",
                model_cfg.rnn_layers,
                model_cfg.hidden_units,
                model.expected_seq_len(),
            );
            train_loop(cfg, model_cfg, model, train_dataset, val_dataset, ckpt_manager, summaries)
        }
        ModelVariant::Attention => {
            // The episodic memory has no default seed
            let Some(seed) = context_seed else {
                bail!("The attention variant requires a context seed (--context-seed)");
            };
            let model = model_cfg.init_attention(embedding, &seed, &device)?;
            tracing::info!(
                "Attention model ready: {} hops, hidden={}, window={}",
                model_cfg.num_hops,
                model_cfg.hidden_units,
                model.expected_seq_len(),
            );
            train_loop(cfg, model_cfg, model, train_dataset, val_dataset, ckpt_manager, summaries)
        }
    }
}

fn train_loop<M>(
    cfg:           &TrainConfig,
    model_cfg:     &ModelConfig,
    model:         M,
    train_dataset: PairDataset,
    val_dataset:   PairDataset,
    ckpt_manager:  CheckpointManager,
    summaries:     Option<SummaryWriter>,
) -> Result<()>
where
    M: SimilarityScorer<TrainBackend> + AutodiffModule<TrainBackend>,
    M::InnerModule: SimilarityScorer<ValidBackend>,
{
    let seq_len = model.expected_seq_len();
    let batcher = PairBatcher::new(seq_len);

    // ── Data loaders: autodiff backend for training, inner backend for eval ──
    let train_loader = DataLoaderBuilder::<TrainBackend, PairSample, PairBatch<TrainBackend>>::new(
        batcher.clone(),
    )
    .batch_size(model_cfg.batch_size)
    .shuffle(42)
    .num_workers(1)
    .build(train_dataset);

    let val_loader = DataLoaderBuilder::<ValidBackend, PairSample, PairBatch<ValidBackend>>::new(
        batcher,
    )
    .batch_size(model_cfg.batch_size)
    .num_workers(1)
    .build(val_dataset);

    // ── Step runner owns the model, optimizer, counters, metrics ─────────────
    let mut runner = StepRunner::new(model, cfg.lr, model_cfg.l2_reg_beta);
    if let Some(writer) = summaries {
        runner.attach_summaries(writer);
    }

    let metrics_logger = MetricsLogger::new(ckpt_manager.dir().display().to_string())?;

    // ── Epoch loop ───────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for (i, batch) in train_loader.iter().enumerate() {
            let step = runner.train_step(&batch, epoch, i % 100 == 0)?;
            train_loss_sum += step.loss;
            train_batches  += 1;
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else {
            f64::NAN
        };

        // Per-epoch metrics: start a fresh streaming window
        runner.reset_streaming();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;

        for batch in val_loader.iter() {
            let eval = runner.evaluate_step(&batch, false)?;
            val_loss_sum += eval.loss;
            val_batches  += 1;
        }

        let avg_val_loss = if val_batches > 0 {
            val_loss_sum / val_batches as f64
        } else {
            f64::NAN
        };
        let pearson = runner.streaming_pearson();
        let mse     = runner.streaming_mse();

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | pearson={:.4} | mse={:.4}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, pearson, mse,
        );

        metrics_logger.log(&EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, pearson, mse))?;

        ckpt_manager.save_model(runner.model().clone(), epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete after {} steps", runner.global_step());
    Ok(())
}
