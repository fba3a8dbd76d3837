// ============================================================
// Layer 5 — Step Executor
// ============================================================
// One step-execution contract shared by both model variants.
// The runner owns everything a single training loop needs:
//
//   - the model (via the SimilarityScorer strategy trait —
//     the variants differ ONLY in graph construction)
//   - the Adam optimizer and learning rate
//   - the global step counter (+1 per train step, untouched
//     by evaluation)
//   - the streaming metric accumulators (advanced once per
//     evaluation step, reset explicitly by the caller)
//   - the optional summary writer
//
// Returned correlation/error values are always recomputed
// exactly from the raw predictions and labels of the current
// batch. They are NOT the streaming values: the streaming
// accumulators answer "how is the whole epoch going", the
// returned values answer "how was this batch". Callers that
// want dataset-wide numbers read the accumulators.
//
// The runner is single-owner mutable state: one training loop
// drives it for its entire lifetime, synchronously.
//
// Reference: Kingma & Ba (2015) Adam
//            Burn Book §5 (Training)

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::PairBatch;
use crate::infra::summary::SummaryWriter;
use crate::ml::metrics::{mean_squared_error, pearson, StreamingMse, StreamingPearson};
use crate::ml::model::SimilarityScorer;

/// What one training step reports.
#[derive(Debug, Clone)]
pub struct TrainStep {
    /// Exact Pearson correlation of this batch
    pub pearson: f64,
    /// Exact mean squared error of this batch
    pub mse: f64,
    /// Loss value the optimizer stepped on
    pub loss: f64,
    /// Global step AFTER this update
    pub step: u64,
}

/// What one evaluation step reports.
#[derive(Debug, Clone)]
pub struct EvalStep {
    pub loss:    f64,
    pub pearson: f64,
    pub mse:     f64,
    /// Raw predictions for the batch, host-side
    pub predictions: Vec<f32>,
}

// ─── StepRunner ───────────────────────────────────────────────────────────────
pub struct StepRunner<B, M>
where
    B: AutodiffBackend,
    M: SimilarityScorer<B> + AutodiffModule<B>,
{
    model:       M,
    optim:       OptimizerAdaptor<Adam, M, B>,
    lr:          f64,
    l2_beta:     f64,
    global_step: u64,
    pearson_acc: StreamingPearson,
    mse_acc:     StreamingMse,
    summaries:   Option<SummaryWriter>,
}

impl<B, M> StepRunner<B, M>
where
    B: AutodiffBackend,
    M: SimilarityScorer<B> + AutodiffModule<B>,
    M::InnerModule: SimilarityScorer<B::InnerBackend>,
{
    pub fn new(model: M, lr: f64, l2_beta: f64) -> Self {
        Self {
            model,
            optim: AdamConfig::new().with_epsilon(1e-8).init(),
            lr,
            l2_beta,
            global_step: 0,
            pearson_acc: StreamingPearson::default(),
            mse_acc:     StreamingMse::default(),
            summaries:   None,
        }
    }

    /// Attach the optional scalar-summary writer. Steps emit
    /// summary records only while one is attached.
    pub fn attach_summaries(&mut self, writer: SummaryWriter) {
        self.summaries = Some(writer);
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Streaming Pearson correlation since the last reset.
    pub fn streaming_pearson(&self) -> f64 {
        self.pearson_acc.value()
    }

    /// Streaming mean squared error since the last reset.
    pub fn streaming_mse(&self) -> f64 {
        self.mse_acc.value()
    }

    /// Samples folded into the streaming accumulators since the
    /// last reset.
    pub fn streaming_count(&self) -> u64 {
        self.pearson_acc.count()
    }

    /// Start a fresh streaming window (e.g. before an epoch's
    /// validation pass).
    pub fn reset_streaming(&mut self) {
        self.pearson_acc.reset();
        self.mse_acc.reset();
    }

    /// One training step: forward, loss, backward, one Adam
    /// update, global step +1, optional training summary.
    pub fn train_step(
        &mut self,
        batch:   &PairBatch<B>,
        epoch:   usize,
        verbose: bool,
    ) -> Result<TrainStep> {
        let output      = self.model.score(batch);
        let predictions = read_scores(&output.score)?;

        let loss = regression_loss(&self.model, output.score, batch.similarity.clone(), self.l2_beta);
        let loss_value: f64 = loss.clone().into_scalar().elem();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.lr, self.model.clone(), grads);
        self.global_step += 1;

        // Exact single-batch statistics, independent of the
        // streaming accumulators
        let pco = pearson(&predictions, &batch.raw_similarity);
        let mse = mean_squared_error(&predictions, &batch.raw_similarity);

        if let Some(writer) = &self.summaries {
            writer.training_scalars(self.global_step, loss_value, pco, mse)?;
        }

        if verbose {
            tracing::info!(
                "TRAIN epoch={} step={} loss={:.6} pearson={:.4} mse={:.6}",
                epoch, self.global_step, loss_value, pco, mse,
            );
        }

        Ok(TrainStep {
            pearson: pco,
            mse,
            loss: loss_value,
            step: self.global_step,
        })
    }

    /// One evaluation step: forward on the validation view of
    /// the model (dropout inactive, no optimizer update, global
    /// step untouched), one streaming-accumulator update,
    /// optional validation summary.
    pub fn evaluate_step(
        &mut self,
        batch:   &PairBatch<B::InnerBackend>,
        verbose: bool,
    ) -> Result<EvalStep> {
        let model       = self.model.valid();
        let output      = model.score(batch);
        let predictions = read_scores(&output.score)?;

        let loss = regression_loss(&model, output.score, batch.similarity.clone(), self.l2_beta);
        let loss_value: f64 = loss.into_scalar().elem();

        // Exactly one accumulator update per call; accumulation
        // across calls is how callers get dataset-wide metrics
        self.pearson_acc.update(&predictions, &batch.raw_similarity);
        self.mse_acc.update(&predictions, &batch.raw_similarity);

        let pco = pearson(&predictions, &batch.raw_similarity);
        let mse = mean_squared_error(&predictions, &batch.raw_similarity);

        if let Some(writer) = &self.summaries {
            writer.validation_scalars(self.global_step, loss_value, pco, mse)?;
        }

        if verbose {
            tracing::info!(
                "EVAL step={} loss={:.6} pearson={:.4} mse={:.6}",
                self.global_step, loss_value, pco, mse,
            );
        }

        Ok(EvalStep {
            loss: loss_value,
            pearson: pco,
            mse,
            predictions,
        })
    }
}

/// Batch-mean MSE loss, plus the model's L2 penalty when the
/// regularization weight is positive.
fn regression_loss<B: Backend, M: SimilarityScorer<B>>(
    model:      &M,
    prediction: Tensor<B, 1>,
    target:     Tensor<B, 1>,
    l2_beta:    f64,
) -> Tensor<B, 1> {
    let loss = MseLoss::new().forward(prediction, target, Reduction::Mean);
    if l2_beta > 0.0 {
        loss + model.l2_penalty().mul_scalar(l2_beta)
    } else {
        loss
    }
}

fn read_scores<B: Backend>(score: &Tensor<B, 1>) -> Result<Vec<f32>> {
    score
        .clone()
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read predictions back from the device: {e:?}"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::PairBatcher;
    use crate::data::dataset::PairSample;
    use crate::ml::embedding::build_embedding;
    use crate::ml::model::{ModelConfig, SimilarityModel};
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend  = burn::backend::NdArray;
    type TrainBackend = burn::backend::Autodiff<TestBackend>;

    fn tiny_config() -> ModelConfig {
        // sequence_length 5 → token width 11
        ModelConfig::new(20, 8, 5, 8)
    }

    fn tiny_runner(l2_beta: f64) -> StepRunner<TrainBackend, SimilarityModel<TrainBackend>> {
        let device = Default::default();
        let cfg    = tiny_config();
        let emb    = build_embedding(20, 8, None, &device).unwrap();
        let model  = cfg.init_plain(emb, &device);
        StepRunner::new(model, 0.05, l2_beta)
    }

    fn scenario_samples() -> Vec<PairSample> {
        vec![
            PairSample { tokens: vec![3, 4, 5, 0, 0, 2, 6, 7, 0, 0, 0], length: 11, similarity: 0.8 },
            PairSample { tokens: vec![8, 9, 0, 0, 0, 2, 10, 11, 12, 0, 0], length: 11, similarity: 0.2 },
        ]
    }

    fn train_batch() -> PairBatch<TrainBackend> {
        PairBatcher::new(11).batch(scenario_samples(), &Default::default())
    }

    fn eval_batch() -> PairBatch<TestBackend> {
        PairBatcher::new(11).batch(scenario_samples(), &Default::default())
    }

    #[test]
    fn test_base_scenario_trains_and_updates_parameters() {
        let mut runner = tiny_runner(0.0);

        let before = runner.evaluate_step(&eval_batch(), false).unwrap();
        let step   = runner.train_step(&train_batch(), 1, false).unwrap();

        assert!(step.loss.is_finite());
        assert_eq!(step.step, 1);

        // The optimizer moved the parameters: the model scores
        // the same batch differently now
        let after = runner.evaluate_step(&eval_batch(), false).unwrap();
        let moved = before
            .predictions
            .iter()
            .zip(after.predictions.iter())
            .any(|(b, a)| (b - a).abs() > 1e-4);
        assert!(moved, "parameters unchanged by train_step");
    }

    #[test]
    fn test_global_step_counts_only_training() {
        let mut runner = tiny_runner(0.0);
        assert_eq!(runner.global_step(), 0);

        runner.train_step(&train_batch(), 1, false).unwrap();
        runner.train_step(&train_batch(), 1, false).unwrap();
        assert_eq!(runner.global_step(), 2);

        runner.evaluate_step(&eval_batch(), false).unwrap();
        assert_eq!(runner.global_step(), 2);
    }

    #[test]
    fn test_evaluate_is_idempotent_but_accumulates() {
        let mut runner = tiny_runner(0.0);
        let batch = eval_batch();

        let first  = runner.evaluate_step(&batch, false).unwrap();
        let second = runner.evaluate_step(&batch, false).unwrap();

        // Same inputs, deterministic statistics
        assert_eq!(first.loss, second.loss);
        assert_eq!(first.pearson, second.pearson);
        assert_eq!(first.mse, second.mse);

        // ...but the streaming state advanced on every call
        assert_eq!(runner.streaming_count(), 4);

        runner.reset_streaming();
        assert_eq!(runner.streaming_count(), 0);
    }

    #[test]
    fn test_attached_summaries_receive_step_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = tiny_runner(0.0);
        runner.attach_summaries(SummaryWriter::create(dir.path().to_str().unwrap()).unwrap());

        runner.train_step(&train_batch(), 1, false).unwrap();
        runner.evaluate_step(&eval_batch(), false).unwrap();

        let train = std::fs::read_to_string(dir.path().join("train_summary.csv")).unwrap();
        let val   = std::fs::read_to_string(dir.path().join("validation_summary.csv")).unwrap();

        // Header plus one record in each stream, keyed by step 1
        assert_eq!(train.lines().count(), 2);
        assert_eq!(val.lines().count(), 2);
        assert!(train.lines().nth(1).unwrap().starts_with("1,"));
        assert!(val.lines().nth(1).unwrap().starts_with("1,"));
    }

    #[test]
    fn test_attention_variant_shares_the_step_contract() {
        let device = Default::default();
        let cfg  = ModelConfig::new(20, 6, 8, 6).with_num_hops(2);
        let emb  = build_embedding(20, 6, None, &device).unwrap();
        let seed = vec![0.1f32; 6];
        let model = cfg.init_attention(emb, &seed, &device).unwrap();
        let mut runner = StepRunner::new(model, 0.05, 0.0);

        let samples = vec![
            PairSample { tokens: vec![3, 4, 2, 5, 6, 0, 0, 0], length: 5, similarity: 0.7 },
            PairSample { tokens: vec![7, 8, 2, 9, 0, 0, 0, 0], length: 4, similarity: 0.3 },
        ];
        let batch: PairBatch<TrainBackend> =
            PairBatcher::new(8).batch(samples, &Default::default());

        let step = runner.train_step(&batch, 1, false).unwrap();
        assert!(step.loss.is_finite());
        assert_eq!(step.step, 1);
    }

    #[test]
    fn test_l2_zero_means_pure_mse() {
        let device = Default::default();
        let cfg    = tiny_config();
        let emb    = build_embedding::<TestBackend>(20, 8, None, &device).unwrap();
        let model  = cfg.init_plain(emb, &device);

        let batch  = eval_batch();
        let output = model.score(&batch);
        let preds  = read_scores(&output.score).unwrap();

        let loss: f64 = regression_loss(&model, output.score, batch.similarity.clone(), 0.0)
            .into_scalar()
            .elem();
        let exact = mean_squared_error(&preds, &batch.raw_similarity);
        assert!((loss - exact).abs() < 1e-5);
    }

    #[test]
    fn test_l2_positive_strictly_increases_loss() {
        let device = Default::default();
        let cfg    = tiny_config();
        let emb    = build_embedding::<TestBackend>(20, 8, None, &device).unwrap();
        let model  = cfg.init_plain(emb, &device);

        let batch  = eval_batch();
        let output = model.score(&batch);

        let plain: f64 = regression_loss(&model, output.score.clone(), batch.similarity.clone(), 0.0)
            .into_scalar()
            .elem();
        let regularized: f64 =
            regression_loss(&model, output.score, batch.similarity.clone(), 0.5)
                .into_scalar()
                .elem();
        assert!(regularized > plain);
    }
}
