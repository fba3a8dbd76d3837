// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// (and the data batcher, which produces the tensors).
//
// What's in this layer:
//
//   embedding.rs — embedding table construction, optionally
//                  from pretrained weights, plus the projector
//                  configuration for visualisation
//
//   encoder.rs   — the configurable (Bi)LSTM block with its
//                  summary and per-timestep read-outs
//
//   model.rs     — the base similarity variant and the
//                  SimilarityScorer strategy trait both
//                  variants implement
//
//   memory.rs    — the multi-hop episodic memory attention
//                  variant
//
//   metrics.rs   — exact and streaming Pearson/MSE statistics
//
//   stepper.rs   — the shared train/evaluate step executor:
//                  optimizer, global step counter, streaming
//                  accumulators, optional summaries
//
//   trainer.rs   — the epoch loop around the step executor
//
// Reference: Mueller & Thyagarajan (2016) siamese LSTM similarity
//            Kumar et al. (2016) Dynamic Memory Networks
//            Burn Book §3 (Building Blocks), §5 (Training)

/// Embedding table construction
pub mod embedding;

/// Configurable recurrent sequence encoder
pub mod encoder;

/// Base model variant and the scoring strategy trait
pub mod model;

/// Episodic memory attention variant
pub mod memory;

/// Exact and streaming similarity statistics
pub mod metrics;

/// Shared train/evaluate step executor
pub mod stepper;

/// Full training loop with validation and checkpointing
pub mod trainer;
