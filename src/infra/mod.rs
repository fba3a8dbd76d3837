// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   vocab_store.rs — word-level vocabulary persistence.
//                    Builds a vocabulary from the pair corpus
//                    if none exists, or loads the saved one, so
//                    training and evaluation always agree on
//                    token ids. Also writes the metadata.tsv
//                    the projector registration points at.
//
//   checkpoint.rs  — saving and loading model weights with
//                    Burn's CompactRecorder, plus the training
//                    config JSON needed to rebuild the exact
//                    architecture at evaluation time.
//
//   summary.rs     — per-step scalar summaries (loss, pearson,
//                    mse) as separate training and validation
//                    streams, plus the embedding-projector
//                    registration. Attached to the step runner
//                    as an optional collaborator.
//
//   metrics.rs     — per-epoch metrics CSV for plotting
//                    learning curves.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Vocabulary building, saving, and loading
pub mod vocab_store;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Per-step scalar summary streams
pub mod summary;

/// Per-epoch training metrics CSV logger
pub mod metrics;
