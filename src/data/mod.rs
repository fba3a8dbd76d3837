// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw corpus file and GPU-ready
// tensor batches:
//
//   .tsv pair file
//       │
//       ▼
//   TsvLoader         → reads lines, parses (s1, s2, score)
//       │
//       ▼
//   Preprocessor      → cleans sentence text
//       │
//       ▼
//   Vocabulary        → converts words to token ID numbers
//       │                (built/loaded by infra::vocab_store)
//       ▼
//   PairDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   PairBatcher       → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads labelled sentence pairs from tab-separated files
pub mod loader;

/// Cleans and normalises raw sentence text
pub mod preprocessor;

/// Tokenised samples and Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
