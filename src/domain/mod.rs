// ============================================================
// Layer 3 — Domain Types
// ============================================================
// The vocabulary of the problem, with no ML or IO code:
//
//   sentence_pair.rs — a pair of sentences plus the human
//                      relatedness judgement we train against
//
//   traits.rs        — the PairSource abstraction so the
//                      application layer never depends on a
//                      concrete file format
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// A labelled sentence pair
pub mod sentence_pair;

/// Abstractions implemented by the data layer
pub mod traits;
