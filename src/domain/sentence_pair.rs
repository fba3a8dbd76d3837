// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================
// Represents one labelled example for similarity training:
//   - two sentences
//   - a real-valued relatedness score (the ground truth)
//
// The score scale is whatever the corpus uses (SICK uses
// [1, 5], STS uses [0, 5]); the model regresses the raw value
// and never rescales it.
//
// Reference: Marelli et al. (2014) SICK dataset
//            Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// A labelled sentence pair as read from the corpus, before
/// any cleaning or tokenisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentencePair {
    /// First sentence of the pair
    pub first: String,

    /// Second sentence of the pair
    pub second: String,

    /// Human-judged similarity/relatedness score
    pub score: f32,
}

impl SentencePair {
    /// Create a new SentencePair.
    /// Takes impl Into<String> so callers can pass &str or String.
    pub fn new(first: impl Into<String>, second: impl Into<String>, score: f32) -> Self {
        Self {
            first:  first.into(),
            second: second.into(),
            score,
        }
    }
}
