// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer is written against this trait instead
// of a concrete loader, so a different corpus format can be
// swapped in without touching the training workflow:
//   - TsvLoader          → tab-separated pair files
//   - (future) CsvLoader → comma-separated exports
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::sentence_pair::SentencePair;

// ─── PairSource ───────────────────────────────────────────────────────────────
/// Any component that can produce labelled sentence pairs.
pub trait PairSource {
    /// Load every labelled pair from this source.
    fn load_all(&self) -> Result<Vec<SentencePair>>;
}
