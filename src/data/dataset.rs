// ============================================================
// Layer 4 — Pair Dataset
// ============================================================
// Tokenised, padded training samples and the Burn Dataset
// implementation that feeds them to the DataLoader.
//
// Two encodings exist because the two model variants declare
// different input shapes:
//
//   paired  — [s1 tokens, padded to L] [SEP] [s2 tokens, padded to L]
//             total width is always 2*L + 1
//
//   packed  — s1 [SEP] s2 in one window of width L, with the
//             true (unpadded) length carried alongside so the
//             attention mask can ignore padding
//
// Both encodings TRUNCATE overlong sentences; the declared
// width is a hard contract checked again by the batcher.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

// Fixed by the vocabulary builder: id 0 is always [PAD].
const PAD_ID: u32 = 0;

/// One fully tokenised and padded sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSample {
    /// Token ids, padded to the declared sequence width
    pub tokens: Vec<u32>,

    /// Number of real (non-padding) tokens
    pub length: usize,

    /// Ground-truth similarity score
    pub similarity: f32,
}

/// Encode a pair for the base variant: each sentence in its own
/// half-window of width `sentence_len`, joined by a separator.
/// The resulting token sequence is always `2*sentence_len + 1` wide.
pub fn encode_paired(
    tokenizer:    &Tokenizer,
    first:        &str,
    second:       &str,
    similarity:   f32,
    sentence_len: usize,
) -> Result<PairSample> {
    let sep = separator_id(tokenizer)?;

    let mut tokens = sentence_ids(tokenizer, first, sentence_len)?;
    tokens.push(sep);
    tokens.extend(sentence_ids(tokenizer, second, sentence_len)?);

    let width = 2 * sentence_len + 1;
    debug_assert_eq!(tokens.len(), width);

    Ok(PairSample {
        tokens,
        length: width,
        similarity,
    })
}

/// Encode a pair for the attention variant: both sentences packed
/// into a single window of width `sequence_len`, separator between
/// them, true length recorded for attention masking.
pub fn encode_packed(
    tokenizer:    &Tokenizer,
    first:        &str,
    second:       &str,
    similarity:   f32,
    sequence_len: usize,
) -> Result<PairSample> {
    let sep = separator_id(tokenizer)?;

    let mut tokens = encode_ids(tokenizer, first)?;
    tokens.push(sep);
    tokens.extend(encode_ids(tokenizer, second)?);

    tokens.truncate(sequence_len);
    let length = tokens.len();
    while tokens.len() < sequence_len {
        tokens.push(PAD_ID);
    }

    Ok(PairSample {
        tokens,
        length,
        similarity,
    })
}

/// Tokenise one sentence and force it to exactly `len` ids
/// (truncate long, pad short).
fn sentence_ids(tokenizer: &Tokenizer, text: &str, len: usize) -> Result<Vec<u32>> {
    let mut ids = encode_ids(tokenizer, text)?;
    ids.truncate(len);
    while ids.len() < len {
        ids.push(PAD_ID);
    }
    Ok(ids)
}

fn encode_ids(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    Ok(encoding.get_ids().to_vec())
}

fn separator_id(tokenizer: &Tokenizer) -> Result<u32> {
    tokenizer
        .token_to_id("[SEP]")
        .context("Vocabulary has no [SEP] token")
}

// ─── PairDataset ──────────────────────────────────────────────────────────────
pub struct PairDataset {
    samples: Vec<PairSample>,
}

impl PairDataset {
    pub fn new(samples: Vec<PairSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<PairSample> for PairDataset {
    fn get(&self, index: usize) -> Option<PairSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::vocab_store::VocabStore;

    fn test_tokenizer() -> Tokenizer {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let corpus = vec![
            "a man is walking down the road".to_string(),
            "two dogs play in the park".to_string(),
        ];
        store.load_or_build(&corpus).unwrap()
    }

    #[test]
    fn test_paired_width_is_invariant() {
        let tok = test_tokenizer();
        let s = encode_paired(&tok, "a man is walking", "two dogs play", 0.8, 5).unwrap();
        // 2*5 + 1 regardless of the actual sentence lengths
        assert_eq!(s.tokens.len(), 11);
        assert_eq!(s.length, 11);
    }

    #[test]
    fn test_paired_separator_position() {
        let tok = test_tokenizer();
        let sep = tok.token_to_id("[SEP]").unwrap();
        let s = encode_paired(&tok, "a man", "two dogs", 0.5, 4).unwrap();
        assert_eq!(s.tokens[4], sep);
    }

    #[test]
    fn test_paired_truncates_long_sentence() {
        let tok = test_tokenizer();
        let s = encode_paired(&tok, "a man is walking down the road", "dogs", 0.1, 3).unwrap();
        assert_eq!(s.tokens.len(), 7);
    }

    #[test]
    fn test_packed_records_true_length() {
        let tok = test_tokenizer();
        let s = encode_packed(&tok, "a man", "two dogs", 0.9, 12).unwrap();
        // 2 + 1 (separator) + 2 real tokens, rest padding
        assert_eq!(s.length, 5);
        assert_eq!(s.tokens.len(), 12);
        assert!(s.tokens[5..].iter().all(|&t| t == PAD_ID));
    }

    #[test]
    fn test_packed_truncates_to_window() {
        let tok = test_tokenizer();
        let s = encode_packed(&tok, "a man is walking down the road", "two dogs play", 0.2, 6).unwrap();
        assert_eq!(s.tokens.len(), 6);
        assert_eq!(s.length, 6);
    }
}
