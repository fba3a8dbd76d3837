// ============================================================
// Layer 4 — Pair File Loader
// ============================================================
// Loads labelled sentence pairs from a tab-separated file.
//
// Expected line format (SICK/STS style):
//
//   sentence one<TAB>sentence two<TAB>score
//
// Lines that do not have three fields, or whose score does not
// parse as a float, are skipped with a warning rather than
// aborting the run — a handful of malformed rows is normal in
// crowd-sourced similarity corpora.
//
// Reference: Marelli et al. (2014) SICK dataset
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::PairSource;

/// Loads every labelled pair from a single .tsv file.
/// Implements the PairSource trait from Layer 3.
pub struct TsvLoader {
    /// Path to the tab-separated pair file
    path: String,
}

impl TsvLoader {
    /// Create a new TsvLoader pointed at a pair file
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl PairSource for TsvLoader {
    fn load_all(&self) -> Result<Vec<SentencePair>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read pair file '{}'", self.path))?;

        let mut pairs   = Vec::new();
        let mut skipped = 0usize;

        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some(pair) => pairs.push(pair),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        "Skipping malformed line {} in '{}'",
                        lineno + 1,
                        self.path
                    );
                }
            }
        }

        tracing::info!(
            "Loaded {} sentence pairs from '{}' ({} skipped)",
            pairs.len(),
            self.path,
            skipped
        );
        Ok(pairs)
    }
}

/// Parse one "s1 TAB s2 TAB score" line. Returns None on any
/// structural problem so the caller can decide what to do.
fn parse_line(line: &str) -> Option<SentencePair> {
    let mut fields = line.split('\t');
    let first  = fields.next()?.trim();
    let second = fields.next()?.trim();
    let score  = fields.next()?.trim().parse::<f32>().ok()?;

    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some(SentencePair::new(first, second, score))
}

/// Load a context-seed vector from a JSON file (a flat array of
/// floats). The attention variant seeds its episodic memory with
/// this vector; it has no default, so a missing or malformed
/// file is a hard error.
pub fn load_context_seed(path: impl AsRef<Path>) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read context seed '{}'", path.display()))?;
    let seed: Vec<f32> = serde_json::from_str(&json)
        .with_context(|| format!("Context seed '{}' is not a JSON float array", path.display()))?;
    Ok(seed)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_valid_line() {
        let pair = parse_line("a man is walking\ta person walks\t4.2").unwrap();
        assert_eq!(pair.first, "a man is walking");
        assert_eq!(pair.second, "a person walks");
        assert!((pair.score - 4.2).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_missing_field() {
        assert!(parse_line("only one sentence\t3.0").is_none());
    }

    #[test]
    fn test_rejects_bad_score() {
        assert!(parse_line("a\tb\tnot-a-number").is_none());
    }

    #[test]
    fn test_rejects_empty_sentence() {
        assert!(parse_line("\tb\t1.0").is_none());
    }
}
