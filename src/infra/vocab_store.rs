// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds a word-level vocabulary from the pair corpus and
// persists it as a tokenizers JSON file, so the exact same
// token ids are used for training and evaluation.
//
// The vocabulary JSON is written directly in the HuggingFace
// format that Tokenizer::from_file() expects, which sidesteps
// the trainer-model type friction in the tokenizers crate for
// the word-level case.
//
// Special tokens have fixed ids the rest of the system relies
// on:
//   [PAD] = 0   padding (also the embedding row padding maps to)
//   [UNK] = 1   out-of-vocabulary words
//   [SEP] = 2   the separator between the two sentences
//
// A metadata.tsv (one token per line, ordered by id) is written
// alongside for the embedding-projector registration.
//
// Reference: tokenizers crate documentation

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tokenizers::Tokenizer;

/// Token reserved for padding, id 0.
pub const PAD_TOKEN: &str = "[PAD]";
/// Token reserved for out-of-vocabulary words, id 1.
pub const UNK_TOKEN: &str = "[UNK]";
/// Token separating the two sentences of a pair, id 2.
pub const SEP_TOKEN: &str = "[SEP]";

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    /// Load the existing vocabulary or build a new one from the
    /// corpus sentences.
    pub fn load_or_build(&self, sentences: &[String]) -> Result<Tokenizer> {
        let path = self.dir.join("vocab.json");
        if path.exists() {
            tracing::info!("Loading existing vocabulary from disk");
            self.load()
        } else {
            tracing::info!("Building new vocabulary from {} sentences", sentences.len());
            self.build_and_save(sentences)
        }
    }

    /// Load a previously saved vocabulary.
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join("vocab.json");
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot load vocabulary from '{}': {}", path.display(), e))
    }

    /// Path of the metadata file written next to the vocabulary.
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join("metadata.tsv")
    }

    fn build_and_save(&self, sentences: &[String]) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();

        // ── Step 1: Count word frequencies ────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for sentence in sentences {
            for word in sentence.split_whitespace() {
                let w = word.to_lowercase();
                let w = w.trim_matches(|c: char| !c.is_alphanumeric());
                if !w.is_empty() {
                    *freq.entry(w.to_string()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent words get the smallest ids after the
        // three reserved slots
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        // ── Step 2: Assemble the vocab mapping ────────────────────────────────
        let mut vocab = serde_json::json!({
            PAD_TOKEN: 0,
            UNK_TOKEN: 1,
            SEP_TOKEN: 2,
        });

        let mut ordered: Vec<String> = vec![
            PAD_TOKEN.to_string(),
            UNK_TOKEN.to_string(),
            SEP_TOKEN.to_string(),
        ];
        let mut next_id = 3usize;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                ordered.push(word.clone());
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": PAD_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": UNK_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 2, "content": SEP_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.dir.join("vocab.json");
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;

        // ── Step 4: Write projector metadata (one token per id) ───────────────
        let metadata = ordered.join("\n") + "\n";
        std::fs::write(self.metadata_path(), metadata)
            .with_context(|| "Cannot write metadata.tsv")?;

        tracing::info!(
            "Vocabulary built with {} entries, saved to '{}'",
            next_id,
            path.display()
        );

        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot reload vocabulary: {e}"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "a man is walking".to_string(),
            "a man is running".to_string(),
        ]
    }

    #[test]
    fn test_special_token_ids_are_fixed() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let tok   = store.load_or_build(&corpus()).unwrap();

        assert_eq!(tok.token_to_id(PAD_TOKEN), Some(0));
        assert_eq!(tok.token_to_id(UNK_TOKEN), Some(1));
        assert_eq!(tok.token_to_id(SEP_TOKEN), Some(2));
    }

    #[test]
    fn test_round_trip_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let built  = store.load_or_build(&corpus()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(
            built.get_vocab_size(true),
            loaded.get_vocab_size(true),
        );
    }

    #[test]
    fn test_metadata_covers_every_id() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let tok   = store.load_or_build(&corpus()).unwrap();

        let metadata = std::fs::read_to_string(store.metadata_path()).unwrap();
        assert_eq!(metadata.lines().count(), tok.get_vocab_size(true));
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path().to_str().unwrap());
        let tok   = store.load_or_build(&corpus()).unwrap();

        let enc = tok.encode("zzzunseen", false).unwrap();
        assert_eq!(enc.get_ids(), &[1]);
    }
}
