// ============================================================
// Layer 4 — Sentence Preprocessor
// ============================================================
// Cleans raw sentence text before tokenisation.
//
// Similarity corpora collected from the web carry the usual
// junk: non-breaking spaces, zero-width characters, stray
// control bytes, doubled spaces. The tokenizer would otherwise
// waste vocabulary slots on whitespace variants.
//
// Cleaning steps (applied in order):
//   1. Replace Unicode whitespace variants with plain space
//   2. Remove invisible control characters
//   3. Collapse multiple consecutive spaces into one
//   4. Trim leading/trailing whitespace
//
// Lowercasing is NOT done here — the vocabulary's normalizer
// owns case folding, so cleaning stays reversible for display.
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    /// Create a new Preprocessor instance
    pub fn new() -> Self {
        Self
    }

    /// Clean one raw sentence for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: Normalise individual characters ───────────────────────────
        let normalised: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                // Sentences are single lines; newlines become spaces too
                '\r' | '\n' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();

        // ── Step 2: Collapse runs of spaces ───────────────────────────────────
        let mut out        = String::with_capacity(normalised.len());
        let mut last_space = false;

        for c in normalised.chars() {
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.trim().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("two   dogs   play"), "two dogs play");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  a man runs  "), "a man runs");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello\x01world"), "hello world");
    }

    #[test]
    fn test_flattens_newlines() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("first\nsecond"), "first second");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }
}
