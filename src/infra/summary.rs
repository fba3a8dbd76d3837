// ============================================================
// Layer 6 — Scalar Summary Streams
// ============================================================
// Per-step instrumentation the step runner writes through when
// (and only when) a writer is attached. Two independent
// streams, each its own CSV file keyed by global step:
//
//   train_summary.csv       — one row per training step
//   validation_summary.csv  — one row per evaluation step
//
// Both carry (step, loss, pearson, mse). Appending keyed by
// step means a resumed run keeps extending the same curves.
//
// register_embeddings ties the embedding space to the
// vocabulary metadata file by writing a projector_config.json
// into the summary directory, so an external viewer can label
// each embedding row with its token.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::ml::embedding::ProjectorConfig;

pub struct SummaryWriter {
    dir:        PathBuf,
    train_path: PathBuf,
    val_path:   PathBuf,
}

impl SummaryWriter {
    /// Create the summary directory and both stream files
    /// (headers written only when a file is new, so curves
    /// survive restarts).
    pub fn create(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create summary directory '{}'", dir.display()))?;

        let train_path = dir.join("train_summary.csv");
        let val_path   = dir.join("validation_summary.csv");

        for path in [&train_path, &val_path] {
            if !path.exists() {
                let mut f = fs::File::create(path)?;
                writeln!(f, "step,loss,pearson,mse")?;
            }
        }

        Ok(Self { dir, train_path, val_path })
    }

    /// Append one training-stream record keyed by global step.
    pub fn training_scalars(&self, step: u64, loss: f64, pearson: f64, mse: f64) -> Result<()> {
        append_row(&self.train_path, step, loss, pearson, mse)
    }

    /// Append one validation-stream record keyed by global step.
    pub fn validation_scalars(&self, step: u64, loss: f64, pearson: f64, mse: f64) -> Result<()> {
        append_row(&self.val_path, step, loss, pearson, mse)
    }

    /// Register the embedding space for visualisation: point the
    /// projector at the vocabulary metadata file.
    pub fn register_embeddings(&self, projector: &ProjectorConfig) -> Result<()> {
        let path = self.dir.join("projector_config.json");
        fs::write(&path, serde_json::to_string_pretty(projector)?)
            .with_context(|| format!("Cannot write projector config '{}'", path.display()))?;

        tracing::debug!("Registered embedding projector at '{}'", path.display());
        Ok(())
    }
}

fn append_row(path: &PathBuf, step: u64, loss: f64, pearson: f64, mse: f64) -> Result<()> {
    let mut f = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot append to summary '{}'", path.display()))?;

    writeln!(f, "{},{:.6},{:.6},{:.6}", step, loss, pearson, mse)?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_are_separate_files() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = SummaryWriter::create(dir.path().to_str().unwrap()).unwrap();

        writer.training_scalars(1, 0.5, 0.1, 0.5).unwrap();
        writer.training_scalars(2, 0.4, 0.2, 0.4).unwrap();
        writer.validation_scalars(2, 0.45, 0.15, 0.45).unwrap();

        let train = fs::read_to_string(dir.path().join("train_summary.csv")).unwrap();
        let val   = fs::read_to_string(dir.path().join("validation_summary.csv")).unwrap();

        // Header plus two training rows, header plus one validation row
        assert_eq!(train.lines().count(), 3);
        assert_eq!(val.lines().count(), 2);
        assert!(train.lines().nth(1).unwrap().starts_with("1,"));
    }

    #[test]
    fn test_projector_registration() {
        let dir    = tempfile::tempdir().unwrap();
        let writer = SummaryWriter::create(dir.path().to_str().unwrap()).unwrap();

        let projector = ProjectorConfig { metadata_path: "checkpoints/metadata.tsv".into() };
        writer.register_embeddings(&projector).unwrap();

        let json = fs::read_to_string(dir.path().join("projector_config.json")).unwrap();
        assert!(json.contains("metadata.tsv"));
    }
}
