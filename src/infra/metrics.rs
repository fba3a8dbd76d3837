// ============================================================
// Layer 6 — Epoch Metrics Logger
// ============================================================
// Records one CSV row per training epoch so learning curves can
// be plotted and runs compared.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: average training loss over the epoch's batches
//   - val_loss:   average validation loss
//   - pearson:    streaming Pearson correlation over the whole
//                 validation pass
//   - mse:        streaming mean squared error over the whole
//                 validation pass
//
// Output file: {checkpoint_dir}/metrics.csv
//
// If val_loss falls while pearson stalls, the model is fitting
// the score scale, not the ranking — both columns matter.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics data for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Average loss over all training batches of the epoch
    pub train_loss: f64,

    /// Average loss over all validation batches
    pub val_loss: f64,

    /// Dataset-wide Pearson correlation on validation
    pub pearson: f64,

    /// Dataset-wide mean squared error on validation
    pub mse: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, pearson: f64, mse: f64) -> Self {
        Self { epoch, train_loss, val_loss, pearson, mse }
    }

    /// True if this epoch beat the previous best validation loss.
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header if the file is
    /// new (appending across runs is intentional).
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,pearson,mse")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_loss, m.pearson, m.mse,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}, pearson={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.pearson,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 0.8, 0.6, 0.4, 0.6);
        assert!(m.is_improvement(0.7));
        assert!(!m.is_improvement(0.5));
    }

    #[test]
    fn test_rows_append() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_str().unwrap()).unwrap();

        logger.log(&EpochMetrics::new(1, 1.0, 1.1, 0.1, 1.1)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.8, 0.9, 0.3, 0.9)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
