// ============================================================
// Layer 5 — Embedding Builder
// ============================================================
// Builds the token embedding table the models look up into.
//
// Two initialisation paths:
//   - random (Burn's default initializer) when no pretrained
//     weights are given
//   - a pretrained matrix loaded from a JSON file of shape
//     [vocab_size][embedding_dim] (e.g. exported GloVe rows,
//     one per vocabulary id)
//
// A pretrained matrix whose shape disagrees with the vocabulary
// is a hard error — silently truncating would desynchronise
// token ids from their vectors.
//
// The builder also returns the projector configuration that
// ties the embedding space to the vocabulary metadata file for
// visualisation (see infra::summary).
//
// Reference: Pennington et al. (2014) GloVe
//            Burn Book §3 (Building Blocks)

use anyhow::{bail, Context, Result};
use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Links the embedding table to the vocabulary metadata file so
/// the summary writer can register it for visualisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectorConfig {
    /// Path of the metadata.tsv written by the vocabulary store
    pub metadata_path: String,
}

/// Build the embedding table, optionally from pretrained weights.
pub fn build_embedding<B: Backend>(
    vocab_size:    usize,
    embedding_dim: usize,
    pretrained:    Option<&[Vec<f32>]>,
    device:        &B::Device,
) -> Result<Embedding<B>> {
    let mut embedding = EmbeddingConfig::new(vocab_size, embedding_dim).init(device);

    if let Some(rows) = pretrained {
        if rows.len() != vocab_size {
            bail!(
                "Pretrained embedding has {} rows but the vocabulary has {} entries",
                rows.len(),
                vocab_size,
            );
        }
        let mut flat = Vec::with_capacity(vocab_size * embedding_dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != embedding_dim {
                bail!(
                    "Pretrained embedding row {} has width {} but embedding_dim is {}",
                    i,
                    row.len(),
                    embedding_dim,
                );
            }
            flat.extend_from_slice(row);
        }

        let weights = Tensor::<B, 1>::from_floats(flat.as_slice(), device)
            .reshape([vocab_size, embedding_dim]);
        embedding.weight = Param::from_tensor(weights);
        tracing::info!(
            "Embedding initialised from pretrained weights ({} x {})",
            vocab_size,
            embedding_dim
        );
    }

    Ok(embedding)
}

/// Load a pretrained embedding matrix from a JSON file holding
/// `[[f32; embedding_dim]; vocab_size]`.
pub fn load_pretrained_weights(path: impl AsRef<Path>) -> Result<Vec<Vec<f32>>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read embedding weights '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("'{}' is not a JSON matrix of floats", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_random_init_shape() {
        let device = Default::default();
        let emb = build_embedding::<TestBackend>(12, 4, None, &device).unwrap();
        assert_eq!(emb.weight.val().dims(), [12, 4]);
    }

    #[test]
    fn test_pretrained_rows_are_used() {
        let device = Default::default();
        let rows   = vec![vec![0.0f32, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]];
        let emb = build_embedding::<TestBackend>(3, 2, Some(&rows), &device).unwrap();

        let data: Vec<f32> = emb.weight.val().into_data().to_vec().unwrap();
        assert_eq!(data, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_row_count_mismatch_fails() {
        let device = Default::default();
        let rows   = vec![vec![0.0f32, 1.0]];
        let result = build_embedding::<TestBackend>(3, 2, Some(&rows), &device);
        assert!(result.is_err());
    }

    #[test]
    fn test_row_width_mismatch_fails() {
        let device = Default::default();
        let rows   = vec![vec![0.0f32], vec![1.0], vec![2.0]];
        let result = build_embedding::<TestBackend>(3, 2, Some(&rows), &device);
        assert!(result.is_err());
    }
}
