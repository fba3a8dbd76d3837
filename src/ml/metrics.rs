// ============================================================
// Layer 5 — Similarity Statistics
// ============================================================
// Two flavours of the same two statistics:
//
//   pearson / mean_squared_error
//     — exact, batch-local, recomputed fresh from raw
//       predictions and labels on every call. These are what
//       the step executor RETURNS.
//
//   StreamingPearson / StreamingMse
//     — running accumulators whose state persists across step
//       calls. One update per evaluation step; reading the
//       value never advances the state; `reset` starts a fresh
//       accumulation window (e.g. per epoch).
//
// The two are NOT numerically interchangeable: the streaming
// value reflects every batch since the last reset, the batch
// value only the current one.
//
// A zero-variance input makes the correlation undefined; both
// flavours return NaN in that case and nothing here suppresses
// it.
//
// Reference: Pearson (1895); Welford-style sufficient statistics

/// Exact Pearson correlation coefficient over two equal-length
/// slices. NaN when either side has zero variance or the slices
/// are empty.
pub fn pearson(x: &[f32], y: &[f32]) -> f64 {
    assert_eq!(x.len(), y.len(), "correlation inputs must be equal length");
    let mut acc = StreamingPearson::default();
    acc.update(x, y);
    acc.value()
}

/// Exact mean squared error over two equal-length slices.
/// NaN on empty input.
pub fn mean_squared_error(x: &[f32], y: &[f32]) -> f64 {
    assert_eq!(x.len(), y.len(), "error inputs must be equal length");
    let mut acc = StreamingMse::default();
    acc.update(x, y);
    acc.value()
}

// ─── StreamingPearson ─────────────────────────────────────────────────────────
/// Running Pearson correlation over everything fed in since the
/// last reset. Keeps the six sufficient statistics rather than
/// the samples themselves, so memory is constant.
#[derive(Debug, Clone, Default)]
pub struct StreamingPearson {
    n:      u64,
    sum_x:  f64,
    sum_y:  f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
}

impl StreamingPearson {
    /// Fold one batch into the accumulator.
    pub fn update(&mut self, x: &[f32], y: &[f32]) {
        assert_eq!(x.len(), y.len(), "correlation inputs must be equal length");
        for (&a, &b) in x.iter().zip(y.iter()) {
            let (a, b) = (a as f64, b as f64);
            self.n += 1;
            self.sum_x  += a;
            self.sum_y  += b;
            self.sum_xx += a * a;
            self.sum_yy += b * b;
            self.sum_xy += a * b;
        }
    }

    /// Correlation over everything accumulated so far. Reading
    /// does not advance the state. NaN when undefined.
    pub fn value(&self) -> f64 {
        let n = self.n as f64;
        let cov   = n * self.sum_xy - self.sum_x * self.sum_y;
        let var_x = n * self.sum_xx - self.sum_x * self.sum_x;
        let var_y = n * self.sum_yy - self.sum_y * self.sum_y;
        cov / (var_x * var_y).sqrt()
    }

    /// Number of individual samples folded in since the last reset.
    pub fn count(&self) -> u64 {
        self.n
    }

    /// Start a fresh accumulation window.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── StreamingMse ─────────────────────────────────────────────────────────────
/// Running mean squared error since the last reset.
#[derive(Debug, Clone, Default)]
pub struct StreamingMse {
    n:     u64,
    total: f64,
}

impl StreamingMse {
    pub fn update(&mut self, x: &[f32], y: &[f32]) {
        assert_eq!(x.len(), y.len(), "error inputs must be equal length");
        for (&a, &b) in x.iter().zip(y.iter()) {
            let d = a as f64 - b as f64;
            self.n += 1;
            self.total += d * d;
        }
    }

    pub fn value(&self) -> f64 {
        self.total / self.n as f64
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_positive_correlation() {
        let r = pearson(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]);
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!((r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_input_is_nan() {
        // Zero variance: undefined correlation, propagated as NaN
        let r = pearson(&[1.0, 1.0, 1.0], &[0.2, 0.5, 0.9]);
        assert!(r.is_nan());
    }

    #[test]
    fn test_mse_known_value() {
        let e = mean_squared_error(&[1.0, 2.0], &[2.0, 4.0]);
        assert!((e - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_streaming_matches_batch_over_windows() {
        // Feeding two halves must equal one exact pass over the whole
        let x = [0.1f32, 0.9, 0.4, 0.7, 0.2, 0.6];
        let y = [0.2f32, 0.8, 0.5, 0.9, 0.1, 0.5];

        let mut acc = StreamingPearson::default();
        acc.update(&x[..3], &y[..3]);
        acc.update(&x[3..], &y[3..]);

        assert!((acc.value() - pearson(&x, &y)).abs() < 1e-9);
        assert_eq!(acc.count(), 6);
    }

    #[test]
    fn test_reading_does_not_advance() {
        let mut acc = StreamingMse::default();
        acc.update(&[1.0], &[3.0]);
        let first  = acc.value();
        let second = acc.value();
        assert_eq!(first, second);
        assert_eq!(acc.count(), 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut acc = StreamingPearson::default();
        acc.update(&[1.0, 2.0], &[2.0, 1.0]);
        acc.reset();
        assert_eq!(acc.count(), 0);
        assert!(acc.value().is_nan());
    }
}
