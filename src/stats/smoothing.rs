//! Smoothing and Density Estimation
//! Savitzky-Golay smoothing and histogram-based density curves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest polynomial order supported by the closed-form weights.
pub const MAX_POLY_ORDER: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistogramError {
    #[error("histogram needs at least one bin")]
    NoBins,
    #[error("no values to bin")]
    NoValues,
    #[error("value {0} is not finite")]
    NonFinite(f64),
    #[error("every value equals {0}")]
    Degenerate(f64),
}

/// Savitzky-Golay convolution weights for a centred window.
///
/// Orders 0 and 1 reduce to a moving average; orders 2 and 3 share the
/// closed-form quadratic weights. Returns `None` for an even or empty window
/// and for orders above [`MAX_POLY_ORDER`].
pub fn savgol_coefficients(window: usize, poly_order: usize) -> Option<Vec<f64>> {
    if window % 2 == 0 || poly_order > MAX_POLY_ORDER {
        return None;
    }
    if poly_order < 2 || window < 3 {
        return Some(vec![1.0 / window as f64; window]);
    }

    let half = (window / 2) as f64;
    let norm = (2.0 * half - 1.0) * (2.0 * half + 1.0) * (2.0 * half + 3.0);
    let weights = (0..window)
        .map(|k| {
            let i = k as f64 - half;
            3.0 * (3.0 * half * half + 3.0 * half - 1.0 - 5.0 * i * i) / norm
        })
        .collect();
    Some(weights)
}

/// Smooth `values` with a Savitzky-Golay filter.
///
/// The window is shrunk to the largest odd length that fits the input; inputs
/// shorter than three points are returned unchanged. Edges repeat the nearest value.
/// Returns `None` when `poly_order` exceeds [`MAX_POLY_ORDER`].
pub fn savgol_smooth(values: &[f64], window: usize, poly_order: usize) -> Option<Vec<f64>> {
    if poly_order > MAX_POLY_ORDER {
        return None;
    }
    let n = values.len();
    let mut window = window.min(n);
    if window % 2 == 0 {
        window = window.saturating_sub(1);
    }
    if window < 3 {
        return Some(values.to_vec());
    }

    let weights = savgol_coefficients(window, poly_order)?;
    let half = (window / 2) as isize;
    let last = n as isize - 1;

    let smoothed = (0..n as isize)
        .map(|i| {
            weights
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let j = (i + k as isize - half).clamp(0, last) as usize;
                    w * values[j]
                })
                .sum::<f64>()
        })
        .collect();
    Some(smoothed)
}

/// Equal-width histogram over `[min, max]`; the last bin is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBins {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl HistogramBins {
    /// Bin `values` into `bins` buckets.
    pub fn new(values: &[f64], bins: usize) -> Result<Self, HistogramError> {
        if bins == 0 {
            return Err(HistogramError::NoBins);
        }
        if values.is_empty() {
            return Err(HistogramError::NoValues);
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(HistogramError::NonFinite(bad));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == min {
            return Err(HistogramError::Degenerate(min));
        }
        let width = (max - min) / bins as f64;

        let edges = (0..=bins).map(|i| min + i as f64 * width).collect();
        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Ok(Self { edges, counts })
    }

    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn centres(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// Probability density per bin: `count / (n * width)`. Integrates to one.
    pub fn density(&self) -> Vec<f64> {
        let scale = self.total() as f64 * self.bin_width();
        self.counts.iter().map(|&c| c as f64 / scale).collect()
    }

    /// Density at bin centres, smoothed and clipped at zero.
    pub fn smoothed_density(&self, window: usize, poly_order: usize) -> Option<Vec<(f64, f64)>> {
        let smoothed = savgol_smooth(&self.density(), window, poly_order)?;
        let points = self
            .centres()
            .into_iter()
            .zip(smoothed)
            .map(|(x, y)| (x, y.max(0.0)))
            .collect();
        Some(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_savgol_window_five_quadratic() {
        let weights = savgol_coefficients(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|w| w / 35.0);
        for (w, e) in weights.iter().zip(expected) {
            assert!(close(*w, e));
        }
    }

    #[test]
    fn test_savgol_weights_sum_to_one() {
        for window in [3, 5, 7, 9, 11] {
            for order in 0..=3 {
                let sum: f64 = savgol_coefficients(window, order).unwrap().iter().sum();
                assert!(close(sum, 1.0), "window {window} order {order}: {sum}");
            }
        }
    }

    #[test]
    fn test_smooth_preserves_quadratic_interior() {
        let values: Vec<f64> = (0..12).map(|x| (x * x) as f64).collect();
        let smoothed = savgol_smooth(&values, 5, 2).unwrap();

        for i in 2..10 {
            assert!(close(smoothed[i], values[i]));
        }
    }

    #[test]
    fn test_smooth_constant_signal() {
        let smoothed = savgol_smooth(&[3.0; 8], 7, 3).unwrap();
        assert!(smoothed.iter().all(|&v| close(v, 3.0)));
    }

    #[test]
    fn test_savgol_rejects_unsupported_inputs() {
        assert!(savgol_coefficients(4, 2).is_none());
        assert!(savgol_coefficients(0, 0).is_none());
        assert!(savgol_coefficients(5, 4).is_none());
        assert!(savgol_smooth(&[1.0; 10], 5, 4).is_none());
        assert!(HistogramBins::new(&[1.0, 2.0, 3.0], 2)
            .unwrap()
            .smoothed_density(5, 7)
            .is_none());
    }

    #[test]
    fn test_smooth_short_input_unchanged() {
        assert_eq!(savgol_smooth(&[1.0, 5.0], 5, 2), Some(vec![1.0, 5.0]));
        assert_eq!(savgol_smooth(&[], 5, 2), Some(Vec::new()));
    }

    #[test]
    fn test_smooth_shrinks_window() {
        let smoothed = savgol_smooth(&[1.0, 2.0, 3.0, 4.0], 9, 0).unwrap();
        assert_eq!(smoothed.len(), 4);
        // window shrinks to 3: edge uses repeated first value
        assert!(close(smoothed[0], (1.0 + 1.0 + 2.0) / 3.0));
    }

    #[test]
    fn test_histogram_counts() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let hist = HistogramBins::new(&values, 5).unwrap();

        assert_eq!(hist.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 3]);
        assert_eq!(hist.total(), values.len());
        assert_eq!(hist.centres(), vec![1.0, 3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 7.0).collect();
        let hist = HistogramBins::new(&values, 12).unwrap();
        let area: f64 = hist.density().iter().map(|d| d * hist.bin_width()).sum();

        assert!(close(area, 1.0));
    }

    #[test]
    fn test_smoothed_density_non_negative() {
        let values = [0.0, 0.1, 0.2, 5.0, 9.8, 9.9, 10.0];
        let hist = HistogramBins::new(&values, 10).unwrap();
        let curve = hist.smoothed_density(5, 2).unwrap();

        assert_eq!(curve.len(), 10);
        assert!(curve.iter().all(|&(_, y)| y >= 0.0));
    }

    #[test]
    fn test_histogram_errors() {
        assert_eq!(
            HistogramBins::new(&[4.0, 4.0, 4.0], 10),
            Err(HistogramError::Degenerate(4.0))
        );
        assert_eq!(HistogramBins::new(&[], 10), Err(HistogramError::NoValues));
        assert_eq!(HistogramBins::new(&[1.0, 2.0], 0), Err(HistogramError::NoBins));
        assert_eq!(
            HistogramBins::new(&[1.0, f64::INFINITY], 4),
            Err(HistogramError::NonFinite(f64::INFINITY))
        );
    }
}
