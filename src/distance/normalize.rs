// Linear rescaling of off-diagonal distances into a target range.
//
// Min and max are taken over computed off-diagonal cells only. The diagonal
// stays exactly 0 and not-computed cells stay not computed. When every
// off-diagonal distance is equal there is nothing to stretch and the matrix
// comes back unchanged.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::matrix::DistanceMatrix;
use crate::error::{AnalysisError, Result};

/// Target interval for normalized distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    pub low: f64,
    pub high: f64,
}

impl NormalizationRange {
    /// Full [0, 1] stretch.
    pub const UNIT: NormalizationRange = NormalizationRange {
        low: 0.0,
        high: 1.0,
    };

    /// [0.1, 0.9], which keeps off-diagonal cells visibly apart from the
    /// zero diagonal in heatmaps and dendrograms.
    pub const VISUAL: NormalizationRange = NormalizationRange {
        low: 0.1,
        high: 0.9,
    };

    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(AnalysisError::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }
}

impl Default for NormalizationRange {
    fn default() -> Self {
        Self::VISUAL
    }
}

/// Rescales distance matrices into a fixed range.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixNormalizer {
    pub range: NormalizationRange,
}

impl MatrixNormalizer {
    pub fn new(range: NormalizationRange) -> Self {
        Self { range }
    }

    /// A normalized copy of `matrix`.
    pub fn normalize(&self, matrix: &DistanceMatrix) -> DistanceMatrix {
        let values = matrix.off_diagonal_values();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if values.is_empty() || max == min {
            debug!(pairs = values.len(), "Degenerate matrix, skipping normalization");
            return matrix.clone();
        }

        let NormalizationRange { low, high } = self.range;
        let span = max - min;
        let cells: Vec<_> = matrix
            .upper_triangle()
            .map(|(i, j, v)| (i, j, v.map(|d| low + (high - low) * (d - min) / span)))
            .collect();
        DistanceMatrix::from_cells(matrix.labels().to_vec(), cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abcd() -> DistanceMatrix {
        let labels = ["A", "B", "C", "D"].map(String::from).to_vec();
        let rows = vec![
            vec![0.0, 0.42, 0.65, 0.58],
            vec![0.42, 0.0, 0.52, 0.37],
            vec![0.65, 0.52, 0.0, 0.30],
            vec![0.58, 0.37, 0.30, 0.0],
        ];
        DistanceMatrix::from_rows(labels, &rows).unwrap()
    }

    #[test]
    fn test_unit_range_endpoints() {
        let m = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&abcd());
        assert!((m.get(2, 3).unwrap() - 0.0).abs() < 1e-12);
        assert!((m.get(0, 2).unwrap() - 1.0).abs() < 1e-12);
        for i in 0..4 {
            assert_eq!(m.get(i, i), Some(0.0));
        }
    }

    #[test]
    fn test_visual_range_endpoints() {
        let m = MatrixNormalizer::default().normalize(&abcd());
        assert!((m.get(3, 2).unwrap() - 0.1).abs() < 1e-12);
        assert!((m.get(2, 0).unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_input_is_untouched() {
        let original = abcd();
        let _ = MatrixNormalizer::default().normalize(&original);
        assert_eq!(original, abcd());
    }

    #[test]
    fn test_degenerate_matrix_is_returned_unchanged() {
        let labels = ["A", "B", "C"].map(String::from).to_vec();
        let m = DistanceMatrix::from_cells(
            labels,
            [(0, 1, Some(0.7)), (0, 2, Some(0.7)), (1, 2, Some(0.7))],
        );
        assert_eq!(MatrixNormalizer::default().normalize(&m), m);
    }

    #[test]
    fn test_missing_cells_stay_missing() {
        let labels = ["A", "B", "C"].map(String::from).to_vec();
        let cells = [(0, 1, Some(0.2)), (0, 2, None), (1, 2, Some(0.6))];
        let m = DistanceMatrix::from_cells(labels, cells);
        let n = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&m);
        assert_eq!(n.get(0, 2), None);
        assert_eq!(n.get(0, 1), Some(0.0));
        assert_eq!(n.get(1, 2), Some(1.0));
    }

    #[test]
    fn test_invalid_range() {
        assert!(NormalizationRange::new(0.9, 0.1).is_err());
        assert!(NormalizationRange::new(0.0, f64::NAN).is_err());
        assert!(NormalizationRange::new(0.2, 0.8).is_ok());
    }
}
