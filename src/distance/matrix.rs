// Symmetric corpus distance matrix and the builder that fills it.
//
// Each unordered pair of corpora is measured exactly once and the value is
// mirrored, so symmetry holds by construction. Real compressors are not
// perfectly order-invariant (NCD(x, y) and NCD(y, x) can differ slightly);
// this matrix records the (lower index, higher index) direction only.

use serde::Serialize;
use tracing::{debug, warn};

use super::ncd::NcdCalculator;
use crate::compression::Compressor;
use crate::corpus::Corpus;
use crate::error::{AnalysisError, Result};

/// Default number of batches taken from each corpus of a pair.
pub const DEFAULT_MAX_COMPARISONS: usize = 10;

/// N×N symmetric distances with a zero diagonal. `None` marks a pair whose
/// distance could not be computed, which is distinct from a true 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    cells: Vec<Option<f64>>,
}

impl DistanceMatrix {
    /// A matrix with a zero diagonal and every other cell not computed.
    pub fn empty(labels: Vec<String>) -> Self {
        let n = labels.len();
        let mut cells = vec![None; n * n];
        for i in 0..n {
            cells[i * n + i] = Some(0.0);
        }
        Self { labels, cells }
    }

    /// Assemble a matrix from write-once upper-triangle cells `(i, j, value)`
    /// with `i != j`. Each value is mirrored; diagonal entries are ignored.
    pub fn from_cells<I>(labels: Vec<String>, cells: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, Option<f64>)>,
    {
        let mut matrix = Self::empty(labels);
        for (i, j, value) in cells {
            if i != j {
                matrix.set(i, j, value);
            }
        }
        matrix
    }

    /// Build from dense rows. Rows must be square, symmetric and have a zero
    /// diagonal; NaN entries are read as not computed.
    pub fn from_rows(labels: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let n = labels.len();
        if rows.len() != n {
            return Err(AnalysisError::Parse {
                line: 0,
                message: format!("expected {n} rows, found {}", rows.len()),
            });
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(AnalysisError::Parse {
                line: i + 1,
                message: format!("expected {n} values, found {}", row.len()),
            });
        }

        let mut matrix = Self::empty(labels);
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                let cell = (!value.is_nan()).then_some(value);
                if i == j {
                    if cell.is_some_and(|v| v != 0.0) {
                        return Err(AnalysisError::Parse {
                            line: i + 1,
                            message: format!("diagonal entry is {value}, expected 0"),
                        });
                    }
                } else if j > i {
                    let mirrored = rows[j][i];
                    let same = (value.is_nan() && mirrored.is_nan()) || value == mirrored;
                    if !same {
                        return Err(AnalysisError::Parse {
                            line: i + 1,
                            message: format!(
                                "matrix is not symmetric at ({i}, {j}): {value} vs {mirrored}"
                            ),
                        });
                    }
                    matrix.set(i, j, cell);
                }
            }
        }
        Ok(matrix)
    }

    /// Set `(i, j)` and `(j, i)` together. The diagonal is fixed at 0.
    pub fn set(&mut self, i: usize, j: usize, value: Option<f64>) {
        if i == j {
            return;
        }
        let n = self.len();
        self.cells[i * n + j] = value;
        self.cells[j * n + i] = value;
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.cells[i * self.len() + j]
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Rows as nested vectors, index-aligned with [`DistanceMatrix::labels`].
    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        let n = self.len();
        (0..n).map(|i| self.cells[i * n..(i + 1) * n].to_vec()).collect()
    }

    /// Upper-triangle pairs `(i, j, value)` with `i < j`.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, Option<f64>)> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j, self.get(i, j))))
    }

    /// Computed off-diagonal values, each unordered pair once.
    pub fn off_diagonal_values(&self) -> Vec<f64> {
        self.upper_triangle().filter_map(|(_, _, v)| v).collect()
    }

    /// Label pairs whose distance was not computed.
    pub fn missing_pairs(&self) -> Vec<(String, String)> {
        self.upper_triangle()
            .filter(|(_, _, v)| v.is_none())
            .map(|(i, j, _)| (self.labels[i].clone(), self.labels[j].clone()))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.upper_triangle().all(|(_, _, v)| v.is_some())
    }

    /// Element-wise mean of matrices over identical labels. A cell is
    /// computed only if it is computed in every input.
    pub fn mean(matrices: &[DistanceMatrix]) -> Result<DistanceMatrix> {
        let Some(first) = matrices.first() else {
            return Err(AnalysisError::InsufficientData { available: 0 });
        };
        for m in &matrices[1..] {
            if m.labels != first.labels {
                return Err(AnalysisError::LabelMismatch {
                    expected: first.labels.clone(),
                    found: m.labels.clone(),
                });
            }
        }

        let count = matrices.len() as f64;
        let cells: Vec<_> = first
            .upper_triangle()
            .map(|(i, j, _)| {
                let sum: Option<f64> = matrices.iter().map(|m| m.get(i, j)).sum();
                (i, j, sum.map(|s| s / count))
            })
            .collect();
        Ok(DistanceMatrix::from_cells(first.labels.clone(), cells))
    }
}

/// Aggregates batch-level NCDs into one distance per corpus pair.
#[derive(Debug, Clone)]
pub struct DistanceMatrixBuilder {
    pub calculator: NcdCalculator,
    /// Batches taken from the front of each corpus; bounds the per-pair cost
    /// at `max_comparisons²` NCD evaluations.
    pub max_comparisons: usize,
}

impl Default for DistanceMatrixBuilder {
    fn default() -> Self {
        Self {
            calculator: NcdCalculator::default(),
            max_comparisons: DEFAULT_MAX_COMPARISONS,
        }
    }
}

impl DistanceMatrixBuilder {
    pub fn new(calculator: NcdCalculator, max_comparisons: usize) -> Self {
        Self {
            calculator,
            max_comparisons,
        }
    }

    /// Mean NCD over the Cartesian product of the two corpora's leading
    /// batches, or `None` if no batch pair was computable.
    pub fn pair_distance(
        &self,
        a: &Corpus,
        b: &Corpus,
        compressor: &dyn Compressor,
    ) -> Option<f64> {
        let mut sum = 0.0;
        let mut computed = 0usize;
        let mut failed = 0usize;

        for x in a.batches.iter().take(self.max_comparisons) {
            for y in b.batches.iter().take(self.max_comparisons) {
                match self.calculator.ncd(x, y, compressor) {
                    Some(value) => {
                        sum += value;
                        computed += 1;
                    }
                    None => failed += 1,
                }
            }
        }

        if failed > 0 {
            warn!(
                a = %a.label,
                b = %b.label,
                compressor = compressor.name(),
                failed,
                computed,
                "Some batch pairs were not computable"
            );
        }
        if computed == 0 {
            return None;
        }

        let mean = sum / computed as f64;
        debug!(
            a = %a.label,
            b = %b.label,
            compressor = compressor.name(),
            comparisons = computed,
            distance = mean,
            "Pair distance"
        );
        Some(mean)
    }

    /// Distance matrix over `corpora`, in their given order.
    pub fn build(&self, corpora: &[Corpus], compressor: &dyn Compressor) -> DistanceMatrix {
        let labels = corpora.iter().map(|c| c.label.clone()).collect();
        let n = corpora.len();
        let mut cells = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                cells.push((i, j, self.pair_distance(&corpora[i], &corpora[j], compressor)));
            }
        }
        DistanceMatrix::from_cells(labels, cells)
    }
}
