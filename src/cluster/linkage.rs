// Average-linkage (UPGMA) agglomerative clustering over a distance matrix.
//
// Cluster ids follow the SciPy convention: leaves are 0..n and the k-th
// merge creates cluster n + k. Each step merges the pair of live clusters
// with the smallest mean pairwise leaf distance; after a merge the new
// cluster's distance to every other cluster K is the size-weighted average
//
//   d(A ∪ B, K) = (|A|·d(A, K) + |B|·d(B, K)) / (|A| + |B|)
//
// which equals the mean over all leaf pairs without recomputing it.
//
// Ties go to the lowest (row, column) pair of live slots. A merged cluster
// keeps the lower of its two slots, so slot order is always the original
// label order and the output is reproducible.

use serde::Serialize;
use tracing::debug;

use super::dendrogram::Dendrogram;
use crate::distance::DistanceMatrix;
use crate::error::{AnalysisError, Result};

/// One merge event of the linkage tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkageStep {
    /// Lower id of the two merged clusters.
    pub cluster_a: usize,
    /// Higher id of the two merged clusters.
    pub cluster_b: usize,
    /// Average-linkage distance at which they merged.
    pub distance: f64,
    /// Leaves in the new cluster.
    pub new_cluster_size: usize,
}

/// Average-linkage agglomerative clusterer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalClusterer;

impl HierarchicalClusterer {
    /// The N−1 merge steps for an N-label matrix.
    pub fn cluster(&self, matrix: &DistanceMatrix) -> Result<Vec<LinkageStep>> {
        let n = matrix.len();
        if n < 2 {
            return Err(AnalysisError::InsufficientData { available: n });
        }

        let labels = matrix.labels();
        let mut dist = vec![vec![0.0f64; n]; n];
        for (i, j, value) in matrix.upper_triangle() {
            let d = value.ok_or_else(|| AnalysisError::IncompleteMatrix {
                a: labels[i].clone(),
                b: labels[j].clone(),
            })?;
            if !d.is_finite() {
                return Err(AnalysisError::NonFiniteDistance {
                    a: labels[i].clone(),
                    b: labels[j].clone(),
                });
            }
            dist[i][j] = d;
            dist[j][i] = d;
        }

        let mut live = vec![true; n];
        let mut ids: Vec<usize> = (0..n).collect();
        let mut sizes = vec![1usize; n];
        let mut steps = Vec::with_capacity(n - 1);

        for step in 0..(n - 1) {
            let (i, j) = closest_pair(&dist, &live);
            let d = dist[i][j];
            let merged = sizes[i] + sizes[j];

            steps.push(LinkageStep {
                cluster_a: ids[i].min(ids[j]),
                cluster_b: ids[i].max(ids[j]),
                distance: d,
                new_cluster_size: merged,
            });
            debug!(
                a = ids[i],
                b = ids[j],
                distance = d,
                size = merged,
                "Merged clusters"
            );

            let (wi, wj) = (sizes[i] as f64, sizes[j] as f64);
            for k in (0..n).filter(|&k| live[k] && k != i && k != j) {
                let updated = (wi * dist[i][k] + wj * dist[j][k]) / (wi + wj);
                dist[i][k] = updated;
                dist[k][i] = updated;
            }

            live[j] = false;
            sizes[i] = merged;
            ids[i] = n + step;
        }

        Ok(steps)
    }

    /// Cluster and wrap the steps with their labels.
    pub fn cluster_dendrogram(&self, matrix: &DistanceMatrix) -> Result<Dendrogram> {
        let steps = self.cluster(matrix)?;
        Ok(Dendrogram::new(matrix.labels().to_vec(), steps))
    }
}

/// Lowest-distance live pair `(i, j)` with `i < j`; the first one found in
/// row-major order wins ties.
fn closest_pair(dist: &[Vec<f64>], live: &[bool]) -> (usize, usize) {
    let n = live.len();
    let mut best = (0, 0);
    let mut best_d = f64::INFINITY;
    for i in (0..n).filter(|&i| live[i]) {
        for j in ((i + 1)..n).filter(|&j| live[j]) {
            if dist[i][j] < best_d {
                best_d = dist[i][j];
                best = (i, j);
            }
        }
    }
    best
}
