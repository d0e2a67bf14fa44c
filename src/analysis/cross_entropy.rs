// Cross-corpus static-model analysis.
//
// For every (source, target) pair: build an order-0 model from the source's
// leading batches, then price each of the target's leading batches under it.
// Cross-entropy is bits per character under the foreign model; KL divergence
// is how much worse that is than the target's own entropy. Both matrices are
// indexed [target][source] and, unlike NCD matrices, are asymmetric with a
// computed diagonal.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::entropy::shannon_entropy;
use crate::compression::{Compressor, StaticModel, StaticModelCompressor};
use crate::corpus::Corpus;
use crate::distance::DistanceMatrix;

/// Default number of batches per corpus used for models and targets.
pub const DEFAULT_BATCH_LIMIT: usize = 3;

/// One target batch priced under one source model.
#[derive(Debug, Clone, Serialize)]
pub struct BatchCrossEntropy {
    pub source: String,
    pub target: String,
    pub batch_index: usize,
    pub target_entropy: f64,
    pub cross_entropy: f64,
    pub kl_divergence: f64,
    pub compression_ratio: f64,
}

/// Mean cross-entropy and KL divergence for every ordered corpus pair.
#[derive(Debug, Clone, Serialize)]
pub struct CrossEntropyReport {
    pub labels: Vec<String>,
    /// `[target][source]`, bits per character.
    pub cross_entropy: Vec<Vec<Option<f64>>>,
    /// `[target][source]`, bits per character.
    pub kl_divergence: Vec<Vec<Option<f64>>>,
    pub details: Vec<BatchCrossEntropy>,
}

impl CrossEntropyReport {
    /// Batch rows for one source → target direction.
    pub fn pair_details<'a>(
        &'a self,
        source: &'a str,
        target: &'a str,
    ) -> impl Iterator<Item = &'a BatchCrossEntropy> + 'a {
        self.details
            .iter()
            .filter(move |d| d.source == source && d.target == target)
    }

    /// Symmetrized KL, `(KL(a‖b) + KL(b‖a)) / 2`, as a clusterable distance
    /// matrix. Pairs missing either direction are not computed.
    pub fn symmetric_kl(&self) -> DistanceMatrix {
        let n = self.labels.len();
        let mut cells = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let value = match (self.kl_divergence[i][j], self.kl_divergence[j][i]) {
                    (Some(a), Some(b)) => Some((a + b) / 2.0),
                    _ => None,
                };
                cells.push((i, j, value));
            }
        }
        DistanceMatrix::from_cells(self.labels.clone(), cells)
    }
}

/// Runs the static-model comparison across corpora.
#[derive(Debug, Clone, Copy)]
pub struct CrossEntropyAnalyzer {
    pub batch_limit: usize,
}

impl Default for CrossEntropyAnalyzer {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }
}

impl CrossEntropyAnalyzer {
    pub fn new(batch_limit: usize) -> Self {
        Self { batch_limit }
    }

    pub fn analyze(&self, corpora: &[Corpus]) -> CrossEntropyReport {
        let n = corpora.len();
        let labels: Vec<String> = corpora.iter().map(|c| c.label.clone()).collect();
        let mut cross_entropy = vec![vec![None; n]; n];
        let mut kl_divergence = vec![vec![None; n]; n];
        let mut details = Vec::new();

        for (s, source) in corpora.iter().enumerate() {
            let Some(model) = StaticModel::build(&source.joined(self.batch_limit)) else {
                warn!(source = %source.label, "Empty source text, no static model");
                continue;
            };
            info!(
                source = %source.label,
                chars = model.reference_len,
                entropy = model.entropy(),
                "Built static model"
            );
            let compressor = StaticModelCompressor::with_model(Arc::new(model));

            for (t, target) in corpora.iter().enumerate() {
                let rows: Vec<BatchCrossEntropy> = target
                    .batches
                    .iter()
                    .take(self.batch_limit)
                    .enumerate()
                    .filter_map(|(idx, batch)| {
                        let (h, ce, ratio) = measure_batch(&compressor, batch)?;
                        Some(BatchCrossEntropy {
                            source: source.label.clone(),
                            target: target.label.clone(),
                            batch_index: idx,
                            target_entropy: h,
                            cross_entropy: ce,
                            kl_divergence: ce - h,
                            compression_ratio: ratio,
                        })
                    })
                    .collect();

                if rows.is_empty() {
                    warn!(
                        source = %source.label,
                        target = %target.label,
                        "No measurable target batches"
                    );
                    continue;
                }
                let count = rows.len() as f64;
                let mean =
                    |f: fn(&BatchCrossEntropy) -> f64| rows.iter().map(f).sum::<f64>() / count;
                cross_entropy[t][s] = Some(mean(|r| r.cross_entropy));
                kl_divergence[t][s] = Some(mean(|r| r.kl_divergence));
                details.extend(rows);
            }
        }

        CrossEntropyReport {
            labels,
            cross_entropy,
            kl_divergence,
            details,
        }
    }
}

/// (target entropy, cross-entropy, compression ratio) for one batch.
fn measure_batch(compressor: &StaticModelCompressor, batch: &str) -> Option<(f64, f64, f64)> {
    let chars = batch.chars().count();
    if chars == 0 {
        return None;
    }
    let result = compressor.compress(batch);
    let cross_entropy = result.size * 8.0 / chars as f64;
    Some((shannon_entropy(batch), cross_entropy, result.ratio))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpora() -> Vec<Corpus> {
        vec![
            Corpus::new("Norte", vec!["abababab".into(), "abab".into()]),
            Corpus::new("Sul", vec!["cdcdcdcd".into()]),
        ]
    }

    #[test]
    fn test_own_model_has_zero_kl() {
        let report = CrossEntropyAnalyzer::new(1).analyze(&corpora());
        // Target Norte batch 0 under a model built from exactly that batch
        let kl = report.kl_divergence[0][0].unwrap();
        assert!(kl.abs() < 1e-12, "kl was {kl}");
        assert!((report.cross_entropy[0][0].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_foreign_model_costs_unseen_penalty() {
        let report = CrossEntropyAnalyzer::new(1).analyze(&corpora());
        // Sul under Norte's 8-char model: every char unseen, log2(8) = 3 bits
        assert!((report.cross_entropy[1][0].unwrap() - 3.0).abs() < 1e-12);
        assert!((report.kl_divergence[1][0].unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_details_and_symmetric_kl() {
        let report = CrossEntropyAnalyzer::new(2).analyze(&corpora());
        assert_eq!(report.pair_details("Norte", "Norte").count(), 2);
        assert_eq!(report.pair_details("Sul", "Norte").count(), 2);

        let m = report.symmetric_kl();
        assert_eq!(m.get(0, 0), Some(0.0));
        assert_eq!(m.get(0, 1), m.get(1, 0));
        assert!(m.get(0, 1).unwrap() > 0.0);
    }

    #[test]
    fn test_empty_source_is_skipped() {
        let corpora = vec![Corpus::new("A", vec![]), Corpus::new("B", vec!["xy".into()])];
        let report = CrossEntropyAnalyzer::default().analyze(&corpora);
        assert!(report.cross_entropy[1][0].is_none());
        assert!(report.cross_entropy[1][1].is_some());
    }
}
