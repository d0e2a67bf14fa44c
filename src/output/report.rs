// JSON run report: everything a `matrix` run produced, in one file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cluster::{Dendrogram, LinkageStep};
use crate::corpus::Corpus;
use crate::distance::DistanceMatrix;

#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub label: String,
    pub batches: usize,
    pub chars: usize,
}

impl From<&Corpus> for CorpusSummary {
    fn from(corpus: &Corpus) -> Self {
        Self {
            label: corpus.label.clone(),
            batches: corpus.batches.len(),
            chars: corpus.char_count(),
        }
    }
}

/// One compressor's (or the combined) matrices and tree.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    pub compressor: String,
    pub raw: Vec<Vec<Option<f64>>>,
    pub normalized: Vec<Vec<Option<f64>>>,
    /// Absent when clustering was skipped (incomplete matrix, too few corpora).
    pub linkage: Option<Vec<LinkageStep>>,
    pub newick: Option<String>,
}

impl MatrixReport {
    pub fn new(
        compressor: impl Into<String>,
        raw: &DistanceMatrix,
        normalized: &DistanceMatrix,
        dendrogram: Option<&Dendrogram>,
    ) -> Self {
        Self {
            compressor: compressor.into(),
            raw: raw.to_rows(),
            normalized: normalized.to_rows(),
            linkage: dendrogram.map(|d| d.steps().to_vec()),
            newick: dendrogram.map(Dendrogram::to_newick),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub corpora: Vec<CorpusSummary>,
    pub matrices: Vec<MatrixReport>,
}

impl RunReport {
    pub fn new(corpora: &[Corpus]) -> Self {
        Self {
            generated_at: Utc::now(),
            labels: corpora.iter().map(|c| c.label.clone()).collect(),
            corpora: corpora.iter().map(CorpusSummary::from).collect(),
            matrices: Vec::new(),
        }
    }

    pub fn push(&mut self, matrix: MatrixReport) {
        self.matrices.push(matrix);
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }
}
