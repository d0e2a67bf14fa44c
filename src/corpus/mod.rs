// Corpora: labelled collections of text batches, and the sampler that
// loads them from disk.

pub mod sampler;

use serde::Serialize;

/// One comparison category (e.g. a dialect region) and its text batches.
#[derive(Debug, Clone, Serialize)]
pub struct Corpus {
    pub label: String,
    pub batches: Vec<String>,
}

impl Corpus {
    pub fn new(label: impl Into<String>, batches: Vec<String>) -> Self {
        Self {
            label: label.into(),
            batches,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total characters across all batches.
    pub fn char_count(&self) -> usize {
        self.batches.iter().map(|b| b.chars().count()).sum()
    }

    /// The first `limit` batches joined into one reference text.
    pub fn joined(&self, limit: usize) -> String {
        self.batches.iter().take(limit).map(String::as_str).collect()
    }
}

/// Turn a region directory name into a display label ("nordeste" → "Nordeste").
pub fn region_label(region: &str) -> String {
    let mut chars = region.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
