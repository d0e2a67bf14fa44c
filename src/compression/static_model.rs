// Static order-0 model "compressor".
//
// Builds a character frequency model once and prices a text at
// -log2(p) bits per character. Nothing is ever encoded: the result is the
// size an ideal entropy coder would reach under that fixed model.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use super::traits::Compressor;

/// Character distribution built from a reference text.
#[derive(Debug, Clone)]
pub struct StaticModel {
    pub symbol_probabilities: HashMap<char, f64>,
    pub symbol_code_lengths: HashMap<char, f64>,
    /// Cost in bits of a character absent from the reference text:
    /// the code length of a symbol seen once, `log2(reference_len)`.
    pub unseen_penalty: f64,
    /// Reference length in characters.
    pub reference_len: usize,
}

impl StaticModel {
    /// Build the model from `reference`. Returns `None` for empty text,
    /// which has no distribution to speak of.
    pub fn build(reference: &str) -> Option<Self> {
        let mut counts: HashMap<char, usize> = HashMap::new();
        let mut len = 0usize;
        for c in reference.chars() {
            *counts.entry(c).or_insert(0) += 1;
            len += 1;
        }
        if len == 0 {
            return None;
        }

        let total = len as f64;
        let symbol_probabilities: HashMap<char, f64> = counts
            .into_iter()
            .map(|(c, n)| (c, n as f64 / total))
            .collect();
        let symbol_code_lengths = symbol_probabilities
            .iter()
            .map(|(&c, &p)| (c, -p.log2()))
            .collect();

        Some(Self {
            symbol_probabilities,
            symbol_code_lengths,
            unseen_penalty: total.log2(),
            reference_len: len,
        })
    }

    /// Shannon entropy of the model in bits per character.
    pub fn entropy(&self) -> f64 {
        self.symbol_probabilities
            .values()
            .map(|&p| -p * p.log2())
            .sum()
    }

    /// Total bits needed to encode `text` under this model.
    pub fn code_length_bits(&self, text: &str) -> f64 {
        text.chars()
            .map(|c| {
                self.symbol_code_lengths
                    .get(&c)
                    .copied()
                    .unwrap_or(self.unseen_penalty)
            })
            .sum()
    }

    /// Average bits per character of `text` under this model, or `None` for
    /// empty text.
    pub fn cross_entropy(&self, text: &str) -> Option<f64> {
        let n = text.chars().count();
        (n > 0).then(|| self.code_length_bits(text) / n as f64)
    }
}

/// Where the static compressor gets its model from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// A model prebuilt from a reference corpus.
    Reference(Arc<StaticModel>),
    /// Fit a fresh model to every text being measured (order-0
    /// self-information).
    SelfFitted,
}

/// Measurement-only compressor backed by a [`StaticModel`].
#[derive(Debug, Clone)]
pub struct StaticModelCompressor {
    source: ModelSource,
}

impl StaticModelCompressor {
    pub fn with_model(model: Arc<StaticModel>) -> Self {
        Self {
            source: ModelSource::Reference(model),
        }
    }

    pub fn self_fitted() -> Self {
        Self {
            source: ModelSource::SelfFitted,
        }
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }
}

impl Compressor for StaticModelCompressor {
    fn name(&self) -> &str {
        "static"
    }

    fn compressed_size(&self, text: &str) -> Result<(f64, usize)> {
        let bits = match &self.source {
            ModelSource::Reference(model) => model.code_length_bits(text),
            ModelSource::SelfFitted => match StaticModel::build(text) {
                Some(model) => model.code_length_bits(text),
                None => 0.0,
            },
        };
        Ok((bits / 8.0, text.len()))
    }
}
