// Per-text statistics: Shannon entropy, word length, and a compressor's
// effective bits per symbol.

use std::collections::HashMap;

use serde::Serialize;

use crate::compression::Compressor;

/// Chunk sizes (bytes) used to estimate a compressor's bits per symbol.
pub const ENTROPY_CHUNK_SIZES: [usize; 6] = [100, 200, 500, 1000, 2000, 5000];

/// Shannon entropy of `text` in bits per character. 0 for empty text.
pub fn shannon_entropy(text: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut len = 0usize;
    for c in text.chars() {
        *counts.entry(c).or_insert(0) += 1;
        len += 1;
    }
    if len == 0 {
        return 0.0;
    }
    let total = len as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Mean length in characters of whitespace-separated words.
pub fn average_word_length(text: &str) -> f64 {
    let (words, chars) = text
        .split_whitespace()
        .fold((0usize, 0usize), |(w, c), word| (w + 1, c + word.chars().count()));
    if words == 0 {
        0.0
    } else {
        chars as f64 / words as f64
    }
}

/// Estimate how many bits per input byte `compressor` spends on `text`.
///
/// The text is cut into full chunks of each size in [`ENTROPY_CHUNK_SIZES`]
/// (sizes larger than the text are skipped), each chunk is compressed on its
/// own, and the per-size averages are averaged. Chunks that fail to compress
/// are left out. Returns `None` if nothing could be measured.
pub fn compressor_bits_per_symbol(text: &str, compressor: &dyn Compressor) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut per_size = Vec::new();

    for &chunk_size in ENTROPY_CHUNK_SIZES.iter().filter(|&&s| s <= bytes.len()) {
        let sizes: Vec<f64> = bytes
            .chunks_exact(chunk_size)
            .map(|chunk| compressor.compress(&String::from_utf8_lossy(chunk)))
            .filter(|r| !r.is_failure())
            .map(|r| r.size)
            .collect();
        if sizes.is_empty() {
            continue;
        }
        let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
        per_size.push(mean * 8.0 / chunk_size as f64);
    }

    if per_size.is_empty() {
        None
    } else {
        Some(per_size.iter().sum::<f64>() / per_size.len() as f64)
    }
}

/// Summary statistics for one text sample.
#[derive(Debug, Clone, Serialize)]
pub struct TextProfile {
    pub chars: usize,
    pub bytes: usize,
    pub entropy: f64,
    pub average_word_length: f64,
    /// `entropy × chars / 8`: the order-0 lower bound in bytes.
    pub entropy_bound_bytes: f64,
}

impl TextProfile {
    pub fn of(text: &str) -> Self {
        let chars = text.chars().count();
        let entropy = shannon_entropy(text);
        Self {
            chars,
            bytes: text.len(),
            entropy,
            average_word_length: average_word_length(text),
            entropy_bound_bytes: entropy * chars as f64 / 8.0,
        }
    }
}
