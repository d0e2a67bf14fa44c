// Compressor trait: the swap-ready abstraction.
//
// Every compressor (zlib, LZMA, the PPM-style context model, the static
// order-0 model) exposes the same single capability: tell me how many bytes
// this text costs. Only the size matters, so nothing here ever decompresses.

use anyhow::Result;
use tracing::warn;

/// Outcome of one compress call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionResult {
    /// Compressed size in bytes. Fractional for the static model, which
    /// measures ideal code length instead of emitting bytes.
    pub size: f64,
    /// `size / original_size`. Defined as 1.0 for empty input.
    pub ratio: f64,
}

impl CompressionResult {
    /// Build a result from a compressed size and the original byte length.
    pub fn new(size: f64, original_len: usize) -> Self {
        let ratio = if original_len == 0 {
            1.0
        } else {
            size / original_len as f64
        };
        Self { size, ratio }
    }

    /// The "no compression achieved" sentinel returned on internal failure.
    pub fn failed() -> Self {
        Self {
            size: 0.0,
            ratio: 1.0,
        }
    }

    /// True if this is the failure sentinel.
    pub fn is_failure(&self) -> bool {
        self.size == 0.0 && self.ratio == 1.0
    }
}

/// Trait for measuring the compressed size of a text.
///
/// Implementations only provide [`Compressor::compressed_size`]; callers use
/// [`Compressor::compress`], which never fails.
pub trait Compressor: Send + Sync {
    /// Short identifier used in logs, file names and reports.
    fn name(&self) -> &str;

    /// Compressed size of `text` plus the byte length the ratio is taken
    /// against (usually `text.len()`).
    fn compressed_size(&self, text: &str) -> Result<(f64, usize)>;

    /// Compress `text`, converting any internal failure to the sentinel
    /// `(size = 0, ratio = 1.0)` so batch analysis can keep going.
    fn compress(&self, text: &str) -> CompressionResult {
        match self.compressed_size(text) {
            Ok((size, original_len)) => CompressionResult::new(size, original_len),
            Err(e) => {
                warn!(
                    compressor = self.name(),
                    error = %e,
                    "Compression failed, returning sentinel"
                );
                CompressionResult::failed()
            }
        }
    }
}
