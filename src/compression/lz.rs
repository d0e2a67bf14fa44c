// Dictionary compressors: zlib (LZ77 + Huffman) and xz/LZMA.
//
// Both are fresh encoders per call, so no state leaks between texts.

use std::io::Write;

use anyhow::{Context, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use xz2::write::XzEncoder;

use super::traits::Compressor;

/// zlib at the library's default level (6).
#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    pub level: u32,
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl Compressor for ZlibCompressor {
    fn name(&self) -> &str {
        "zlib"
    }

    fn compressed_size(&self, text: &str) -> Result<(f64, usize)> {
        let bytes = text.as_bytes();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(bytes).context("zlib write failed")?;
        let compressed = encoder.finish().context("zlib finish failed")?;
        Ok((compressed.len() as f64, bytes.len()))
    }
}

/// xz container with an LZMA2 stream, preset 6 (the xz default).
#[derive(Debug, Clone, Copy)]
pub struct LzmaCompressor {
    pub preset: u32,
}

impl Default for LzmaCompressor {
    fn default() -> Self {
        Self { preset: 6 }
    }
}

impl Compressor for LzmaCompressor {
    fn name(&self) -> &str {
        "lzma"
    }

    fn compressed_size(&self, text: &str) -> Result<(f64, usize)> {
        let bytes = text.as_bytes();
        let mut encoder = XzEncoder::new(Vec::new(), self.preset);
        encoder.write_all(bytes).context("xz write failed")?;
        let compressed = encoder.finish().context("xz finish failed")?;
        Ok((compressed.len() as f64, bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repetitive() -> String {
        "o gato subiu no telhado e o cachorro ficou no quintal. ".repeat(40)
    }

    #[test]
    fn test_zlib_compresses_repetitive_text() {
        let result = ZlibCompressor::default().compress(&repetitive());
        assert!(result.size > 0.0);
        assert!(result.ratio < 0.2, "ratio was {}", result.ratio);
    }

    #[test]
    fn test_lzma_compresses_repetitive_text() {
        let result = LzmaCompressor::default().compress(&repetitive());
        assert!(result.size > 0.0);
        assert!(result.ratio < 0.3, "ratio was {}", result.ratio);
    }

    #[test]
    fn test_deterministic() {
        let c = LzmaCompressor::default();
        let text = repetitive();
        assert_eq!(c.compress(&text), c.compress(&text));
    }

    #[test]
    fn test_empty_input_has_container_overhead() {
        // Both formats emit headers even for no payload
        let z = ZlibCompressor::default().compress("");
        assert!(z.size > 0.0);
        assert_eq!(z.ratio, 1.0);
    }
}
