// Compressors: interchangeable "text → compressed size" strategies.

pub mod context;
pub mod lz;
pub mod static_model;
pub mod traits;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use context::ContextModelCompressor;
pub use lz::{LzmaCompressor, ZlibCompressor};
pub use static_model::{ModelSource, StaticModel, StaticModelCompressor};
pub use traits::{CompressionResult, Compressor};

/// Compressor selectable by name from the command line or config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressorKind {
    Lzma,
    Zlib,
    Ppm,
    Static,
}

impl CompressorKind {
    /// Every compressor, in the order matrices are built and combined.
    pub const ALL: [CompressorKind; 4] = [
        CompressorKind::Lzma,
        CompressorKind::Zlib,
        CompressorKind::Ppm,
        CompressorKind::Static,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressorKind::Lzma => "lzma",
            CompressorKind::Zlib => "zlib",
            CompressorKind::Ppm => "ppm",
            CompressorKind::Static => "static",
        }
    }

    /// Instantiate the compressor. `ppm_order` only affects the context model.
    ///
    /// The static variant is self-fitted here; distances between two texts
    /// under a shared reference model are what `analysis::cross_entropy`
    /// computes instead.
    pub fn build(&self, ppm_order: usize) -> Arc<dyn Compressor> {
        match self {
            CompressorKind::Lzma => Arc::new(LzmaCompressor::default()),
            CompressorKind::Zlib => Arc::new(ZlibCompressor::default()),
            CompressorKind::Ppm => Arc::new(ContextModelCompressor::new(ppm_order)),
            CompressorKind::Static => Arc::new(StaticModelCompressor::self_fitted()),
        }
    }
}

impl fmt::Display for CompressorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lzma" | "xz" => Ok(CompressorKind::Lzma),
            "zlib" | "lz77" | "deflate" => Ok(CompressorKind::Zlib),
            "ppm" => Ok(CompressorKind::Ppm),
            "static" => Ok(CompressorKind::Static),
            other => anyhow::bail!(
                "unknown compressor '{other}' (expected one of: lzma, zlib, ppm, static)"
            ),
        }
    }
}

/// Parse a comma-separated compressor list, with `all` meaning every kind.
pub fn parse_kinds(list: &str) -> anyhow::Result<Vec<CompressorKind>> {
    if list.trim().eq_ignore_ascii_case("all") {
        return Ok(CompressorKind::ALL.to_vec());
    }
    let mut kinds = Vec::new();
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        let kind: CompressorKind = part.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        anyhow::bail!("no compressors selected");
    }
    Ok(kinds)
}
