// dialect-ncd: compression-based similarity of text corpora
//
// This is the library root. Each module corresponds to one stage of the
// analysis: sample corpora, compress, measure NCD, build and normalize
// distance matrices, cluster, and render results.

pub mod analysis;
pub mod cluster;
pub mod compression;
pub mod config;
pub mod corpus;
pub mod distance;
pub mod error;
pub mod output;
pub mod pipeline;

pub use error::{AnalysisError, Result};
