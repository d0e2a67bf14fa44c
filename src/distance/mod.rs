// Distances: NCD between samples, corpus-level matrices, normalization.

pub mod matrix;
pub mod ncd;
pub mod normalize;

pub use matrix::{DistanceMatrix, DistanceMatrixBuilder};
pub use ncd::{NcdCalculator, NcdMeasurement, NcdPolicy, SaturationRescale};
pub use normalize::{MatrixNormalizer, NormalizationRange};
