use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use regex_lite::Regex;

use crate::analysis::cross_entropy::DEFAULT_BATCH_LIMIT;
use crate::compression::context::DEFAULT_MAX_ORDER;
use crate::corpus::sampler::{
    BatchSampler, DEFAULT_FILE_PATTERN, DEFAULT_MAX_FILES, DEFAULT_SAMPLE_SIZE,
};
use crate::distance::matrix::DEFAULT_MAX_COMPARISONS;
use crate::distance::{
    DistanceMatrixBuilder, NcdCalculator, NcdPolicy, NormalizationRange, SaturationRescale,
};

/// Regions analysed when DIALECT_REGIONS is unset.
pub const DEFAULT_REGIONS: &str = "norte,nordeste,sul,sudeste";

/// Central configuration loaded from environment variables.
///
/// Every knob has a default, so an empty environment is a valid run
/// against `./db`. The .env file is loaded automatically at startup via
/// dotenvy; CLI flags override what is loaded here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root holding `<region>/splits/<split>/` directories.
    pub corpus_root: PathBuf,
    pub split: String,
    pub regions: Vec<String>,
    /// Where CSV and JSON results are written.
    pub output_dir: PathBuf,
    pub file_pattern: String,
    pub max_files: usize,
    /// Characters kept per file.
    pub sample_size: usize,
    /// Batches per corpus used for each pair's NCDs.
    pub max_comparisons: usize,
    /// Batches per corpus used by the static cross-entropy analysis.
    pub batch_limit: usize,
    pub ppm_order: usize,
    /// Pairs computed in parallel.
    pub concurrency: usize,
    /// `None` when DIALECT_RESCALE=off.
    pub rescale: Option<SaturationRescale>,
    pub normalization: NormalizationRange,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults; set but unparseable ones are an
    /// error rather than silently ignored.
    pub fn load() -> Result<Self> {
        let defaults = SaturationRescale::default();
        let rescale = match env::var("DIALECT_RESCALE").as_deref() {
            Ok("off") | Ok("false") | Ok("0") => None,
            _ => Some(SaturationRescale {
                threshold: env_or("DIALECT_RESCALE_THRESHOLD", defaults.threshold)?,
                floor: env_or("DIALECT_RESCALE_FLOOR", defaults.floor)?,
                stretch: env_or("DIALECT_RESCALE_STRETCH", defaults.stretch)?,
            }),
        };

        let visual = NormalizationRange::default();
        let normalization = NormalizationRange::new(
            env_or("DIALECT_NORMALIZE_LOW", visual.low)?,
            env_or("DIALECT_NORMALIZE_HIGH", visual.high)?,
        )
        .context("DIALECT_NORMALIZE_LOW/HIGH do not form a valid range")?;

        Ok(Self {
            corpus_root: env::var("DIALECT_CORPUS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./db")),
            split: env::var("DIALECT_SPLIT").unwrap_or_else(|_| "train".to_string()),
            regions: parse_regions(
                &env::var("DIALECT_REGIONS").unwrap_or_else(|_| DEFAULT_REGIONS.to_string()),
            ),
            output_dir: env::var("DIALECT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./results")),
            file_pattern: env::var("DIALECT_FILE_PATTERN")
                .unwrap_or_else(|_| DEFAULT_FILE_PATTERN.to_string()),
            max_files: env_or("DIALECT_MAX_FILES", DEFAULT_MAX_FILES)?,
            sample_size: env_or("DIALECT_SAMPLE_SIZE", DEFAULT_SAMPLE_SIZE)?,
            max_comparisons: env_or("DIALECT_MAX_COMPARISONS", DEFAULT_MAX_COMPARISONS)?,
            batch_limit: env_or("DIALECT_BATCH_LIMIT", DEFAULT_BATCH_LIMIT)?,
            ppm_order: env_or("DIALECT_PPM_ORDER", DEFAULT_MAX_ORDER)?,
            concurrency: env_or("DIALECT_CONCURRENCY", 4)?,
            rescale,
            normalization,
        })
    }

    /// Check that there are at least two regions to compare.
    /// Call this before building any matrix.
    pub fn require_regions(&self) -> Result<()> {
        if self.regions.len() < 2 {
            anyhow::bail!(
                "Need at least 2 regions, got {:?}.\n\
                 Set DIALECT_REGIONS (comma-separated) or pass --regions.",
                self.regions
            );
        }
        Ok(())
    }

    /// Check that the corpus root exists.
    pub fn require_corpus_root(&self) -> Result<()> {
        if !self.corpus_root.is_dir() {
            anyhow::bail!(
                "Corpus root {} does not exist.\n\
                 Expected <root>/<region>/splits/{}/*.txt. Set DIALECT_CORPUS_ROOT or pass --root.",
                self.corpus_root.display(),
                self.split
            );
        }
        Ok(())
    }

    /// Build the sampler described by this config.
    pub fn sampler(&self) -> Result<BatchSampler> {
        let pattern = Regex::new(&self.file_pattern)
            .with_context(|| format!("invalid file pattern '{}'", self.file_pattern))?;
        Ok(BatchSampler::new(self.max_files, self.sample_size, pattern))
    }

    pub fn ncd_policy(&self) -> NcdPolicy {
        NcdPolicy {
            rescale: self.rescale,
            ..NcdPolicy::default()
        }
    }

    pub fn matrix_builder(&self) -> DistanceMatrixBuilder {
        DistanceMatrixBuilder::new(NcdCalculator::new(self.ncd_policy()), self.max_comparisons)
    }
}

/// Split a comma-separated region list, trimming and lowercasing entries.
pub fn parse_regions(list: &str) -> Vec<String> {
    list.split(',')
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect()
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name}={raw} is not a valid value")),
        Err(_) => Ok(default),
    }
}
