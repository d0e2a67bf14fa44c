// Batch sampler: turn a corpus directory into a bounded set of text samples.
//
// Files are taken in sorted name order and only the first `max_files` are
// used, so reruns see the same batches. Each file becomes exactly one batch,
// truncated to `sample_size` characters. Missing or empty directories are
// reported and yield nothing; they never abort the run.

use std::fs;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use tracing::{debug, info, warn};

use super::{region_label, Corpus};
use crate::error::AnalysisError;

/// Default cap on files read per corpus.
pub const DEFAULT_MAX_FILES: usize = 40;
/// Default cap on characters kept per file.
pub const DEFAULT_SAMPLE_SIZE: usize = 100_000;
/// Default file-name filter.
pub const DEFAULT_FILE_PATTERN: &str = r"\.txt$";

/// Reads size-capped batches from corpus directories.
#[derive(Debug, Clone)]
pub struct BatchSampler {
    pub max_files: usize,
    pub sample_size: usize,
    pub file_pattern: Regex,
}

impl Default for BatchSampler {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            sample_size: DEFAULT_SAMPLE_SIZE,
            file_pattern: Regex::new(DEFAULT_FILE_PATTERN).expect("default pattern is valid"),
        }
    }
}

impl BatchSampler {
    pub fn new(max_files: usize, sample_size: usize, file_pattern: Regex) -> Self {
        Self {
            max_files,
            sample_size,
            file_pattern,
        }
    }

    /// Matching files in `dir`, sorted by name. Missing directories and
    /// directories without matches both surface as `MissingInput`.
    pub fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
        let missing = || AnalysisError::MissingInput {
            path: dir.to_path_buf(),
        };
        let entries = fs::read_dir(dir).map_err(|_| missing())?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.file_pattern.is_match(n))
            })
            .collect();

        if files.is_empty() {
            return Err(missing());
        }
        files.sort();
        Ok(files)
    }

    /// Read up to `max_files` files from `dir`, one truncated batch each.
    pub fn sample(&self, dir: &Path) -> Vec<String> {
        let files = match self.list_files(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "Corpus unavailable, skipping");
                return Vec::new();
            }
        };

        let total = files.len();
        let mut batches = Vec::with_capacity(total.min(self.max_files));
        for path in files.into_iter().take(self.max_files) {
            match fs::read_to_string(&path) {
                Ok(text) => batches.push(truncate_to_chars(&text, self.sample_size).to_string()),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Unreadable corpus file, skipping")
                }
            }
        }

        debug!(
            dir = %dir.display(),
            found = total,
            used = batches.len(),
            "Sampled corpus directory"
        );
        batches
    }

    /// Sample `dir` into a labelled corpus.
    pub fn load_corpus(&self, label: &str, dir: &Path) -> Corpus {
        Corpus::new(label, self.sample(dir))
    }

    /// Load `<root>/<region>/splits/<split>` for each region, dropping the
    /// ones that produced no batches.
    pub fn load_regions(&self, root: &Path, regions: &[String], split: &str) -> Vec<Corpus> {
        let mut corpora = Vec::with_capacity(regions.len());
        for region in regions {
            let dir = root.join(region).join("splits").join(split);
            let corpus = self.load_corpus(&region_label(region), &dir);
            if corpus.is_empty() {
                warn!(region = %region, dir = %dir.display(), "No batches for region, skipping");
                continue;
            }
            info!(
                region = %region,
                batches = corpus.batches.len(),
                chars = corpus.char_count(),
                "Loaded corpus"
            );
            corpora.push(corpus);
        }
        corpora
    }
}

/// The longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_to_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
