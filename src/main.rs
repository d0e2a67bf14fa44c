use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use dialect_ncd::analysis::{compressor_bits_per_symbol, CrossEntropyAnalyzer, TextProfile};
use dialect_ncd::cluster::{Dendrogram, HierarchicalClusterer};
use dialect_ncd::compression::{parse_kinds, CompressorKind};
use dialect_ncd::config::{parse_regions, Config};
use dialect_ncd::corpus::Corpus;
use dialect_ncd::distance::{DistanceMatrix, MatrixNormalizer, NormalizationRange};
use dialect_ncd::output::report::{MatrixReport, RunReport};
use dialect_ncd::output::{csv, terminal};
use dialect_ncd::pipeline;

/// dialect-ncd: compression-based similarity of regional text corpora.
///
/// Measures how alike corpora are by how well they compress together,
/// then groups them with average-linkage clustering.
#[derive(Parser)]
#[command(name = "dialect-ncd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the corpora live. Unset flags fall back to DIALECT_* env vars.
#[derive(Args)]
struct CorpusArgs {
    /// Root directory holding <region>/splits/<split>/
    #[arg(long)]
    root: Option<PathBuf>,

    /// Split directory name (e.g. train, test)
    #[arg(long)]
    split: Option<String>,

    /// Comma-separated region directory names
    #[arg(long)]
    regions: Option<String>,
}

impl CorpusArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(root) = &self.root {
            config.corpus_root = root.clone();
        }
        if let Some(split) = &self.split {
            config.split = split.clone();
        }
        if let Some(regions) = &self.regions {
            config.regions = parse_regions(regions);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build NCD distance matrices, normalize, save and cluster them
    Matrix {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Compressors to use: lzma, zlib, ppm, static, or all
        #[arg(long, default_value = "all")]
        compressors: String,

        /// Directory for CSV and JSON results
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of corpus pairs computed in parallel
        #[arg(long)]
        concurrency: Option<usize>,

        /// Report raw NCD without the saturation rescale
        #[arg(long)]
        no_rescale: bool,

        /// Also print a flat cut into this many clusters
        #[arg(long)]
        clusters: Option<usize>,
    },

    /// Static-model cross-entropy and KL divergence between corpora
    CrossEntropy {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Batches per corpus used for models and targets (default: 3)
        #[arg(long)]
        batch_limit: Option<usize>,

        /// Directory for CSV results
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Per-batch entropy, word length and compressor efficiency
    Profile {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Compressors to profile: lzma, zlib, ppm, static, or all
        #[arg(long, default_value = "all")]
        compressors: String,

        /// Batches per corpus to profile
        #[arg(long, default_value = "3")]
        batches: usize,
    },

    /// Cluster a saved distance matrix CSV
    Cluster {
        /// Matrix CSV written by `matrix` (or any file in the same layout)
        #[arg(long)]
        input: PathBuf,

        /// Normalize to [0, 1] before clustering
        #[arg(long)]
        normalize: bool,

        /// Also print a flat cut into this many clusters
        #[arg(long)]
        clusters: Option<usize>,

        /// Print the tree in Newick format
        #[arg(long)]
        newick: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dialect_ncd=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Matrix {
            corpus,
            compressors,
            output,
            concurrency,
            no_rescale,
            clusters,
        } => {
            let mut config = Config::load()?;
            corpus.apply(&mut config);
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            if no_rescale {
                config.rescale = None;
            }
            let kinds = parse_kinds(&compressors)?;
            let corpora = load_corpora(&config)?;

            let builder = config.matrix_builder();
            let normalizer = MatrixNormalizer::new(config.normalization);
            let corpora = Arc::new(corpora);
            let mut report = RunReport::new(&corpora);
            let mut raws = Vec::with_capacity(kinds.len());

            for kind in &kinds {
                println!("\n{}", format!("Compressor: {kind}").bold());
                let compressor = kind.build(config.ppm_order);
                let raw = pipeline::matrix::run(
                    Arc::clone(&corpora),
                    compressor,
                    &builder,
                    config.concurrency,
                )
                .await;
                report.push(process_matrix(
                    kind.as_str(),
                    &raw,
                    &normalizer,
                    &config.output_dir,
                    clusters,
                )?);
                raws.push(raw);
            }

            if raws.len() > 1 {
                let combined = DistanceMatrix::mean(&raws)?;
                println!("\n{}", "Combined (mean of all compressors)".bold());
                report.push(process_matrix(
                    "combined",
                    &combined,
                    &normalizer,
                    &config.output_dir,
                    clusters,
                )?);
            }

            let report_path = config.output_dir.join("report.json");
            report.write(&report_path)?;
            println!(
                "\n{}",
                format!("Results written to {}", config.output_dir.display()).dimmed()
            );
        }

        Commands::CrossEntropy {
            corpus,
            batch_limit,
            output,
        } => {
            let mut config = Config::load()?;
            corpus.apply(&mut config);
            if let Some(limit) = batch_limit {
                config.batch_limit = limit;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            let corpora = load_corpora(&config)?;

            let analyzer = CrossEntropyAnalyzer::new(config.batch_limit);
            let report = tokio::task::spawn_blocking(move || analyzer.analyze(&corpora))
                .await
                .context("cross-entropy worker failed")?;

            let dir = config.output_dir.join("cross_entropy");
            csv::write_cross_entropy(&report, &dir)?;
            terminal::display_cross_entropy(&report);

            let symmetric = report.symmetric_kl();
            let normalized = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&symmetric);
            csv::write_matrix(&symmetric, &dir.join("kl_symmetric_matrix.csv"))?;
            match HierarchicalClusterer.cluster_dendrogram(&normalized) {
                Ok(dendrogram) => terminal::display_dendrogram(&dendrogram),
                Err(e) => warn!(error = %e, "Skipping clustering of KL divergence"),
            }
            println!("\n{}", format!("Results written to {}", dir.display()).dimmed());
        }

        Commands::Profile {
            corpus,
            compressors,
            batches,
        } => {
            let mut config = Config::load()?;
            corpus.apply(&mut config);
            let kinds = parse_kinds(&compressors)?;
            let corpora = load_corpora(&config)?;
            let ppm_order = config.ppm_order;

            let rows = tokio::task::spawn_blocking(move || {
                profile_corpora(&corpora, &kinds, batches, ppm_order)
            })
            .await
            .context("profile worker failed")?;
            display_profiles(&rows);
        }

        Commands::Cluster {
            input,
            normalize,
            clusters,
            newick,
        } => {
            let mut matrix = csv::read_matrix(&input)?;
            info!(labels = matrix.len(), path = %input.display(), "Loaded matrix");
            if normalize {
                matrix = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&matrix);
            }
            terminal::display_matrix("Distances", &matrix);

            let dendrogram = HierarchicalClusterer
                .cluster_dendrogram(&matrix)
                .with_context(|| format!("cannot cluster {}", input.display()))?;
            display_tree(&dendrogram, clusters);
            if newick {
                println!("\n{}", dendrogram.to_newick());
            }
        }
    }

    Ok(())
}

/// Validate the corpus layout and sample every configured region.
fn load_corpora(config: &Config) -> Result<Vec<Corpus>> {
    config.require_regions()?;
    config.require_corpus_root()?;
    let sampler = config.sampler()?;

    println!(
        "Sampling {} regions from {} (split: {})...",
        config.regions.len(),
        config.corpus_root.display(),
        config.split
    );
    let corpora = sampler.load_regions(&config.corpus_root, &config.regions, &config.split);
    if corpora.len() < 2 {
        anyhow::bail!(
            "Only {} region(s) had usable text; at least 2 are needed.\n\
             Check that {}/<region>/splits/{}/ contains files matching '{}'.",
            corpora.len(),
            config.corpus_root.display(),
            config.split,
            config.file_pattern
        );
    }
    for corpus in &corpora {
        println!(
            "  {:<14} {:>3} batches  {:>9} chars",
            corpus.label,
            corpus.batches.len(),
            corpus.char_count()
        );
    }
    Ok(corpora)
}

/// Normalize, save, print and cluster one raw matrix.
fn process_matrix(
    name: &str,
    raw: &DistanceMatrix,
    normalizer: &MatrixNormalizer,
    output_dir: &Path,
    clusters: Option<usize>,
) -> Result<MatrixReport> {
    let normalized = normalizer.normalize(raw);
    csv::write_matrix(raw, &output_dir.join(format!("matrix_{name}_original.csv")))?;
    csv::write_matrix(
        &normalized,
        &output_dir.join(format!("matrix_{name}_normalized.csv")),
    )?;

    terminal::display_matrix(&format!("{name} (raw)"), raw);
    terminal::display_matrix(&format!("{name} (normalized)"), &normalized);

    let dendrogram = match HierarchicalClusterer.cluster_dendrogram(&normalized) {
        Ok(d) => {
            display_tree(&d, clusters);
            Some(d)
        }
        Err(e) => {
            warn!(matrix = name, error = %e, "Skipping clustering");
            None
        }
    };
    Ok(MatrixReport::new(name, raw, &normalized, dendrogram.as_ref()))
}

fn display_tree(dendrogram: &Dendrogram, clusters: Option<usize>) {
    terminal::display_dendrogram(dendrogram);
    if let Some(k) = clusters {
        terminal::display_flat_clusters(dendrogram, k);
    }
}

/// One profiled batch: text statistics plus (compressor, ratio, bits/symbol).
struct ProfileRow {
    label: String,
    batch: usize,
    profile: TextProfile,
    compressors: Vec<(CompressorKind, f64, Option<f64>)>,
}

fn profile_corpora(
    corpora: &[Corpus],
    kinds: &[CompressorKind],
    batches: usize,
    ppm_order: usize,
) -> Vec<ProfileRow> {
    let compressors: Vec<_> = kinds.iter().map(|k| (*k, k.build(ppm_order))).collect();
    let mut rows = Vec::new();
    for corpus in corpora {
        for (idx, text) in corpus.batches.iter().take(batches).enumerate() {
            let measured = compressors
                .iter()
                .map(|(kind, c)| {
                    (
                        *kind,
                        c.compress(text).ratio,
                        compressor_bits_per_symbol(text, c.as_ref()),
                    )
                })
                .collect();
            rows.push(ProfileRow {
                label: corpus.label.clone(),
                batch: idx,
                profile: TextProfile::of(text),
                compressors: measured,
            });
        }
    }
    rows
}

fn display_profiles(rows: &[ProfileRow]) {
    println!("\n{}", format!("=== Profiles ({} batches) ===", rows.len()).bold());
    for row in rows {
        println!(
            "\n  {} #{}  {} chars  entropy {:.4} bits/char  avg word {:.2}  bound {:.0} bytes",
            row.label.bold(),
            row.batch,
            row.profile.chars,
            row.profile.entropy,
            row.profile.average_word_length,
            row.profile.entropy_bound_bytes,
        );
        for (kind, ratio, bps) in &row.compressors {
            let bps = bps.map_or_else(|| "n/a".to_string(), |b| format!("{b:.4}"));
            println!(
                "    {:<8} ratio {:.4}  bits/symbol {}",
                kind.as_str().dimmed(),
                ratio,
                bps
            );
        }
    }
}
