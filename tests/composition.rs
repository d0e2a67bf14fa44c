// Composition tests: verifying that the stages chain together correctly.
//
// These tests exercise the data flow between modules:
//   Sampler -> Matrix pipeline -> Normalizer -> Clusterer -> CSV / JSON
// against small corpus trees in temporary directories. Nothing touches the
// network.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use dialect_ncd::analysis::CrossEntropyAnalyzer;
use dialect_ncd::cluster::HierarchicalClusterer;
use dialect_ncd::compression::{CompressorKind, ZlibCompressor};
use dialect_ncd::corpus::sampler::BatchSampler;
use dialect_ncd::corpus::Corpus;
use dialect_ncd::distance::{
    DistanceMatrix, DistanceMatrixBuilder, MatrixNormalizer, NormalizationRange,
};
use dialect_ncd::output::csv;
use dialect_ncd::output::report::{MatrixReport, RunReport};
use dialect_ncd::pipeline;
use tempfile::TempDir;

const RIVER: &str = "o barco desce o rio com farinha, peixe e castanha para a feira. ";
const RIVER_VARIANT: &str = "o barco sobe o rio com farinha, peixe e acai para a feira. ";
const DIGITS: &str = "4471 zq 0092 kkx 8813 wvv 37 pqz 1205 mmj 66 trx 9031 hhg. ";

fn write_region(root: &Path, region: &str, files: &[String]) {
    let dir = root.join(region).join("splits").join("train");
    fs::create_dir_all(&dir).unwrap();
    for (i, text) in files.iter().enumerate() {
        fs::write(dir.join(format!("{i:02}.txt")), text).unwrap();
    }
}

/// Norte and Nordeste share vocabulary; Sul is unrelated noise.
fn corpus_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_region(
        tmp.path(),
        "norte",
        &[RIVER.repeat(20), RIVER.repeat(18)],
    );
    write_region(
        tmp.path(),
        "nordeste",
        &[RIVER_VARIANT.repeat(20), RIVER.repeat(15)],
    );
    write_region(tmp.path(), "sul", &[DIGITS.repeat(20), DIGITS.repeat(17)]);
    tmp
}

fn load(root: &Path) -> Vec<Corpus> {
    let regions = ["norte", "nordeste", "sul"].map(String::from);
    BatchSampler::default().load_regions(root, &regions, "train")
}

// ============================================================
// Chain: Sampler -> Matrix -> Normalizer -> Clusterer
// ============================================================

#[test]
fn related_regions_merge_first() {
    let tmp = corpus_tree();
    let corpora = load(tmp.path());
    assert_eq!(corpora.len(), 3);

    let raw = DistanceMatrixBuilder::default().build(&corpora, &ZlibCompressor::default());
    assert!(raw.is_complete());
    assert!(raw.get(0, 1).unwrap() < raw.get(0, 2).unwrap());

    let normalized = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&raw);
    let dendrogram = HierarchicalClusterer.cluster_dendrogram(&normalized).unwrap();
    let first = dendrogram.steps()[0];
    assert_eq!((first.cluster_a, first.cluster_b), (0, 1));
    assert_eq!(dendrogram.cut_to_k(2), vec![0, 0, 1]);
}

#[tokio::test]
async fn concurrent_pipeline_matches_sequential_builder() {
    let tmp = corpus_tree();
    let corpora = load(tmp.path());
    let builder = DistanceMatrixBuilder::default();

    for kind in CompressorKind::ALL {
        let compressor = kind.build(2);
        let sequential = builder.build(&corpora, compressor.as_ref());
        let concurrent =
            pipeline::matrix::run(Arc::new(corpora.clone()), compressor, &builder, 3).await;
        assert_eq!(concurrent, sequential, "{kind} differs");
    }
}

#[test]
fn combined_matrix_clusters_like_its_parts() {
    let tmp = corpus_tree();
    let corpora = load(tmp.path());
    let builder = DistanceMatrixBuilder::default();

    let matrices: Vec<DistanceMatrix> = CompressorKind::ALL
        .iter()
        .map(|kind| builder.build(&corpora, kind.build(2).as_ref()))
        .collect();
    let combined = DistanceMatrix::mean(&matrices).unwrap();
    let normalized = MatrixNormalizer::default().normalize(&combined);
    let steps = HierarchicalClusterer.cluster(&normalized).unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].new_cluster_size, 3);
}

// ============================================================
// Chain: Matrix -> CSV -> Matrix -> Clusterer
// ============================================================

#[test]
fn saved_matrix_reclusters_identically() {
    let tmp = corpus_tree();
    let corpora = load(tmp.path());
    let raw = DistanceMatrixBuilder::default().build(&corpora, &ZlibCompressor::default());
    let normalized = MatrixNormalizer::default().normalize(&raw);

    let path = tmp.path().join("out").join("matrix_zlib_normalized.csv");
    csv::write_matrix(&normalized, &path).unwrap();
    let reread = csv::read_matrix(&path).unwrap();
    assert_eq!(reread.labels(), normalized.labels());

    let before = HierarchicalClusterer.cluster_dendrogram(&normalized).unwrap();
    let after = HierarchicalClusterer.cluster_dendrogram(&reread).unwrap();
    assert_eq!(before.leaf_order(), after.leaf_order());
    assert_eq!(before.cut_to_k(2), after.cut_to_k(2));
}

#[test]
fn run_report_is_valid_json() {
    let tmp = corpus_tree();
    let corpora = load(tmp.path());
    let raw = DistanceMatrixBuilder::default().build(&corpora, &ZlibCompressor::default());
    let normalized = MatrixNormalizer::default().normalize(&raw);
    let dendrogram = HierarchicalClusterer.cluster_dendrogram(&normalized).unwrap();

    let mut report = RunReport::new(&corpora);
    report.push(MatrixReport::new("zlib", &raw, &normalized, Some(&dendrogram)));
    let path = tmp.path().join("report.json");
    report.write(&path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["labels"][0], "Norte");
    assert_eq!(value["matrices"][0]["linkage"].as_array().unwrap().len(), 2);
    assert!(value["generated_at"].is_string());
    assert!(value["matrices"][0]["newick"].as_str().unwrap().ends_with(';'));
}

// ============================================================
// Chain: Sampler -> Cross-entropy -> CSV
// ============================================================

#[test]
fn cross_entropy_prefers_related_models() {
    let tmp = corpus_tree();
    let corpora = load(tmp.path());
    let report = CrossEntropyAnalyzer::default().analyze(&corpora);

    // Nordeste text is cheaper under Norte's model than under Sul's
    let under_norte = report.cross_entropy[1][0].unwrap();
    let under_sul = report.cross_entropy[1][2].unwrap();
    assert!(under_norte < under_sul);

    let out = tmp.path().join("ce");
    csv::write_cross_entropy(&report, &out).unwrap();
    assert!(out.join("cross_entropy_matrix.csv").is_file());
    assert!(out.join("kl_divergence_matrix.csv").is_file());
    assert!(out.join("details_norte_to_nordeste.csv").is_file());

    let symmetric = report.symmetric_kl();
    let steps = HierarchicalClusterer.cluster(&symmetric).unwrap();
    assert_eq!((steps[0].cluster_a, steps[0].cluster_b), (0, 1));
}
