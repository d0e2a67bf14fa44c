// Unit tests for distance matrices, normalization and clustering.
//
// Uses the four-corpus A-D matrix throughout:
//
//        A     B     C     D
//   A  0.00  0.42  0.65  0.58
//   B  0.42  0.00  0.52  0.37
//   C  0.65  0.52  0.00  0.30
//   D  0.58  0.37  0.30  0.00

use dialect_ncd::cluster::HierarchicalClusterer;
use dialect_ncd::distance::{DistanceMatrix, MatrixNormalizer, NormalizationRange};
use dialect_ncd::AnalysisError;

fn abcd() -> DistanceMatrix {
    let labels = ["A", "B", "C", "D"].map(String::from).to_vec();
    let rows = vec![
        vec![0.0, 0.42, 0.65, 0.58],
        vec![0.42, 0.0, 0.52, 0.37],
        vec![0.65, 0.52, 0.0, 0.30],
        vec![0.58, 0.37, 0.30, 0.0],
    ];
    DistanceMatrix::from_rows(labels, &rows).unwrap()
}

fn assert_symmetric_zero_diagonal(m: &DistanceMatrix) {
    for i in 0..m.len() {
        assert_eq!(m.get(i, i), Some(0.0));
        for j in 0..m.len() {
            assert_eq!(m.get(i, j), m.get(j, i));
        }
    }
}

// ============================================================
// DistanceMatrix: structure
// ============================================================

#[test]
fn matrix_is_symmetric_with_zero_diagonal() {
    assert_symmetric_zero_diagonal(&abcd());
}

#[test]
fn set_mirrors_and_ignores_diagonal() {
    let mut m = DistanceMatrix::empty(vec!["A".into(), "B".into()]);
    m.set(1, 0, Some(0.25));
    m.set(0, 0, Some(0.9));
    assert_eq!(m.get(0, 1), Some(0.25));
    assert_eq!(m.get(0, 0), Some(0.0));
    assert!(m.is_complete());
}

#[test]
fn mean_of_matrices_is_elementwise() {
    let labels = vec!["A".to_string(), "B".to_string()];
    let a = DistanceMatrix::from_cells(labels.clone(), [(0, 1, Some(0.2))]);
    let b = DistanceMatrix::from_cells(labels.clone(), [(0, 1, Some(0.6))]);
    let combined = DistanceMatrix::mean(&[a.clone(), b]).unwrap();
    assert!((combined.get(0, 1).unwrap() - 0.4).abs() < 1e-12);

    let missing = DistanceMatrix::empty(labels);
    let combined = DistanceMatrix::mean(&[a, missing]).unwrap();
    assert_eq!(combined.get(0, 1), None);
}

#[test]
fn mean_rejects_label_mismatch() {
    let a = DistanceMatrix::empty(vec!["A".into(), "B".into()]);
    let b = DistanceMatrix::empty(vec!["A".into(), "C".into()]);
    assert!(matches!(
        DistanceMatrix::mean(&[a, b]),
        Err(AnalysisError::LabelMismatch { .. })
    ));
}

// ============================================================
// MatrixNormalizer
// ============================================================

#[test]
fn unit_normalization_maps_extremes_to_bounds() {
    let m = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&abcd());
    assert!(m.get(2, 3).unwrap().abs() < 1e-12);
    assert!((m.get(0, 2).unwrap() - 1.0).abs() < 1e-12);
    assert_symmetric_zero_diagonal(&m);
}

#[test]
fn default_normalization_is_visual_range() {
    let m = MatrixNormalizer::default().normalize(&abcd());
    assert!((m.get(2, 3).unwrap() - 0.1).abs() < 1e-12);
    assert!((m.get(0, 2).unwrap() - 0.9).abs() < 1e-12);
}

#[test]
fn degenerate_matrix_is_returned_unchanged() {
    let labels = ["A", "B", "C"].map(String::from).to_vec();
    let rows = vec![
        vec![0.0, 0.5, 0.5],
        vec![0.5, 0.0, 0.5],
        vec![0.5, 0.5, 0.0],
    ];
    let m = DistanceMatrix::from_rows(labels, &rows).unwrap();
    assert_eq!(MatrixNormalizer::default().normalize(&m), m);
}

#[test]
fn inverted_range_is_rejected() {
    assert!(matches!(
        NormalizationRange::new(0.9, 0.1),
        Err(AnalysisError::InvalidRange { .. })
    ));
}

// ============================================================
// HierarchicalClusterer: A-D scenario
// ============================================================

#[test]
fn abcd_merges_c_and_d_first() {
    let steps = HierarchicalClusterer.cluster(&abcd()).unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!((steps[0].cluster_a, steps[0].cluster_b), (2, 3));
    assert!((steps[0].distance - 0.30).abs() < 1e-12);
    assert_eq!(steps.last().unwrap().new_cluster_size, 4);
}

#[test]
fn abcd_full_tree() {
    let steps = HierarchicalClusterer.cluster(&abcd()).unwrap();
    // A-B at 0.42 beats B-(CD) at (0.52 + 0.37) / 2 = 0.445
    assert_eq!((steps[1].cluster_a, steps[1].cluster_b), (0, 1));
    assert!((steps[1].distance - 0.42).abs() < 1e-12);
    // (AB)-(CD) is the mean of all four cross distances
    assert_eq!((steps[2].cluster_a, steps[2].cluster_b), (4, 5));
    assert!((steps[2].distance - 0.53).abs() < 1e-12);
}

#[test]
fn normalized_abcd_keeps_topology() {
    let normalized = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&abcd());
    let raw = HierarchicalClusterer.cluster_dendrogram(&abcd()).unwrap();
    let norm = HierarchicalClusterer.cluster_dendrogram(&normalized).unwrap();
    assert_eq!(raw.leaf_order(), norm.leaf_order());
    assert_eq!(norm.cut_to_k(2), vec![0, 0, 1, 1]);
}

#[test]
fn missing_cell_survives_normalization_and_blocks_clustering() {
    let mut m = abcd();
    m.set(0, 3, None);
    let normalized = MatrixNormalizer::new(NormalizationRange::UNIT).normalize(&m);
    assert_eq!(normalized.get(0, 3), None);
    assert_eq!(normalized.get(3, 0), None);
    assert_eq!(
        HierarchicalClusterer.cluster(&normalized),
        Err(AnalysisError::IncompleteMatrix {
            a: "A".into(),
            b: "D".into()
        })
    );
}

#[test]
fn non_finite_distance_is_rejected() {
    let m = DistanceMatrix::from_cells(
        vec!["A".into(), "B".into()],
        [(0, 1, Some(f64::INFINITY))],
    );
    assert!(matches!(
        HierarchicalClusterer.cluster(&m),
        Err(AnalysisError::NonFiniteDistance { .. })
    ));
}
