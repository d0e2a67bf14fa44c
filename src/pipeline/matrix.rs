// Concurrent distance-matrix pipeline.
//
// Every unordered corpus pair is independent, so each one runs on the
// blocking pool and produces exactly one cell. Cells are collected and the
// matrix is assembled once all workers are done, so nothing is shared
// mutably. Corpora and the compressor are read-only behind `Arc`.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::compression::Compressor;
use crate::corpus::Corpus;
use crate::distance::{DistanceMatrix, DistanceMatrixBuilder};

/// Build the distance matrix for `corpora` with up to `concurrency` pairs in
/// flight. A pair whose worker panics is left not computed.
pub async fn run(
    corpora: Arc<Vec<Corpus>>,
    compressor: Arc<dyn Compressor>,
    builder: &DistanceMatrixBuilder,
    concurrency: usize,
) -> DistanceMatrix {
    let n = corpora.len();
    let labels: Vec<String> = corpora.iter().map(|c| c.label.clone()).collect();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    info!(
        compressor = compressor.name(),
        corpora = n,
        pairs = pairs.len(),
        concurrency,
        "Building distance matrix"
    );

    let pb = ProgressBar::new(pairs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Pairs [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );

    let cells: Vec<(usize, usize, Option<f64>)> = stream::iter(pairs.into_iter().map(|(i, j)| {
        let corpora = Arc::clone(&corpora);
        let compressor = Arc::clone(&compressor);
        let builder = builder.clone();
        let pb = pb.clone();
        async move {
            let joined = tokio::task::spawn_blocking(move || {
                builder.pair_distance(&corpora[i], &corpora[j], compressor.as_ref())
            })
            .await;
            pb.inc(1);
            match joined {
                Ok(value) => (i, j, value),
                Err(e) => {
                    warn!(a = i, b = j, error = %e, "Pair worker failed, leaving cell empty");
                    (i, j, None)
                }
            }
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await;
    pb.finish_and_clear();

    let matrix = DistanceMatrix::from_cells(labels, cells);
    let missing = matrix.missing_pairs();
    if !missing.is_empty() {
        warn!(
            compressor = compressor.name(),
            missing = missing.len(),
            "Matrix has pairs that were not computed"
        );
    }
    matrix
}
