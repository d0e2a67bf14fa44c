// Colored terminal output for matrices, trees and profiles.
//
// main.rs display paths delegate here; nothing in this module computes.

use colored::{ColoredString, Colorize};

use super::truncate_chars;
use crate::analysis::cross_entropy::CrossEntropyReport;
use crate::cluster::Dendrogram;
use crate::distance::DistanceMatrix;

const LABEL_WIDTH: usize = 12;

/// Color a normalized-range distance: close pairs green, far pairs red.
fn colorize_distance(value: Option<f64>) -> ColoredString {
    match value {
        None => format!("{:>9}", "NA").dimmed(),
        Some(v) => {
            let s = format!("{v:>9.6}");
            if v == 0.0 {
                s.dimmed()
            } else if v < 0.35 {
                s.green()
            } else if v < 0.65 {
                s.yellow()
            } else {
                s.red()
            }
        }
    }
}

fn print_table(title: &str, labels: &[String], rows: &[Vec<Option<f64>>]) {
    println!("\n{}", format!("=== {title} ===").bold());
    print!("  {:<width$}", "", width = LABEL_WIDTH);
    for label in labels {
        print!(" {:>9}", truncate_chars(label, 9).dimmed());
    }
    println!();
    for (label, row) in labels.iter().zip(rows) {
        print!(
            "  {:<width$}",
            truncate_chars(label, LABEL_WIDTH),
            width = LABEL_WIDTH
        );
        for &value in row {
            print!(" {}", colorize_distance(value));
        }
        println!();
    }
}

/// Print a distance matrix with six decimals.
pub fn display_matrix(title: &str, matrix: &DistanceMatrix) {
    print_table(title, matrix.labels(), &matrix.to_rows());
    let missing = matrix.missing_pairs();
    if !missing.is_empty() {
        println!(
            "  {} {} pair(s) not computed",
            "!".bright_red(),
            missing.len()
        );
    }
}

/// Print the merge tree as an indented outline, root first.
pub fn display_dendrogram(dendrogram: &Dendrogram) {
    println!("\n{}", "=== Linkage tree ===".bold());
    match dendrogram.root() {
        Some(root) => print_node(dendrogram, root, 1),
        None => println!("  (no complete tree)"),
    }

    println!("\n  {}", "Merges:".dimmed());
    let labels = dendrogram.labels();
    for (k, step) in dendrogram.steps().iter().enumerate() {
        let names: Vec<&str> = dendrogram
            .members(labels.len() + k)
            .into_iter()
            .map(|i| labels[i].as_str())
            .collect();
        println!(
            "  {:>2}. {:.6}  [{}]",
            k + 1,
            step.distance,
            names.join(", ")
        );
    }
}

fn print_node(dendrogram: &Dendrogram, cluster: usize, depth: usize) {
    let indent = "  ".repeat(depth);
    let n = dendrogram.n_items();
    if cluster < n {
        println!("{indent}{}", dendrogram.labels()[cluster].bold());
        return;
    }
    println!(
        "{indent}{} {}",
        "+".dimmed(),
        format!("{:.6}", dendrogram.height(cluster)).cyan()
    );
    let step = &dendrogram.steps()[cluster - n];
    print_node(dendrogram, step.cluster_a, depth + 1);
    print_node(dendrogram, step.cluster_b, depth + 1);
}

/// Print flat cluster assignments for a cut into `k` groups.
pub fn display_flat_clusters(dendrogram: &Dendrogram, k: usize) {
    let assignment = dendrogram.cut_to_k(k);
    let groups = assignment.iter().copied().max().map_or(0, |m| m + 1);
    println!("\n{}", format!("=== {groups} clusters ===").bold());
    for group in 0..groups {
        let names: Vec<&str> = assignment
            .iter()
            .enumerate()
            .filter(|&(_, &g)| g == group)
            .map(|(i, _)| dendrogram.labels()[i].as_str())
            .collect();
        println!("  {:>2}: {}", group + 1, names.join(", "));
    }
}

/// Print both cross-entropy matrices (rows = target, columns = source).
pub fn display_cross_entropy(report: &CrossEntropyReport) {
    println!(
        "\n{}",
        "Rows are targets, columns are source models (bits/char)".dimmed()
    );
    print_table("Cross-entropy", &report.labels, &report.cross_entropy);
    print_table("KL divergence", &report.labels, &report.kl_divergence);
}
