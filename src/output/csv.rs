// Matrix CSV: write and read the label-indexed format.
//
//   ,A,B
//   A,0.000000,0.420000
//   B,0.420000,0.000000
//
// Values use six decimals; cells that were never computed are `NA`. Labels
// are quoted only when they contain a comma, quote or newline.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::analysis::cross_entropy::{BatchCrossEntropy, CrossEntropyReport};
use crate::distance::DistanceMatrix;
use crate::error::AnalysisError;

const NOT_COMPUTED: &str = "NA";

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => NOT_COMPUTED.to_string(),
    }
}

/// Label-indexed table of optional values, one row per label.
fn format_table(labels: &[String], rows: &[Vec<Option<f64>>]) -> String {
    let mut out = String::new();
    for label in labels {
        out.push(',');
        out.push_str(&quote(label));
    }
    out.push('\n');
    for (label, row) in labels.iter().zip(rows) {
        out.push_str(&quote(label));
        for &value in row {
            out.push(',');
            out.push_str(&format_value(value));
        }
        out.push('\n');
    }
    out
}

/// Render `matrix` in the CSV layout above.
pub fn format_matrix(matrix: &DistanceMatrix) -> String {
    format_table(matrix.labels(), &matrix.to_rows())
}

/// Write `matrix` to `path`, creating parent directories as needed.
pub fn write_matrix(matrix: &DistanceMatrix, path: &Path) -> Result<()> {
    write_file(path, &format_matrix(matrix))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Split one CSV line into fields, honoring double-quoted fields.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Parse the CSV layout back into a matrix. `NA` (and empty) cells read as
/// not computed; the values must be symmetric with a zero diagonal.
pub fn parse_matrix(text: &str) -> Result<DistanceMatrix, AnalysisError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(AnalysisError::Parse {
            line: 1,
            message: "empty matrix file".to_string(),
        });
    };
    let labels: Vec<String> = split_fields(header).into_iter().skip(1).collect();
    let n = labels.len();

    let mut rows = Vec::with_capacity(n);
    for (idx, line) in lines {
        let line_no = idx + 1;
        let fields = split_fields(line);
        if fields.len() != n + 1 {
            return Err(AnalysisError::Parse {
                line: line_no,
                message: format!("expected {} fields, found {}", n + 1, fields.len()),
            });
        }
        if labels.get(rows.len()) != Some(&fields[0]) {
            return Err(AnalysisError::Parse {
                line: line_no,
                message: format!("unexpected row label '{}'", fields[0]),
            });
        }
        let row = fields[1..]
            .iter()
            .map(|f| match f.trim() {
                "" | NOT_COMPUTED => Ok(f64::NAN),
                v => v.parse::<f64>().map_err(|e| AnalysisError::Parse {
                    line: line_no,
                    message: format!("bad value '{v}': {e}"),
                }),
            })
            .collect::<Result<Vec<f64>, AnalysisError>>()?;
        rows.push(row);
    }

    DistanceMatrix::from_rows(labels, &rows)
}

/// Read a matrix CSV from disk.
pub fn read_matrix(path: &Path) -> Result<DistanceMatrix> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_matrix(&text).with_context(|| format!("invalid matrix file {}", path.display()))
}

fn format_details(rows: &[&BatchCrossEntropy]) -> String {
    let mut out =
        String::from("batch,target_entropy,cross_entropy,kl_divergence,compression_ratio\n");
    for r in rows {
        out.push_str(&format!(
            "{},{:.6},{:.6},{:.6},{:.6}\n",
            r.batch_index, r.target_entropy, r.cross_entropy, r.kl_divergence, r.compression_ratio
        ));
    }
    out
}

/// Write the cross-entropy and KL matrices (rows = target, columns = source)
/// plus one `details_<source>_to_<target>.csv` per measured pair into `dir`.
pub fn write_cross_entropy(report: &CrossEntropyReport, dir: &Path) -> Result<()> {
    write_file(
        &dir.join("cross_entropy_matrix.csv"),
        &format_table(&report.labels, &report.cross_entropy),
    )?;
    write_file(
        &dir.join("kl_divergence_matrix.csv"),
        &format_table(&report.labels, &report.kl_divergence),
    )?;

    for source in &report.labels {
        for target in &report.labels {
            let rows: Vec<_> = report.pair_details(source, target).collect();
            if rows.is_empty() {
                continue;
            }
            let name = format!(
                "details_{}_to_{}.csv",
                file_stem(source),
                file_stem(target)
            );
            write_file(&dir.join(name), &format_details(&rows))?;
        }
    }
    Ok(())
}

/// A label reduced to something safe in a file name.
fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DistanceMatrix {
        DistanceMatrix::from_rows(
            vec!["A".into(), "B".into()],
            &[vec![0.0, 0.42], vec![0.42, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_format_is_exact() {
        assert_eq!(
            format_matrix(&sample()),
            ",A,B\nA,0.000000,0.420000\nB,0.420000,0.000000\n"
        );
    }

    #[test]
    fn test_missing_cells_are_na() {
        let m = DistanceMatrix::empty(vec!["A".into(), "B".into()]);
        assert_eq!(format_matrix(&m), ",A,B\nA,0.000000,NA\nB,NA,0.000000\n");
        assert_eq!(parse_matrix(&format_matrix(&m)).unwrap(), m);
    }

    #[test]
    fn test_quoted_labels() {
        let m = DistanceMatrix::empty(vec!["Norte, Sul".into(), "B".into()]);
        let text = format_matrix(&m);
        assert!(text.starts_with(",\"Norte, Sul\",B\n"));
        assert_eq!(parse_matrix(&text).unwrap().labels(), m.labels());
    }

    #[test]
    fn test_parse_rejects_bad_rows() {
        assert!(parse_matrix("").is_err());
        assert!(parse_matrix(",A,B\nA,0,0.1\n").is_err());
        assert!(parse_matrix(",A,B\nA,0,0.1\nC,0.1,0\n").is_err());
        assert!(parse_matrix(",A,B\nA,0,x\nB,0.1,0\n").is_err());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Centro Oeste"), "centro_oeste");
    }
}
