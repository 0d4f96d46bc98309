//! Reading of single restart fragments.
//!
//! A fragment is the file one restart directory holds for a probe field or
//! for the residual log. The file is read to completion and closed before
//! any parsing starts, so at most one handle is open per fragment.

use crate::error::{ConvergenceError, LineError, Result};
use crate::header::{LineKind, ProbeLocationRegistry, classify_line, parse_residual_schema};
use crate::models::{FieldSeries, RecordLayout, ResidualRow, ResidualSeries, ResidualValue};
use crate::record::{parse_probe_record, parse_residual_row};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Read one probe field fragment
pub fn read_probe_fragment(path: &Path, field: &str) -> Result<FieldSeries> {
    let lines = read_lines(path)?;
    parse_probe_lines(path, field, &lines)
}

/// Read one residual log fragment
pub fn read_residual_fragment(path: &Path) -> Result<ResidualSeries> {
    let lines = read_lines(path)?;
    parse_residual_lines(path, &lines)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let lines = BufReader::new(file).lines().collect::<std::io::Result<Vec<_>>>()?;
    Ok(lines)
}

/// Non-blank lines with their 1-based line numbers and kind
fn classified(lines: &[String]) -> impl Iterator<Item = (usize, &str, LineKind)> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line.as_str(), classify_line(line)))
}

/// Parse the lines of a probe fragment.
///
/// Locations are collected from every header line first; data lines are then
/// parsed without consulting them, against the layout of the first data line.
pub fn parse_probe_lines(path: &Path, field: &str, lines: &[String]) -> Result<FieldSeries> {
    let mut locations = ProbeLocationRegistry::new();
    for (line_number, line, kind) in classified(lines) {
        if kind == LineKind::Header {
            locations
                .observe(line)
                .map_err(|e| ConvergenceError::parse(path, line_number, e))?;
        }
    }

    let mut series = FieldSeries::new(field, locations);
    let mut layout: Option<RecordLayout> = None;

    for (line_number, line, kind) in classified(lines) {
        if kind == LineKind::Header {
            continue;
        }

        let fragment_layout = match layout {
            Some(layout) => layout,
            None => {
                let sniffed = RecordLayout::sniff(line)
                    .map_err(|e| ConvergenceError::parse(path, line_number, e))?;
                debug!("{}: {} in {}", field, sniffed, path.display());
                *layout.insert(sniffed)
            }
        };

        let sample = parse_probe_record(line, fragment_layout)
            .map_err(|e| ConvergenceError::parse(path, line_number, e))?;
        series.push_sample(sample);
    }

    series.layout = layout;

    debug!(
        "Parsed {} samples and {} probe locations from {}",
        series.len(),
        series.locations.len(),
        path.display()
    );

    Ok(series)
}

/// Active residual header and where each of its columns lands in the fragment schema
struct ActiveSchema {
    columns: Vec<String>,
    positions: Vec<usize>,
}

/// Parse the lines of a residual log fragment.
///
/// The first schema header fixes the fragment's columns. A later header may
/// reorder or drop columns; rows under it are realigned by column name.
pub fn parse_residual_lines(path: &Path, lines: &[String]) -> Result<ResidualSeries> {
    let mut series: Option<ResidualSeries> = None;
    let mut active: Option<ActiveSchema> = None;

    for (line_number, line, kind) in classified(lines) {
        match kind {
            LineKind::Header => {
                let Some(columns) = parse_residual_schema(line) else {
                    continue;
                };

                let positions = match &series {
                    None => (0..columns.len()).collect(),
                    Some(series) => schema_positions(series, &columns)
                        .map_err(|e| ConvergenceError::parse(path, line_number, e))?,
                };

                debug!("Residual schema {:?} in {}", columns, path.display());
                series.get_or_insert_with(|| ResidualSeries::new(columns.clone()));
                active = Some(ActiveSchema { columns, positions });
            }
            LineKind::Data => {
                let (Some(series), Some(schema)) = (series.as_mut(), active.as_ref()) else {
                    return Err(ConvergenceError::parse(path, line_number, LineError::NoSchema));
                };

                let row = parse_residual_row(line, &schema.columns)
                    .map_err(|e| ConvergenceError::parse(path, line_number, e))?;
                series.rows.push(realign(row, &schema.positions, series.columns.len()));
            }
        }
    }

    let series = series.unwrap_or_default();
    debug!(
        "Parsed {} residual rows with {} columns from {}",
        series.len(),
        series.columns.len(),
        path.display()
    );

    Ok(series)
}

fn schema_positions(series: &ResidualSeries, columns: &[String]) -> std::result::Result<Vec<usize>, LineError> {
    columns
        .iter()
        .map(|column| {
            series
                .column_index(column)
                .ok_or_else(|| LineError::SchemaViolation {
                    reason: format!(
                        "column '{}' is not declared by the first schema header {:?}",
                        column, series.columns
                    ),
                })
        })
        .collect()
}

/// Place row values at their schema positions, `Absent` elsewhere
pub(crate) fn realign(row: ResidualRow, positions: &[usize], width: usize) -> ResidualRow {
    let identity = positions.len() == width && positions.iter().enumerate().all(|(i, p)| i == *p);
    if identity {
        return row;
    }

    let mut values = vec![ResidualValue::Absent; width];
    for (value, position) in row.values.into_iter().zip(positions) {
        values[*position] = value;
    }
    ResidualRow { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProbeLocation, TimeSample};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    fn path() -> &'static Path {
        Path::new("postProcessing/convergenceProbes/0/U")
    }

    #[test]
    fn test_read_vector_probe_fragment() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "# Probe 0 (0.5 0.1 0.05)").unwrap();
        writeln!(temp_file, "# Probe 1 (1.5 0.1 0.05)").unwrap();
        writeln!(temp_file, "#       Probe             0             1").unwrap();
        writeln!(temp_file, "#        Time").unwrap();
        writeln!(temp_file, "1000 (0.2 0.0 0.01) (0.3 0.1 0.02)").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, "1001 (0.21 0.0 0.01) (0.31 0.1 0.02)").unwrap();

        let series = read_probe_fragment(temp_file.path(), "U").unwrap();

        assert_eq!(series.name, "U");
        assert_eq!(
            series.layout,
            Some(RecordLayout::Vector {
                probes: 2,
                components: 3
            })
        );
        assert_eq!(series.times, vec![1000.0, 1001.0]);
        assert_eq!(
            series.samples[0],
            TimeSample {
                time: 1000.0,
                values: vec![vec![0.2, 0.0, 0.01], vec![0.3, 0.1, 0.02]],
            }
        );
        assert_eq!(
            series.locations.get(0),
            Some(&ProbeLocation {
                index: 0,
                position: [0.5, 0.1, 0.05]
            })
        );
        assert_eq!(series.locations.len(), 2);
    }

    #[test]
    fn test_scalar_probe_fragment() {
        let text = "# Probe 0 (0 0 0)\n# Probe 1 (1 0 0)\n# Probe 2 (2 0 0)\n10 1 2 3\n20 4 5 6\n30 7 8 9\n";
        let series = parse_probe_lines(path(), "p", &lines(text)).unwrap();

        assert_eq!(series.layout, Some(RecordLayout::Scalar { probes: 3 }));
        assert_eq!(series.len(), 3);
        assert!(series.samples.iter().all(|s| s.probe_count() == 3));
        assert_eq!(series.component_series(1, 0), vec![2.0, 5.0, 8.0]);
    }

    #[test]
    fn test_locations_declared_after_data_are_collected() {
        let text = "1 0.5\n# Probe 0 (3 2 1)\n2 0.6\n";
        let series = parse_probe_lines(path(), "k", &lines(text)).unwrap();

        assert_eq!(series.locations.get(0).unwrap().position, [3.0, 2.0, 1.0]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_header_only_fragment() {
        let text = "# Probe 0 (0 0 0)\n#  Time\n";
        let series = parse_probe_lines(path(), "k", &lines(text)).unwrap();

        assert!(series.is_empty());
        assert_eq!(series.layout, None);
        assert_eq!(series.locations.len(), 1);
    }

    #[test]
    fn test_layout_change_reports_line() {
        let text = "# Probe 0 (0 0 0)\n1 (1 2 3)\n2 (1 2)\n";
        let error = parse_probe_lines(path(), "U", &lines(text)).unwrap_err();

        match error {
            ConvergenceError::Parse { path, line, source } => {
                assert!(path.ends_with("U"));
                assert_eq!(line, 3);
                assert!(matches!(source, LineError::SchemaViolation { .. }));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_header_reports_line() {
        let text = "# Probe zero (0 0 0)\n1 2\n";
        let error = parse_probe_lines(path(), "p", &lines(text)).unwrap_err();

        assert!(matches!(
            error,
            ConvergenceError::Parse {
                line: 1,
                source: LineError::MalformedHeader { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_time_reports_line() {
        let text = "1 2\n\n2 3\nend 4\n";
        let error = parse_probe_lines(path(), "p", &lines(text)).unwrap_err();

        assert!(matches!(
            error,
            ConvergenceError::Parse {
                line: 4,
                source: LineError::InvalidTime { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = read_probe_fragment(Path::new("/nonexistent/fragment/p"), "p");
        assert!(matches!(result, Err(ConvergenceError::Io(_))));
    }

    #[test]
    fn test_read_residual_fragment() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "# Residuals").unwrap();
        writeln!(temp_file, "# Time\tUx\tUy\tp").unwrap();
        writeln!(temp_file, "1000\t1.2e-4\tN/A\t3.4e-5").unwrap();
        writeln!(temp_file, "1001\t1.1e-4\t2.0e-4\t3.0e-5").unwrap();

        let series = read_residual_fragment(temp_file.path()).unwrap();

        assert_eq!(series.columns, vec!["time", "ux", "uy", "p"]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.value(0, "ux"), Some(1.2e-4));
        assert!(series.value(0, "uy").unwrap().is_nan());
        assert_eq!(series.value(0, "p"), Some(3.4e-5));
        assert_eq!(series.value(1, "uy"), Some(2.0e-4));
    }

    #[test]
    fn test_residual_data_before_schema() {
        let text = "# Residuals\n1000 0.1 0.2\n";
        let error = parse_residual_lines(Path::new("residuals.dat"), &lines(text)).unwrap_err();

        assert!(matches!(
            error,
            ConvergenceError::Parse {
                line: 2,
                source: LineError::NoSchema,
                ..
            }
        ));
    }

    #[test]
    fn test_residual_row_too_long() {
        let text = "# Time p\n1 0.1 0.2\n";
        let error = parse_residual_lines(Path::new("residuals.dat"), &lines(text)).unwrap_err();

        assert_eq!(
            error.line_error(),
            Some(&LineError::ColumnCountMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_residual_schema_realigned_by_name() {
        let text = "# Time ux p\n1 0.1 0.2\n# Time p\n2 0.3\n";
        let series = parse_residual_lines(Path::new("residuals.dat"), &lines(text)).unwrap();

        assert_eq!(series.columns, vec!["time", "ux", "p"]);
        assert_eq!(series.rows[1].values[0], ResidualValue::Parsed(2.0));
        assert_eq!(series.rows[1].values[1], ResidualValue::Absent);
        assert_eq!(series.rows[1].values[2], ResidualValue::Parsed(0.3));
    }

    #[test]
    fn test_residual_schema_new_column_in_fragment() {
        let text = "# Time ux\n1 0.1\n# Time ux k\n2 0.1 0.2\n";
        let error = parse_residual_lines(Path::new("residuals.dat"), &lines(text)).unwrap_err();

        assert!(matches!(
            error,
            ConvergenceError::Parse {
                line: 3,
                source: LineError::SchemaViolation { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_empty_residual_fragment() {
        let series = parse_residual_lines(Path::new("residuals.dat"), &[]).unwrap();
        assert!(series.columns.is_empty());
        assert!(series.is_empty());
    }
}
