//! Data line parsing for probe and residual files.
//!
//! Probe records are `<time> <value>...` for scalar fields or
//! `<time> (<v0> <v1> ...) (<v0> <v1> ...)` for vector and tensor fields,
//! one value or group per probe in probe order. The layout is sniffed once
//! from the first data line of a fragment and every later line must match it.

use crate::error::LineError;
use crate::models::{RecordLayout, ResidualRow, ResidualValue, TimeSample};

impl RecordLayout {
    /// Determine the record layout from a single data line
    pub fn sniff(line: &str) -> Result<Self, LineError> {
        let (_, tokens) = split_time(line)?;

        if !tokens.iter().any(|token| token.contains(')')) {
            return Ok(RecordLayout::Scalar {
                probes: tokens.len(),
            });
        }

        let groups = group_vectors(&tokens)?;
        let components = groups.first().map_or(0, Vec::len);
        if let Some(group) = groups.iter().find(|group| group.len() != components) {
            return Err(LineError::SchemaViolation {
                reason: format!(
                    "vector groups have mixed widths ({} and {})",
                    components,
                    group.len()
                ),
            });
        }

        Ok(RecordLayout::Vector {
            probes: groups.len(),
            components,
        })
    }
}

/// Parse one probe data line against the fragment's layout
pub fn parse_probe_record(line: &str, layout: RecordLayout) -> Result<TimeSample, LineError> {
    let (time, tokens) = split_time(line)?;

    let values = match layout {
        RecordLayout::Scalar { .. } => {
            if tokens.iter().any(|token| token.contains(')')) {
                return Err(LineError::SchemaViolation {
                    reason: format!("found vector groups, expected {}", layout),
                });
            }
            tokens
                .iter()
                .map(|token| parse_value(token).map(|value| vec![value]))
                .collect::<Result<Vec<_>, _>>()?
        }
        RecordLayout::Vector { components, .. } => {
            let groups = group_vectors(&tokens)?;
            if let Some(group) = groups.iter().find(|group| group.len() != components) {
                return Err(LineError::SchemaViolation {
                    reason: format!(
                        "found a group of {} components, expected {}",
                        group.len(),
                        layout
                    ),
                });
            }
            groups
        }
    };

    if values.len() != layout.probes() {
        return Err(LineError::SchemaViolation {
            reason: format!("found {} probes, expected {}", values.len(), layout),
        });
    }

    Ok(TimeSample { time, values })
}

/// Parse one residual data line against the active schema.
///
/// Tokens that are not numbers become [`ResidualValue::Unparseable`]; a row
/// shorter than the schema is padded with [`ResidualValue::Absent`].
pub fn parse_residual_row(line: &str, schema: &[String]) -> Result<ResidualRow, LineError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.len() > schema.len() {
        return Err(LineError::ColumnCountMismatch {
            expected: schema.len(),
            found: tokens.len(),
        });
    }

    let mut values: Vec<ResidualValue> = tokens.into_iter().map(ResidualValue::parse).collect();
    values.resize(schema.len(), ResidualValue::Absent);

    Ok(ResidualRow { values })
}

fn split_time(line: &str) -> Result<(f64, Vec<&str>), LineError> {
    let mut tokens = line.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    let time = first.parse::<f64>().map_err(|_| LineError::InvalidTime {
        token: first.to_string(),
    })?;
    Ok((time, tokens.collect()))
}

fn parse_value(token: &str) -> Result<f64, LineError> {
    token.parse::<f64>().map_err(|_| LineError::InvalidValue {
        token: token.to_string(),
    })
}

/// Collect `(a b c)` token runs into one vector per group
fn group_vectors(tokens: &[&str]) -> Result<Vec<Vec<f64>>, LineError> {
    let mut groups = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        let token = token.strip_prefix('(').unwrap_or(token);
        if let Some(last) = token.strip_suffix(')') {
            if !last.is_empty() {
                current.push(parse_value(last)?);
            }
            groups.push(std::mem::take(&mut current));
        } else if !token.is_empty() {
            current.push(parse_value(token)?);
        }
    }

    if !current.is_empty() {
        return Err(LineError::SchemaViolation {
            reason: format!("unterminated vector group of {} values", current.len()),
        });
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_sniff_scalar() {
        let layout = RecordLayout::sniff("100 1.5 2.5 3.5").unwrap();
        assert_eq!(layout, RecordLayout::Scalar { probes: 3 });
    }

    #[test]
    fn test_sniff_vector() {
        let layout = RecordLayout::sniff("100 (1 2 3) (4 5 6)").unwrap();
        assert_eq!(
            layout,
            RecordLayout::Vector {
                probes: 2,
                components: 3
            }
        );
    }

    #[test]
    fn test_sniff_tensor() {
        let layout = RecordLayout::sniff("5 (1 2 3 4 5 6)").unwrap();
        assert_eq!(layout.components(), 6);
        assert_eq!(layout.probes(), 1);
    }

    #[test]
    fn test_sniff_mixed_widths() {
        let error = RecordLayout::sniff("100 (1 2 3) (4 5)").unwrap_err();
        assert!(matches!(error, LineError::SchemaViolation { .. }));
    }

    #[test]
    fn test_parse_vector_record() {
        let layout = RecordLayout::sniff("1000 (0.2 0.0 0.01)").unwrap();
        let sample = parse_probe_record("1000 (0.2 0.0 0.01)", layout).unwrap();

        assert_eq!(
            sample,
            TimeSample {
                time: 1000.0,
                values: vec![vec![0.2, 0.0, 0.01]],
            }
        );
    }

    #[test]
    fn test_parse_scalar_record_one_component_per_probe() {
        let layout = RecordLayout::Scalar { probes: 4 };
        let sample = parse_probe_record("12\t0.1 -0.2   3e-3 4", layout).unwrap();

        assert_eq!(sample.time, 12.0);
        assert_eq!(sample.probe_count(), 4);
        assert!(sample.values.iter().all(|probe| probe.len() == 1));
        assert_eq!(sample.component(2, 0), Some(0.003));
    }

    #[test]
    fn test_vector_grouping_reproduces_tokens() {
        let line = "250 (1.5 -2 0.25) (3 4.125 -0.5) (7 8 9)";
        let layout = RecordLayout::sniff(line).unwrap();
        let sample = parse_probe_record(line, layout).unwrap();

        let regrouped: Vec<String> = sample
            .values
            .iter()
            .map(|vector| {
                let parts: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
                format!("({})", parts.join(" "))
            })
            .collect();
        let original: Vec<&str> = line.split_whitespace().skip(1).collect();

        assert_eq!(regrouped.join(" "), original.join(" "));
    }

    #[test]
    fn test_component_order_is_preserved() {
        let layout = RecordLayout::sniff("0 (3 1 2)").unwrap();
        let sample = parse_probe_record("1 (9 7 8)", layout).unwrap();
        assert_eq!(sample.values, vec![vec![9.0, 7.0, 8.0]]);
    }

    #[test]
    fn test_invalid_time() {
        let error = parse_probe_record("abc 1 2", RecordLayout::Scalar { probes: 2 }).unwrap_err();
        assert_eq!(
            error,
            LineError::InvalidTime {
                token: "abc".to_string()
            }
        );

        assert!(matches!(
            RecordLayout::sniff("t=5 (1 2 3)"),
            Err(LineError::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_invalid_component_value() {
        let layout = RecordLayout::Vector {
            probes: 1,
            components: 3,
        };
        let error = parse_probe_record("1 (0.1 nope 0.3)", layout).unwrap_err();
        assert_eq!(
            error,
            LineError::InvalidValue {
                token: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_probe_count_must_match_layout() {
        let layout = RecordLayout::Scalar { probes: 3 };
        let error = parse_probe_record("1 0.1 0.2", layout).unwrap_err();
        assert!(matches!(error, LineError::SchemaViolation { .. }));
    }

    #[test]
    fn test_component_width_must_match_layout() {
        let layout = RecordLayout::Vector {
            probes: 2,
            components: 3,
        };
        let error = parse_probe_record("1 (1 2 3) (4 5 6 7)", layout).unwrap_err();
        assert!(matches!(error, LineError::SchemaViolation { .. }));
    }

    #[test]
    fn test_vector_line_in_scalar_fragment() {
        let layout = RecordLayout::Scalar { probes: 1 };
        let error = parse_probe_record("1 (1 2 3)", layout).unwrap_err();
        assert!(matches!(error, LineError::SchemaViolation { .. }));
    }

    #[test]
    fn test_unterminated_group() {
        let error = RecordLayout::sniff("1 (1 2 3) (4 5").unwrap_err();
        assert!(matches!(error, LineError::SchemaViolation { .. }));
    }

    #[test]
    fn test_residual_row_with_placeholder() {
        let columns = schema(&["time", "ux", "uy", "p"]);
        let row = parse_residual_row("1000 1.2e-4 N/A 3.4e-5", &columns).unwrap();

        assert_eq!(row.values[0], ResidualValue::Parsed(1000.0));
        assert_eq!(row.values[1], ResidualValue::Parsed(1.2e-4));
        assert_eq!(row.values[2], ResidualValue::Unparseable);
        assert!(row.values[2].value().is_nan());
        assert_eq!(row.values[3], ResidualValue::Parsed(3.4e-5));
    }

    #[test]
    fn test_residual_row_tab_separated() {
        let columns = schema(&["time", "p", "k"]);
        let row = parse_residual_row("7\t\t0.5\t 0.25", &columns).unwrap();
        let values: Vec<f64> = row.values.iter().map(ResidualValue::value).collect();
        assert_eq!(values, vec![7.0, 0.5, 0.25]);
    }

    #[test]
    fn test_short_residual_row_is_padded() {
        let columns = schema(&["time", "ux", "uy", "p"]);
        let row = parse_residual_row("3 0.1", &columns).unwrap();

        assert_eq!(
            row.values,
            vec![
                ResidualValue::Parsed(3.0),
                ResidualValue::Parsed(0.1),
                ResidualValue::Absent,
                ResidualValue::Absent,
            ]
        );
    }

    #[test]
    fn test_long_residual_row_is_rejected() {
        let columns = schema(&["time", "p"]);
        let error = parse_residual_row("1 0.1 0.2", &columns).unwrap_err();
        assert_eq!(
            error,
            LineError::ColumnCountMismatch {
                expected: 2,
                found: 3
            }
        );
    }
}
