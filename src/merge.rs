//! Stitching of restart fragments into continuous series.
//!
//! Fragments arrive already in chronological order. Merging appends them as
//! they are: times are neither sorted nor deduplicated, so samples on a
//! shared restart boundary appear once per fragment that recorded them.

use crate::error::{ConvergenceError, LineError, Result};
use crate::fragment::{read_probe_fragment, read_residual_fragment, realign};
use crate::models::{FieldSeries, ResidualSeries};
use std::path::Path;
use tracing::{debug, info};

impl FieldSeries {
    /// Append a later fragment of the same field
    pub fn append(&mut self, fragment: FieldSeries) -> std::result::Result<(), LineError> {
        match (self.layout, fragment.layout) {
            (Some(established), Some(layout)) if established != layout => {
                return Err(LineError::SchemaViolation {
                    reason: format!(
                        "fragment has {}, earlier fragments have {}",
                        layout, established
                    ),
                });
            }
            (None, Some(layout)) => self.layout = Some(layout),
            _ => {}
        }

        self.locations.merge_from(&fragment.locations);
        self.times.extend(fragment.times);
        self.samples.extend(fragment.samples);
        Ok(())
    }
}

impl ResidualSeries {
    /// Append a later fragment of the residual log.
    ///
    /// The columns of the first non-empty fragment are the series schema; a
    /// later fragment may omit some of them but must not add new ones.
    pub fn append(&mut self, fragment: ResidualSeries) -> std::result::Result<(), LineError> {
        if fragment.columns.is_empty() && fragment.rows.is_empty() {
            return Ok(());
        }
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = fragment;
            return Ok(());
        }

        let positions = fragment
            .columns
            .iter()
            .map(|column| {
                self.column_index(column)
                    .ok_or_else(|| LineError::SchemaViolation {
                        reason: format!(
                            "column '{}' is absent from the first fragment's schema {:?}",
                            column, self.columns
                        ),
                    })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let width = self.columns.len();
        self.rows.extend(
            fragment
                .rows
                .into_iter()
                .map(|row| realign(row, &positions, width)),
        );
        Ok(())
    }
}

/// Concatenate probe field fragments in the given order
pub fn merge_field_series(fragments: impl IntoIterator<Item = FieldSeries>) -> Result<FieldSeries> {
    let mut fragments = fragments.into_iter();
    let mut merged = fragments.next().ok_or_else(|| ConvergenceError::NoFragments {
        name: "probe field".to_string(),
    })?;

    for (index, fragment) in fragments.enumerate() {
        merged.append(fragment).map_err(|e| {
            ConvergenceError::schema_violation(&merged.name, format!("fragment {}", index + 2), e)
        })?;
    }

    Ok(merged)
}

/// Concatenate residual log fragments in the given order
pub fn merge_residual_series(
    fragments: impl IntoIterator<Item = ResidualSeries>,
) -> Result<ResidualSeries> {
    let mut fragments = fragments.into_iter();
    let mut merged = fragments.next().ok_or_else(|| ConvergenceError::NoFragments {
        name: "residuals".to_string(),
    })?;

    for (index, fragment) in fragments.enumerate() {
        merged.append(fragment).map_err(|e| {
            ConvergenceError::schema_violation("residuals", format!("fragment {}", index + 2), e)
        })?;
    }

    Ok(merged)
}

/// Read and merge the chronologically ordered fragment files of one field.
///
/// Each file is fully read and closed before the next one is opened.
pub fn merge_field_files<P: AsRef<Path>>(field: &str, paths: &[P]) -> Result<FieldSeries> {
    if paths.is_empty() {
        return Err(ConvergenceError::NoFragments {
            name: field.to_string(),
        });
    }

    let mut merged: Option<FieldSeries> = None;
    for path in paths {
        let fragment = read_probe_fragment(path.as_ref(), field)?;
        debug!(
            "{}: {} samples from {}",
            field,
            fragment.len(),
            path.as_ref().display()
        );
        match merged.as_mut() {
            Some(series) => series.append(fragment).map_err(|e| {
                ConvergenceError::schema_violation(field, path.as_ref().display().to_string(), e)
            })?,
            None => merged = Some(fragment),
        }
    }

    let merged = merged.ok_or_else(|| ConvergenceError::NoFragments {
        name: field.to_string(),
    })?;
    info!(
        "{}: merged {} samples from {} fragments",
        field,
        merged.len(),
        paths.len()
    );
    Ok(merged)
}

/// Read and merge the chronologically ordered residual log files
pub fn merge_residual_files<P: AsRef<Path>>(paths: &[P]) -> Result<ResidualSeries> {
    if paths.is_empty() {
        return Err(ConvergenceError::NoFragments {
            name: "residuals".to_string(),
        });
    }

    let mut merged = ResidualSeries::default();
    for path in paths {
        let fragment = read_residual_fragment(path.as_ref())?;
        debug!(
            "residuals: {} rows from {}",
            fragment.len(),
            path.as_ref().display()
        );
        merged.append(fragment).map_err(|e| {
            ConvergenceError::schema_violation("residuals", path.as_ref().display().to_string(), e)
        })?;
    }

    info!(
        "residuals: merged {} rows from {} fragments",
        merged.len(),
        paths.len()
    );
    Ok(merged)
}
