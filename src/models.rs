//! Core data structures for reconstructed convergence series.
//!
//! Defines probe locations, per-line samples, the record layout sniffed from
//! a probe file, residual rows with their explicit parse sentinels, and the
//! processing statistics reported by the case processor.

use crate::header::ProbeLocationRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A probe position declared in a probe file header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeLocation {
    pub index: usize,
    pub position: [f64; 3],
}

impl ProbeLocation {
    /// Position scaled by a reference length and rounded to 3 decimals, e.g. `(0.5, 0.1, 0.05)`
    pub fn label(&self, reference_length: f64) -> String {
        let [x, y, z] = self
            .position
            .map(|coordinate| (coordinate / reference_length * 1000.0).round() / 1000.0);
        format!("({}, {}, {})", x, y, z)
    }
}

/// Shape of every data record in a probe fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordLayout {
    /// One bare value per probe
    Scalar { probes: usize },
    /// One parenthesised group of `components` values per probe
    Vector { probes: usize, components: usize },
}

impl RecordLayout {
    pub fn probes(&self) -> usize {
        match self {
            RecordLayout::Scalar { probes } | RecordLayout::Vector { probes, .. } => *probes,
        }
    }

    pub fn components(&self) -> usize {
        match self {
            RecordLayout::Scalar { .. } => 1,
            RecordLayout::Vector { components, .. } => *components,
        }
    }
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordLayout::Scalar { probes } => write!(f, "scalar record with {} probes", probes),
            RecordLayout::Vector { probes, components } => write!(
                f,
                "vector record with {} probes of {} components",
                probes, components
            ),
        }
    }
}

/// One parsed probe data line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSample {
    pub time: f64,
    /// `values[probe][component]`
    pub values: Vec<Vec<f64>>,
}

impl TimeSample {
    pub fn probe_count(&self) -> usize {
        self.values.len()
    }

    pub fn component(&self, probe: usize, component: usize) -> Option<f64> {
        self.values.get(probe)?.get(component).copied()
    }
}

/// Continuous series of one probe field, possibly stitched from several restarts
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    pub name: String,
    /// `None` until a data line has been seen
    pub layout: Option<RecordLayout>,
    pub times: Vec<f64>,
    pub samples: Vec<TimeSample>,
    pub locations: ProbeLocationRegistry,
}

impl FieldSeries {
    pub fn new(name: impl Into<String>, locations: ProbeLocationRegistry) -> Self {
        Self {
            name: name.into(),
            layout: None,
            times: Vec::new(),
            samples: Vec::new(),
            locations,
        }
    }

    pub(crate) fn push_sample(&mut self, sample: TimeSample) {
        self.times.push(sample.time);
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Values of one probe component through time
    pub fn component_series(&self, probe: usize, component: usize) -> Vec<f64> {
        self.samples
            .iter()
            .map(|sample| sample.component(probe, component).unwrap_or(f64::NAN))
            .collect()
    }
}

/// A residual cell, keeping the reason a value is missing visible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResidualValue {
    Parsed(f64),
    /// Token was present but not a number (e.g. `N/A`)
    Unparseable,
    /// Row ended before this column
    Absent,
}

impl ResidualValue {
    pub fn parse(token: &str) -> Self {
        token
            .parse::<f64>()
            .map_or(ResidualValue::Unparseable, ResidualValue::Parsed)
    }

    /// Numeric value, NaN for either sentinel
    pub fn value(&self) -> f64 {
        match self {
            ResidualValue::Parsed(value) => *value,
            ResidualValue::Unparseable | ResidualValue::Absent => f64::NAN,
        }
    }
}

/// One residual data line, aligned to the owning series' columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualRow {
    pub values: Vec<ResidualValue>,
}

/// Residual log rows under one column schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidualSeries {
    pub columns: Vec<String>,
    pub rows: Vec<ResidualRow>,
}

impl ResidualSeries {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// One column through all rows, NaN where a value is missing
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.values.get(index).map_or(f64::NAN, ResidualValue::value))
                .collect(),
        )
    }

    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let index = self.column_index(name)?;
        self.rows.get(row)?.values.get(index).map(ResidualValue::value)
    }

    /// Residual columns (excluding `time`) that hold no NaN anywhere
    pub fn plottable_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| column.as_str() != "time")
            .filter(|(index, _)| {
                self.rows.iter().all(|row| {
                    row.values
                        .get(*index)
                        .is_some_and(|value| !value.value().is_nan())
                })
            })
            .map(|(_, column)| column.as_str())
            .collect()
    }
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub fields_processed: usize,
    pub fields_failed: usize,
    pub fragments_read: usize,
    pub rows_written: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
