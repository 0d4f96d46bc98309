//! Export of reconstructed series
//!
//! Converts merged probe and residual series into polars DataFrames and
//! writes them as Parquet or CSV files for an external plotting tool.

use crate::config::{CompressionAlgorithm, ExportFormat};
use crate::error::{ConvergenceError, Result};
use crate::header::ProbeLocationRegistry;
use crate::labels::{component_labels, residual_label};
use crate::models::{FieldSeries, ResidualSeries, ResidualValue};

use polars::prelude::{
    Column, CsvWriter, DataFrame, ParquetWriter as PolarsParquetWriter, SerWriter,
};
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

/// Writer for reconstructed series
#[derive(Debug, Clone)]
pub struct SeriesWriter {
    output_dir: PathBuf,
    format: ExportFormat,
    compression: CompressionAlgorithm,
}

impl SeriesWriter {
    pub fn new(output_dir: PathBuf, format: ExportFormat, compression: CompressionAlgorithm) -> Self {
        Self {
            output_dir,
            format,
            compression,
        }
    }

    /// Write a merged field series, returning the file path and row count
    pub fn write_field(&self, series: &FieldSeries) -> Result<(PathBuf, usize)> {
        let mut df = field_frame(series)?;
        let path = self.write_frame(&mut df, &series.name)?;
        Ok((path, df.height()))
    }

    /// Write merged residuals, returning the file path and row count
    pub fn write_residuals(&self, series: &ResidualSeries) -> Result<(PathBuf, usize)> {
        let mut df = residual_frame(series)?;
        let path = self.write_frame(&mut df, "residuals")?;
        Ok((path, df.height()))
    }

    /// Write the probe location table of a field as CSV
    pub fn write_locations(
        &self,
        field: &str,
        locations: &ProbeLocationRegistry,
        reference_length: f64,
    ) -> Result<PathBuf> {
        let mut df = locations_frame(locations, reference_length)?;
        let path = self.output_dir.join(format!("{}_probes.csv", field));
        let file = File::create(&path)?;
        CsvWriter::new(file).include_header(true).finish(&mut df)?;
        Ok(path)
    }

    /// Write `<stem>_labels.csv` pairing each exported column with its axis label
    pub fn write_labels(&self, stem: &str, labels: &[(String, String)]) -> Result<PathBuf> {
        let mut df = labels_frame(labels)?;
        let path = self.output_dir.join(format!("{}_labels.csv", stem));
        let file = File::create(&path)?;
        CsvWriter::new(file).include_header(true).finish(&mut df)?;
        Ok(path)
    }

    fn write_frame(&self, df: &mut DataFrame, stem: &str) -> Result<PathBuf> {
        let path = self
            .output_dir
            .join(format!("{}.{}", stem, self.format.extension()));
        let file = File::create(&path)?;

        match self.format {
            ExportFormat::Parquet => {
                PolarsParquetWriter::new(file)
                    .with_compression(self.compression.to_polars_compression())
                    .finish(df)
                    .map_err(|e| ConvergenceError::ProcessingFailed {
                        path: path.clone(),
                        reason: format!("Failed to write parquet: {}", e),
                    })?;
            }
            ExportFormat::Csv => {
                CsvWriter::new(file).include_header(true).finish(df)?;
            }
        }

        debug!(
            "Wrote {} rows x {} columns to {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(path)
    }
}

/// `time` plus one column per probe component, named `<component>_probe<i>`
pub fn field_frame(series: &FieldSeries) -> Result<DataFrame> {
    let mut columns = vec![Column::new("time".into(), series.times.clone())];

    if let Some(layout) = series.layout {
        let labels = component_labels(&series.name, layout.components());
        for probe in 0..layout.probes() {
            for (component, label) in labels.iter().enumerate() {
                columns.push(Column::new(
                    probe_column(&label.name, probe).into(),
                    series.component_series(probe, component),
                ));
            }
        }
    }

    Ok(DataFrame::new(columns)?)
}

fn probe_column(component: &str, probe: usize) -> String {
    format!("{}_probe{}", component, probe)
}

/// Axis label of every probe column of a field, in export order
pub fn field_labels(series: &FieldSeries) -> Vec<(String, String)> {
    let Some(layout) = series.layout else {
        return Vec::new();
    };

    let labels = component_labels(&series.name, layout.components());
    (0..layout.probes())
        .flat_map(|probe| {
            labels
                .iter()
                .map(move |label| (probe_column(&label.name, probe), label.axis_label.clone()))
        })
        .collect()
}

/// Legend label of every residual column except `time`
pub fn residual_labels(series: &ResidualSeries) -> Vec<(String, String)> {
    series
        .columns
        .iter()
        .filter(|column| column.as_str() != "time")
        .map(|column| (column.clone(), residual_label(column)))
        .collect()
}

/// One column per residual, NaN for unparseable or absent values
pub fn residual_frame(series: &ResidualSeries) -> Result<DataFrame> {
    let columns = series
        .columns
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let values: Vec<f64> = series
                .rows
                .iter()
                .map(|row| row.values.get(index).map_or(f64::NAN, ResidualValue::value))
                .collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// `index, x, y, z, label` for every declared probe
pub fn locations_frame(locations: &ProbeLocationRegistry, reference_length: f64) -> Result<DataFrame> {
    let indices: Vec<u64> = locations.iter().map(|l| l.index as u64).collect();
    let coordinate = |axis: usize| -> Vec<f64> { locations.iter().map(|l| l.position[axis]).collect() };
    let labels: Vec<String> = locations.iter().map(|l| l.label(reference_length)).collect();

    Ok(DataFrame::new(vec![
        Column::new("index".into(), indices),
        Column::new("x".into(), coordinate(0)),
        Column::new("y".into(), coordinate(1)),
        Column::new("z".into(), coordinate(2)),
        Column::new("label".into(), labels),
    ])?)
}

/// `column, axis_label` table
pub fn labels_frame(labels: &[(String, String)]) -> Result<DataFrame> {
    let (columns, axis_labels): (Vec<&str>, Vec<&str>) = labels
        .iter()
        .map(|(column, axis_label)| (column.as_str(), axis_label.as_str()))
        .unzip();

    Ok(DataFrame::new(vec![
        Column::new("column".into(), columns),
        Column::new("axis_label".into(), axis_labels),
    ])?)
}
