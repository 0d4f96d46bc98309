//! Configuration management and validation.
//!
//! Provides the processing configuration for a case: where the restart
//! fragments live below `postProcessing`, how probe locations are scaled
//! and how reconstructed series are exported.

use crate::error::{ConvergenceError, Result};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Output file format for reconstructed series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Parquet,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Parquet => "parquet",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ConvergenceError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "parquet" => Ok(ExportFormat::Parquet),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ConvergenceError::Configuration {
                message: format!("unknown export format '{}' (expected parquet or csv)", other),
            }),
        }
    }
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = ConvergenceError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(ConvergenceError::Configuration {
                message: format!(
                    "unknown compression '{}' (expected snappy, zstd, lz4 or none)",
                    other
                ),
            }),
        }
    }
}

/// Global configuration for convergence processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Probe function output directory below `postProcessing`
    pub probes_dir: String,

    /// Residual function output directory below `postProcessing`
    pub residuals_dir: String,

    /// Residual log file name inside each restart directory
    pub residuals_file: String,

    /// Length used to non-dimensionalise probe locations
    pub reference_length: f64,

    /// Output file format
    pub export_format: ExportFormat,

    /// Parquet compression
    pub compression: CompressionAlgorithm,

    /// Maximum fields processed at the same time
    pub max_concurrent_fields: usize,

    /// Write a `<field>_probes.csv` location table next to each field
    pub write_locations: bool,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            probes_dir: "convergenceProbes".to_string(),
            residuals_dir: "residuals".to_string(),
            residuals_file: "residuals.dat".to_string(),
            reference_length: 1.0,
            export_format: ExportFormat::Parquet,
            compression: CompressionAlgorithm::Snappy,
            max_concurrent_fields: num_cpus::get().max(1),
            write_locations: true,
        }
    }
}

impl ConvergenceConfig {
    /// Set the probe output directory name
    pub fn with_probes_dir(mut self, probes_dir: impl Into<String>) -> Self {
        self.probes_dir = probes_dir.into();
        self
    }

    /// Set the residual output directory name
    pub fn with_residuals_dir(mut self, residuals_dir: impl Into<String>) -> Self {
        self.residuals_dir = residuals_dir.into();
        self
    }

    /// Set the reference length for probe labels
    pub fn with_reference_length(mut self, reference_length: f64) -> Self {
        self.reference_length = reference_length;
        self
    }

    /// Set the export format
    pub fn with_export_format(mut self, export_format: ExportFormat) -> Self {
        self.export_format = export_format;
        self
    }

    /// Set parquet compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Set maximum concurrent fields
    pub fn with_max_concurrent_fields(mut self, max_fields: usize) -> Self {
        self.max_concurrent_fields = max_fields;
        self
    }

    /// Skip writing probe location tables
    pub fn without_locations(mut self) -> Self {
        self.write_locations = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.reference_length.is_finite() || self.reference_length <= 0.0 {
            return Err(ConvergenceError::Configuration {
                message: format!(
                    "reference length must be a positive number, got {}",
                    self.reference_length
                ),
            });
        }

        if self.max_concurrent_fields == 0 {
            return Err(ConvergenceError::Configuration {
                message: "at least one field must be processed at a time".to_string(),
            });
        }

        if self.probes_dir.is_empty() || self.residuals_dir.is_empty() {
            return Err(ConvergenceError::Configuration {
                message: "probe and residual directory names must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
