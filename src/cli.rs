//! Command-line interface components.

use crate::config::{CompressionAlgorithm, ConvergenceConfig, ExportFormat};
use crate::definition::read_number;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "foam-convergence")]
#[command(about = "Merge restarted OpenFOAM probe and residual output into continuous series")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Path to the OpenFOAM case directory
    #[arg(value_name = "CASE_PATH", default_value = ".")]
    pub case_path: PathBuf,

    /// Output directory for the reconstructed series (default: CASE_PATH/convergenceData)
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Probe function object directory below postProcessing
    #[arg(long, default_value = "convergenceProbes")]
    pub probes_dir: String,

    /// Residual function object directory below postProcessing
    #[arg(long, default_value = "residuals")]
    pub residuals_dir: String,

    /// Reference length used to scale probe locations
    #[arg(long, default_value_t = 1.0)]
    pub reference_length: f64,

    /// Definition file to read the reference length from (overrides --reference-length)
    #[arg(long)]
    pub definition_file: Option<PathBuf>,

    /// Entry of the definition file holding the reference length
    #[arg(long, default_value = "c")]
    pub reference_key: String,

    /// Output format (parquet, csv)
    #[arg(long, default_value = "parquet")]
    pub format: String,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Maximum number of fields processed concurrently
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Get the output path, defaulting to case_path/convergenceData if not specified
    pub fn get_output_path(&self) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self.case_path.join("convergenceData"),
        }
    }

    /// Build the processing configuration from the arguments
    pub fn to_config(&self) -> Result<ConvergenceConfig> {
        let reference_length = match &self.definition_file {
            Some(path) => {
                let length = read_number(path, &self.reference_key)?;
                info!(
                    "Reference length {} = {} from {}",
                    self.reference_key,
                    length,
                    path.display()
                );
                length
            }
            None => self.reference_length,
        };

        let mut config = ConvergenceConfig::default()
            .with_probes_dir(self.probes_dir.as_str())
            .with_residuals_dir(self.residuals_dir.as_str())
            .with_reference_length(reference_length)
            .with_export_format(self.format.parse::<ExportFormat>()?)
            .with_compression(self.compression.parse::<CompressionAlgorithm>()?);

        if let Some(max_concurrent) = self.max_concurrent {
            config = config.with_max_concurrent_fields(max_concurrent);
        }

        config.validate()?;
        Ok(config)
    }
}
