//! Convergence history reconstruction for OpenFOAM cases
//!
//! Reads the text output of the `probes` and `residuals` function objects,
//! which OpenFOAM writes into a fresh directory every time a run is
//! restarted, and stitches the fragments into continuous series.
//!
//! This library provides tools for:
//! - Classifying header and data lines and collecting probe locations
//! - Parsing scalar, vector and tensor probe records with a per-fragment layout
//! - Parsing residual logs against the column schema declared in their header
//! - Merging chronologically ordered restart fragments without reordering
//! - Exporting merged series to Parquet or CSV

pub mod cli;
pub mod config;
pub mod definition;
pub mod error;
pub mod fragment;
pub mod header;
pub mod labels;
pub mod merge;
pub mod models;
pub mod processor;
pub mod record;

pub use config::ConvergenceConfig;
pub use error::{ConvergenceError, LineError, Result};
pub use merge::{merge_field_files, merge_field_series, merge_residual_files, merge_residual_series};
pub use models::{
    FieldSeries, ProbeLocation, RecordLayout, ResidualRow, ResidualSeries, ResidualValue,
    TimeSample,
};
