//! Restart fragment discovery for OpenFOAM cases
//!
//! Function objects write one directory per (re)start time below
//! `postProcessing/<function>`. Those directories are ordered by their name
//! read as a float so fragments can be merged chronologically.

use crate::error::{ConvergenceError, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fragment discovery for one case directory
#[derive(Debug, Clone)]
pub struct FragmentDiscovery {
    case_path: PathBuf,
}

impl FragmentDiscovery {
    pub fn new(case_path: PathBuf) -> Self {
        Self { case_path }
    }

    /// Restart directories of a function object, earliest start time first
    ///
    /// ```text
    /// case/
    ///   postProcessing/
    ///     convergenceProbes/
    ///       0/
    ///         U
    ///         p
    ///       2000/
    ///         U
    ///         p
    /// ```
    pub fn restart_directories(&self, function_dir: &str) -> Result<Vec<(f64, PathBuf)>> {
        let base = self.case_path.join("postProcessing").join(function_dir);
        if !base.is_dir() {
            debug!("No {} output at {}", function_dir, base.display());
            return Ok(Vec::new());
        }

        let mut directories = Vec::new();
        for path in glob_entries(&base)? {
            if !path.is_dir() {
                continue;
            }

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            match name.parse::<f64>() {
                Ok(start_time) => directories.push((start_time, path)),
                Err(_) => warn!("Skipping non-time directory {}", path.display()),
            }
        }

        directories.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(directories)
    }

    /// Probe fragment files grouped by field name, each list in restart order
    pub fn discover_probe_fields(&self, probes_dir: &str) -> Result<BTreeMap<String, Vec<PathBuf>>> {
        let mut fields: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for (start_time, directory) in self.restart_directories(probes_dir)? {
            for path in glob_entries(&directory)? {
                if !path.is_file() {
                    continue;
                }
                if let Some(field) = path.file_name().and_then(|n| n.to_str()) {
                    fields.entry(field.to_string()).or_default().push(path.clone());
                }
            }
            debug!("Restart {}: {} fields so far", start_time, fields.len());
        }

        Ok(fields)
    }

    /// Residual log files in restart order
    pub fn discover_residual_logs(&self, residuals_dir: &str, file_name: &str) -> Result<Vec<PathBuf>> {
        let logs = self
            .restart_directories(residuals_dir)?
            .into_iter()
            .map(|(_, directory)| directory.join(file_name))
            .filter(|path| {
                let exists = path.is_file();
                if !exists {
                    warn!("Restart directory without residual log: {}", path.display());
                }
                exists
            })
            .collect();

        Ok(logs)
    }
}

/// Entries directly inside `directory`, hidden files excluded
fn glob_entries(directory: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", Pattern::escape(&directory.to_string_lossy()));
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let entries = glob::glob_with(&pattern, options).map_err(|e| ConvergenceError::Configuration {
        message: format!("invalid discovery pattern '{}': {}", pattern, e),
    })?;

    entries
        .map(|entry| entry.map_err(|e| ConvergenceError::Io(e.into_error())))
        .collect()
}
