//! Error handling for convergence data processing.
//!
//! Line-level grammar failures are described by [`LineError`]; they are
//! wrapped with the file and line they occurred on by the fragment reader so
//! every diagnostic names where the input stopped matching the grammar.

use std::path::PathBuf;
use thiserror::Error;

/// Violations of the probe/residual text grammar on a single line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineError {
    #[error("malformed probe location header: {reason}")]
    MalformedHeader { reason: String },

    #[error("invalid time value '{token}'")]
    InvalidTime { token: String },

    #[error("invalid numeric value '{token}'")]
    InvalidValue { token: String },

    #[error("schema violation: {reason}")]
    SchemaViolation { reason: String },

    #[error("data line encountered before any schema header")]
    NoSchema,

    #[error("row has {found} columns but the schema declares {expected}")]
    ColumnCountMismatch { expected: usize, found: usize },
}

#[derive(Error, Debug)]
pub enum ConvergenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Case directory not found at path: {path}")]
    CaseNotFound { path: PathBuf },

    #[error("No fragments to merge for {name}")]
    NoFragments { name: String },

    #[error("Parse error in {path} at line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: LineError,
    },

    #[error("Cannot merge {name} at {fragment}: {source}")]
    SchemaViolation {
        name: String,
        /// Fragment file path, or its position when merging in memory
        fragment: String,
        #[source]
        source: LineError,
    },

    #[error("Invalid definition file: {path} - {reason}")]
    DefinitionFile { path: PathBuf, reason: String },

    #[error("Processing failed for: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ConvergenceError {
    /// Attach file and line context to a line-level error
    pub fn parse(path: impl Into<PathBuf>, line: usize, source: LineError) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            source,
        }
    }

    /// Attach the series name and offending fragment to a merge-level error
    pub fn schema_violation(name: &str, fragment: impl Into<String>, source: LineError) -> Self {
        Self::SchemaViolation {
            name: name.to_string(),
            fragment: fragment.into(),
            source,
        }
    }

    /// The line-level cause, if this error came from the grammar or a merge
    pub fn line_error(&self) -> Option<&LineError> {
        match self {
            Self::Parse { source, .. } | Self::SchemaViolation { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvergenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_file_and_line() {
        let error = ConvergenceError::parse(
            "postProcessing/residuals/0/residuals.dat",
            7,
            LineError::NoSchema,
        );
        let message = error.to_string();

        assert!(message.contains("residuals.dat"));
        assert!(message.contains("line 7"));
        assert!(message.contains("before any schema header"));
        assert_eq!(error.line_error(), Some(&LineError::NoSchema));
    }

    #[test]
    fn test_schema_violation_names_fragment() {
        let error = ConvergenceError::schema_violation(
            "U",
            "postProcessing/convergenceProbes/5/U",
            LineError::SchemaViolation {
                reason: "records have 2 probes, earlier fragments have 1".to_string(),
            },
        );
        let message = error.to_string();

        assert!(message.contains("Cannot merge U"));
        assert!(message.contains("convergenceProbes/5/U"));
        assert!(message.contains("earlier fragments have 1"));
        assert!(matches!(
            error.line_error(),
            Some(LineError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_column_count_message() {
        let error = LineError::ColumnCountMismatch {
            expected: 4,
            found: 5,
        };
        assert_eq!(
            error.to_string(),
            "row has 5 columns but the schema declares 4"
        );
    }
}
