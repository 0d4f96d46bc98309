//! Integration tests for the processor module
//!
//! Tests the complete processing pipeline on small OpenFOAM-style cases
//! with restarted probe and residual output.


use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `contents` to `postProcessing/<function>/<restart>/<file>` below the case
pub fn write_fragment(case_path: &Path, function: &str, restart: &str, file: &str, contents: &str) {
    let directory = case_path.join("postProcessing").join(function).join(restart);
    fs::create_dir_all(&directory).unwrap();
    fs::write(directory.join(file), contents).unwrap();
}

/// Helper to create a case restarted once at t = 2
pub fn create_restarted_case(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
    let case_path = temp_dir.path().join("case");

    write_fragment(
        &case_path,
        "convergenceProbes",
        "0",
        "U",
        "# Probe 0 (0.5 0.1 0.05)\n# Probe 1 (1.5 0.1 0.05)\n#       Probe     0     1\n#        Time\n\
1 (0.2 0.0 0.01) (0.3 0.0 0.02)\n2 (0.21 0.0 0.01) (0.31 0.0 0.02)\n",
    );
    write_fragment(
        &case_path,
        "convergenceProbes",
        "2",
        "U",
        "# Probe 0 (0.5 0.1 0.05)\n# Probe 1 (1.5 0.1 0.05)\n\
2 (0.21 0.0 0.01) (0.31 0.0 0.02)\n3 (0.22 0.0 0.01) (0.32 0.0 0.02)\n",
    );
    write_fragment(
        &case_path,
        "convergenceProbes",
        "0",
        "p",
        "# Probe 0 (0.5 0.1 0.05)\n# Probe 1 (1.5 0.1 0.05)\n1 0.5 0.6\n2 0.4 0.5\n",
    );
    write_fragment(
        &case_path,
        "convergenceProbes",
        "2",
        "p",
        "# Probe 0 (0.5 0.1 0.05)\n# Probe 1 (1.5 0.1 0.05)\n2 0.4 0.5\n3 0.3 0.4\n",
    );

    write_fragment(
        &case_path,
        "residuals",
        "0",
        "residuals.dat",
        "# Residuals\n# Time\tUx\tUy\tp\n1\t1.0e-2\tN/A\t5.0e-2\n2\t5.0e-3\tN/A\t2.0e-2\n",
    );
    write_fragment(
        &case_path,
        "residuals",
        "2",
        "residuals.dat",
        "# Residuals\n# Time\tUx\tUy\tp\n3\t2.5e-3\t1.0e-3\t1.0e-2\n",
    );

    let output_path = temp_dir.path().join("output");
    (case_path, output_path)
}
