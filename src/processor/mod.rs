//! Case processing engine.
//!
//! Discovers the restart fragments of every probe field and of the residual
//! log, reconstructs each series independently and exports it. Fields share
//! no state, so they run concurrently on blocking tasks; a field that fails
//! is reported and skipped without affecting the others.

pub mod discovery;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::discovery::FragmentDiscovery;
use self::writer::{SeriesWriter, field_labels, residual_labels};

use crate::config::ConvergenceConfig;
use crate::error::{ConvergenceError, Result};
use crate::merge::{merge_field_files, merge_residual_files};
use crate::models::ProcessingStats;

use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::task;
use tracing::{debug, error, info, warn};

/// One independently processed series
#[derive(Debug, Clone)]
enum Job {
    Field { name: String, fragments: Vec<PathBuf> },
    Residuals { fragments: Vec<PathBuf> },
}

impl Job {
    fn name(&self) -> &str {
        match self {
            Job::Field { name, .. } => name,
            Job::Residuals { .. } => "residuals",
        }
    }

    fn fragments(&self) -> &[PathBuf] {
        match self {
            Job::Field { fragments, .. } | Job::Residuals { fragments } => fragments,
        }
    }
}

#[derive(Debug)]
struct JobOutcome {
    fragments: usize,
    rows: usize,
}

/// Main processor for one OpenFOAM case
#[derive(Debug)]
pub struct CaseProcessor {
    case_path: PathBuf,
    output_path: PathBuf,
    config: ConvergenceConfig,
    discovery: FragmentDiscovery,
}

impl CaseProcessor {
    /// Create a new case processor, writing to `<case>/convergenceData` by default
    pub fn new(case_path: PathBuf, output_path: Option<PathBuf>) -> Result<Self> {
        if !case_path.is_dir() {
            return Err(ConvergenceError::CaseNotFound { path: case_path });
        }

        let output_path = output_path.unwrap_or_else(|| case_path.join("convergenceData"));

        Ok(Self {
            discovery: FragmentDiscovery::new(case_path.clone()),
            case_path,
            output_path,
            config: ConvergenceConfig::default(),
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: ConvergenceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Main processing entry point
    pub async fn process(&self) -> Result<ProcessingStats> {
        self.config.validate()?;
        let start_time = Instant::now();

        println!("{}", "Reconstructing convergence history".bright_green().bold());
        println!("  {} {}", "Case:".bright_cyan(), self.case_path.display());
        println!("  {} {}", "Output:".bright_cyan(), self.output_path.display());

        // Step 1: Discover restart fragments
        println!("\n{}", "Discovering restart fragments...".bright_yellow());
        let jobs = self.discover_jobs()?;
        let fragment_total: usize = jobs.iter().map(|job| job.fragments().len()).sum();
        println!(
            "  {} {} series in {} fragment files",
            "Found".bright_green(),
            jobs.len().to_string().bright_white().bold(),
            fragment_total.to_string().bright_white().bold()
        );

        if jobs.is_empty() {
            warn!("No probe or residual output found below {}", self.case_path.display());
            return Ok(ProcessingStats {
                output_path: self.output_path.clone(),
                processing_time_ms: start_time.elapsed().as_millis(),
                ..Default::default()
            });
        }

        // Step 2: Create output directory
        fs::create_dir_all(&self.output_path).await?;

        // Step 3: Reconstruct every series independently
        println!("\n{}", "Merging fragments...".bright_yellow());
        let writer = SeriesWriter::new(
            self.output_path.clone(),
            self.config.export_format,
            self.config.compression,
        );

        let pb = ProgressBar::new(jobs.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let concurrent_limit = self.config.max_concurrent_fields.min(jobs.len()).max(1);
        debug!("Processing {} series, {} at a time", jobs.len(), concurrent_limit);

        let results: Vec<(String, Result<JobOutcome>)> = stream::iter(jobs)
            .map(|job| {
                let writer = writer.clone();
                let config = self.config.clone();
                let pb = pb.clone();
                async move {
                    let name = job.name().to_string();
                    let origin = job.fragments().first().cloned().unwrap_or_default();
                    pb.set_message(format!("Processing: {}", name));

                    let result = match task::spawn_blocking(move || run_job(job, &writer, &config)).await {
                        Ok(result) => result,
                        Err(e) => Err(ConvergenceError::ProcessingFailed {
                            path: origin,
                            reason: format!("Processing task failed: {}", e),
                        }),
                    };
                    pb.inc(1);
                    (name, result)
                }
            })
            .buffer_unordered(concurrent_limit)
            .collect()
            .await;

        pb.finish_with_message("All series processed");

        let mut stats = ProcessingStats {
            output_path: self.output_path.clone(),
            ..Default::default()
        };
        for (name, result) in results {
            match result {
                Ok(outcome) => {
                    stats.fields_processed += 1;
                    stats.fragments_read += outcome.fragments;
                    stats.rows_written += outcome.rows;
                }
                Err(e) => {
                    error!("Skipping {}: {}", name, e);
                    stats.fields_failed += 1;
                }
            }
        }
        stats.processing_time_ms = start_time.elapsed().as_millis();

        print_summary(&stats);
        Ok(stats)
    }

    fn discover_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .discovery
            .discover_probe_fields(&self.config.probes_dir)?
            .into_iter()
            .map(|(name, fragments)| Job::Field { name, fragments })
            .collect();

        let residual_logs = self
            .discovery
            .discover_residual_logs(&self.config.residuals_dir, &self.config.residuals_file)?;
        if !residual_logs.is_empty() {
            jobs.push(Job::Residuals {
                fragments: residual_logs,
            });
        }

        Ok(jobs)
    }
}

/// Merge and export one series; runs on a blocking thread
fn run_job(job: Job, writer: &SeriesWriter, config: &ConvergenceConfig) -> Result<JobOutcome> {
    match job {
        Job::Field { name, fragments } => {
            let series = merge_field_files(&name, &fragments)?;
            let (path, rows) = writer.write_field(&series)?;
            writer.write_labels(&name, &field_labels(&series))?;

            if config.write_locations && !series.locations.is_empty() {
                writer.write_locations(&name, &series.locations, config.reference_length)?;
            }

            info!("{}: {} samples written to {}", name, rows, path.display());
            Ok(JobOutcome {
                fragments: fragments.len(),
                rows,
            })
        }
        Job::Residuals { fragments } => {
            let series = merge_residual_files(&fragments)?;

            let plottable = series.plottable_columns();
            let with_gaps: Vec<&str> = series
                .columns
                .iter()
                .map(String::as_str)
                .filter(|column| *column != "time" && !plottable.contains(column))
                .collect();
            if !with_gaps.is_empty() {
                warn!("Residual columns with missing values: {}", with_gaps.join(", "));
            }

            let (path, rows) = writer.write_residuals(&series)?;
            writer.write_labels("residuals", &residual_labels(&series))?;
            info!("residuals: {} rows written to {}", rows, path.display());
            Ok(JobOutcome {
                fragments: fragments.len(),
                rows,
            })
        }
    }
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Series processed:".bright_cyan(),
        stats.fields_processed.to_string().bright_white()
    );
    if stats.fields_failed > 0 {
        println!(
            "  {} {}",
            "Series failed:".bright_red(),
            stats.fields_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Fragments read:".bright_cyan(),
        stats.fragments_read.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Rows written:".bright_cyan(),
        stats.rows_written.to_string().bright_white().bold()
    );
}
