use anyhow::Context;
use clap::Parser;
use foam_convergence::cli::Args;
use foam_convergence::models::ProcessingStats;
use foam_convergence::processor::CaseProcessor;
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(run(args)) {
        Ok(stats) if stats.fields_failed > 0 => {
            // Failed series have already been reported individually
            process::exit(2);
        }
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ProcessingStats> {
    let config = args.to_config().context("Invalid configuration")?;

    let processor = CaseProcessor::new(args.case_path.clone(), Some(args.get_output_path()))
        .with_context(|| format!("Cannot open case {}", args.case_path.display()))?
        .with_config(config);

    let stats = processor.process().await?;
    Ok(stats)
}

/// Set up structured logging; RUST_LOG takes precedence over --verbose
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("foam_convergence={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
