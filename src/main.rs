//! adni-ingest - command-line entry point
//!
//! Uploads an ADNI study export (NIfTI volumes plus XML sidecars) into an
//! XNAT project, creating subjects, sessions and scans as needed.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use core_runtime::config::{
    IngestConfig, DEFAULT_COMMAND_TIMEOUT, DEFAULT_PROJECT, DEFAULT_REORIENT_COMMAND,
    DEFAULT_SLICER_COMMAND,
};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_sync::IngestRun;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

/// Command-line arguments for adni-ingest
#[derive(Parser, Debug)]
#[command(name = "adni-ingest")]
#[command(about = "Upload an ADNI study export into an XNAT project")]
#[command(version)]
struct Args {
    /// XNAT server URL
    xnat_url: String,

    /// XNAT user name
    xnat_user: String,

    /// XNAT password
    #[arg(env = "XNAT_PASSWORD", hide_env_values = true)]
    xnat_pwd: String,

    /// Directory containing the `ADNI` export folder
    input_path: PathBuf,

    /// Target XNAT project
    #[arg(short, long, default_value = DEFAULT_PROJECT)]
    project: String,

    /// Scratch directory for snapshot files (default: system temp dir)
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Axis reorientation tool
    #[arg(long, default_value = DEFAULT_REORIENT_COMMAND)]
    reorient_command: String,

    /// Montage rendering tool
    #[arg(long, default_value = DEFAULT_SLICER_COMMAND)]
    slicer_command: String,

    /// Time limit per external tool invocation, in seconds
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT.as_secs())]
    command_timeout: u64,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormatArg,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn logging_config(&self) -> LoggingConfig {
        let level = match self.verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
        let config = LoggingConfig::default()
            .with_format(self.log_format.into())
            .with_level(level)
            .with_spans(self.verbose > 1);

        match std::env::var("RUST_LOG") {
            Ok(filter) if !filter.trim().is_empty() => config.with_filter(filter),
            _ => config,
        }
    }

    fn ingest_config(&self) -> Result<IngestConfig> {
        let mut builder = IngestConfig::builder()
            .server_url(&self.xnat_url)
            .credentials(&self.xnat_user, &self.xnat_pwd)
            .project(&self.project)
            .input_path(&self.input_path)
            .reorient_command(&self.reorient_command)
            .slicer_command(&self.slicer_command)
            .command_timeout(Duration::from_secs(self.command_timeout))
            .accept_invalid_certs(self.insecure);

        if let Some(output) = &self.output_path {
            builder = builder.scratch_dir(output);
        }

        builder.build().context("Invalid configuration")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(args.logging_config()).context("Failed to initialize logging")?;

    let config = args.ingest_config()?;
    info!(config = ?config, "Configuration loaded");

    let service =
        core_service::bootstrap_desktop(config).context("Failed to initialize ingest service")?;
    let run = service.run().await.context("Ingest run could not start")?;

    if let Some(path) = &args.report {
        write_report(&run, path)?;
    }

    print_summary(&run);

    if run.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed = run.stats.scans_failed, "Some scans could not be ingested");
        Ok(ExitCode::FAILURE)
    }
}

fn write_report(run: &IngestRun, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(run).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!(report = %path.display(), "Run report written");
    Ok(())
}

fn print_summary(run: &IngestRun) {
    let stats = &run.stats;
    println!(
        "{} volumes: {} ingested, {} skipped, {} failed ({} snapshot failures)",
        stats.volumes_discovered,
        stats.scans_ingested,
        stats.scans_skipped,
        stats.scans_failed,
        stats.snapshots_failed
    );
    for failure in &run.failures {
        println!(
            "  {} [{}]: {}",
            failure.scan.as_deref().unwrap_or(&failure.volume),
            failure.category,
            failure.message
        );
    }
}
