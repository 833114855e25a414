//! `verity` command line
//!
//! Verifies a worker output document against the local tree and prints the
//! report as JSON. Exit status is 0 for a `verified` report and 1 otherwise.

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use verity_core::{
    config, PatternDetector, UncertaintyHandler, VerificationConfig, VerificationOrchestrator,
    VerificationReport, WorkerOutput, DEFAULT_CONFIG_PATH,
};

#[derive(Debug, Parser)]
#[command(name = "verity")]
#[command(about = "Ground-truth verification of worker output", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Verify a worker output document and print the report
    Verify {
        /// Worker that produced the output
        #[arg(short, long)]
        worker: String,

        /// Worker output document (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Peer verification report (JSON); repeatable
        #[arg(short, long = "peer")]
        peers: Vec<PathBuf>,

        /// Configuration file (JSON, YAML or TOML)
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Also print a confirmation request when one is needed
        #[arg(long)]
        confirm: bool,
    },

    /// Scan free text for hedging language; `-` reads stdin
    Scan {
        /// Text to scan
        text: String,
    },

    /// Prefix a statement with its trust marker
    Express {
        /// Confidence in [0, 1]
        #[arg(short, long)]
        confidence: f64,

        /// Statement to express
        statement: String,

        /// Refuse or hedge instead of labelling
        #[arg(long)]
        safe: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    match cli.command {
        Commands::Verify {
            worker,
            output,
            peers,
            config,
            confirm,
        } => verify(&worker, &output, &peers, &config, confirm).await,
        Commands::Scan { text } => {
            let text = read_text(&text)?;
            let warnings = PatternDetector::new().scan(&text);
            tracing::debug!(chars = text.chars().count(), warnings = warnings.len(), "scanned text");
            println!("{}", serde_json::to_string_pretty(&warnings)?);
            Ok(if warnings.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Express {
            confidence,
            statement,
            safe,
        } => {
            let handler = UncertaintyHandler::new();
            if safe {
                println!("{}", handler.safe_response(&statement, confidence));
            } else {
                println!("{}", handler.express(&statement, confidence));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn verify(
    worker: &str,
    output_path: &Path,
    peers: &[PathBuf],
    config_path: &Path,
    confirm: bool,
) -> Result<ExitCode> {
    let settings = VerificationConfig::load_or_default(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let settings = config::install(settings).context("installing config")?;

    let output = load_output(output_path)?;
    let peers = peers
        .iter()
        .map(|path| load_report(path))
        .collect::<Result<Vec<_>>>()?;

    let orchestrator = VerificationOrchestrator::new(settings);
    let report = orchestrator.verify_with_peers(worker, &output, &peers).await;
    tracing::info!(
        worker,
        output = %output_path.display(),
        peers = peers.len(),
        status = %report.status,
        "verification finished"
    );
    println!("{}", report.to_json_pretty()?);

    if confirm {
        if let Some(request) = orchestrator.confirmation_for(&report) {
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
    }

    Ok(if report.is_verified() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_output(path: &Path) -> Result<WorkerOutput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading output {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing output {}", path.display()))
}

fn load_report(path: &Path) -> Result<VerificationReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading peer report {}", path.display()))?;
    VerificationReport::from_json(&text)
        .with_context(|| format!("parsing peer report {}", path.display()))
}

fn read_text(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("reading stdin")?;
    Ok(text)
}
