//! Deepfake detector command-line interface.

mod logging;
mod render;
mod runner;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dfd_media::{AnalyzerConfig, DeepfakeAnalyzer};
use dfd_models::AnalysisReport;

use crate::runner::Request;

#[derive(Parser)]
#[command(name = "dfd")]
#[command(version, about = "Classify images and videos as real or deepfake")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// ONNX model to load (overrides DFD_MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single image
    Image {
        path: PathBuf,
    },
    /// Sample and classify a video
    Video {
        path: PathBuf,

        /// Classify every Nth frame (overrides DFD_FRAME_INTERVAL)
        #[arg(long, short = 'n')]
        interval: Option<u32>,
    },
    /// Classify a file, choosing image or video from its extension
    Analyze {
        path: PathBuf,
    },
    /// Print the JSON schema of the report
    Schema,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Human-readable logs by default, JSON when `LOG_FORMAT=json`. Always stderr.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dfd=info,dfd_media=info,dfd_cli=info,ort=warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let request = match cli.command {
        Commands::Schema => return print_schema(),
        Commands::Image { path } => Request::Image(path),
        Commands::Video { path, interval } => Request::Video { path, interval },
        Commands::Analyze { path } => Request::Auto(path),
    };

    let mut config = AnalyzerConfig::from_env().context("Invalid configuration")?;
    if let Some(model) = cli.model {
        config.model_path = model;
    }

    info!(model = %config.model_path.display(), layout = ?config.layout, "Loading classifier");
    let analyzer = DeepfakeAnalyzer::from_config(&config)
        .with_context(|| format!("Failed to load model {}", config.model_path.display()))?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, finishing current frame");
            let _ = cancel_tx.send(true);
        }
    });

    let result = runner::run(Arc::new(analyzer), request, cancel_rx).await;
    signal_handle.abort();

    print_report(&result?, cli.json)
}

fn print_report(report: &AnalysisReport, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print!("{}", render::render_report(report));
    }
    Ok(())
}

fn print_schema() -> Result<()> {
    let schema = schemars::schema_for!(AnalysisReport);
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    println!("{}", json);
    Ok(())
}
