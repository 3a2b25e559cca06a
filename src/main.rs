//! Weightwise: obesity-risk screening
//!
//! Reads one screening request as JSON (from the path given as the first
//! argument, or from stdin) and prints the screening report as JSON.
//!
//! ```bash
//! weightwise request.json
//! echo '{"age": 25, ...}' | weightwise
//! ```

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weightwise::adapters::sanitize::SanitizingMakeWriter;
use weightwise::adapters::ModelBundle;
use weightwise::config::{Config, LogMode};
use weightwise::{RawInput, ScreeningService};

fn read_request(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {path}")),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("Usage: weightwise [request.json]\n\nReads the request from stdin when no path is given.");
        return Ok(());
    }

    let config = Config::from_env();

    // stdout carries the report; logs go to stderr or a file.
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: the open below reports the real error.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SanitizingMakeWriter::new(writer, config.sanitize_max_bytes)),
        )
        .init();

    tracing::info!("Starting Weightwise...");

    let options = config
        .load_options()
        .context("Invalid bundle verifying key")?;
    let bundle = ModelBundle::load(Path::new(&config.bundle_dir), &options)
        .with_context(|| format!("Failed to load model bundle from {:?}", config.bundle_dir))?;
    let service = ScreeningService::from_bundle(bundle);

    let request = read_request(args.first().map(String::as_str))?;
    let input = RawInput::from_json(&request)?;
    let report = service.screen(&input)?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!("Weightwise done.");
    Ok(())
}
