//! Bulk crawler verification CLI.
//!
//! Reads a CSV whose first two columns are the claimed user agent and
//! the source address, classifies every row, and writes the rows back
//! out with the classification appended.

use anyhow::{Context, Result};
use botvet::{BotVerifier, DnsResolver, Registry, VerifierConfig};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "botvet")]
#[command(author, version, about = "Verifies claimed crawler identities against their network origin")]
struct Args {
    /// Input CSV; the first two columns must be user agent and address
    input: PathBuf,

    /// Output CSV; input rows with bot_status and bot_name appended
    output: PathBuf,

    /// Path to configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a bot definition document, overriding the bundled one
    #[arg(long)]
    bots: Option<PathBuf>,

    /// Path to a hostile pattern document, overriding the bundled one
    #[arg(long)]
    hostile: Option<PathBuf>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(json: bool, level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, &args.log_level);

    let mut config = if let Some(config_path) = &args.config {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        if config_path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        }
    } else {
        VerifierConfig::default()
    };

    if args.bots.is_some() {
        config.registry.bots_path = args.bots;
    }
    if args.hostile.is_some() {
        config.registry.hostile_path = args.hostile;
    }

    let registry = Registry::load(&config.registry)?;
    info!(definitions = registry.len(), "bot registry loaded");

    let verifier = BotVerifier::new(
        Arc::new(registry),
        Arc::new(DnsResolver::new(&config.resolver)),
    );

    botvet::bulk::bulk_verify(&verifier, &args.input, &args.output).await?;
    info!(output = %args.output.display(), "bulk verification complete");

    Ok(())
}
