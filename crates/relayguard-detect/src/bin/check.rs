//! Relayguard message checker
//!
//! Classify a single message with the configured detectors and print the
//! verdict as JSON.
//!
//! Usage:
//!   relayguard-check message.json
//!   relayguard-check --config relayguard.toml message.json
//!   echo '{"text": "free crypto"}' | relayguard-check --context '{"enable_ai": false}'
//!
//! Environment:
//!   LOG_FORMAT  - "json" or "text" (default: "text")
//!   RUST_LOG    - standard env filter (default: "relayguard=info")

use std::env;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use relayguard_core::{DetectionContext, Message};
use relayguard_detect::DetectionConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    context: Option<String>,
    input: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = env::args().collect();
    let mut result = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--config requires a path");
                };
                result.config = Some(PathBuf::from(path));
            }
            "--context" => {
                i += 1;
                let Some(ctx) = args.get(i) else {
                    bail!("--context requires a JSON object");
                };
                result.context = Some(ctx.clone());
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("Unknown argument: {}", other),
            other => result.input = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    Ok(result)
}

fn print_help() {
    println!(
        r#"relayguard-check - classify one message

USAGE:
    relayguard-check [OPTIONS] [MESSAGE_JSON]

OPTIONS:
    -c, --config <PATH>    TOML config with a [detection] table (default: environment)
        --context <JSON>   Detection context, e.g. '{{"enable_ai": false}}'
    -h, --help             Print help

Reads the message from MESSAGE_JSON, or stdin when omitted."#
    );
}

fn init_logging() {
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "relayguard=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_message(input: Option<&PathBuf>) -> Result<Message> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read message from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Message is not valid JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => DetectionConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DetectionConfig::from_env(),
    };
    let pipeline = config.build_pipeline(None)?;

    let context: Option<DetectionContext> = args
        .context
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("--context is not a valid detection context")?;

    let message = read_message(args.input.as_ref())?;

    info!(
        subsystem = "detect",
        component = "check",
        detectors = ?pipeline.enabled_detectors(context.as_ref()),
        "Checking message"
    );

    let verdict = pipeline.check(&message, context.as_ref()).await;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(())
}
