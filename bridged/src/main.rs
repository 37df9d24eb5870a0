//! # Bridge Host Daemon
//!
//! Runs a scripted page/frame session and prints what happened to each send.

use bridged::{BridgeRuntime, BridgeRuntimeConfig};
use clap::Parser;
use frame_bridge::DEFAULT_TIMEOUT_MS;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bridged")]
#[command(about = "Run a simulated frame bridge session", long_about = None)]
struct Cli {
    /// Script file to run instead of the built-in demo
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Response timeout in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Origin of the embedding page
    #[arg(long, default_value = "https://page.example")]
    page_origin: String,

    /// Origin of the embedded frame
    #[arg(long, default_value = "https://frame.example")]
    frame_origin: String,

    /// Start with the frame not answering
    #[arg(long)]
    no_respond: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let script = cli.script.as_ref().map(|path| {
        fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Failed to read script {}: {}", path.display(), e);
            process::exit(1);
        })
    });

    let config = BridgeRuntimeConfig {
        page_origin: cli.page_origin,
        frame_origin: cli.frame_origin,
        timeout_ms: cli.timeout_ms,
        respond: !cli.no_respond,
        script,
    };

    let mut runtime = BridgeRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    print!("{}", runtime.run());
}
