//! Skiff CLI - publish workers to the edge platform
//!
//! `skiff publish` uploads the worker described by `skiff.toml` together with
//! its bindings, then activates it on the account subdomain, its routes and
//! its cron schedules.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod commands;
mod config;
mod error;
mod output;
mod project;

use commands::publish::PublishArgs;
use config::CliConfig;
use error::CliResult;

/// Skiff CLI application
#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Skiff - publish workers to the edge", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SKIFF_CONFIG")]
    config: Option<String>,

    /// Registry API endpoint
    #[arg(short, long, env = "SKIFF_ENDPOINT")]
    endpoint: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Publish a worker
    #[command(alias = "deploy")]
    Publish(PublishArgs),

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    if let Err(e) = run(cli).await {
        output::print_failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    // Load config
    let config = CliConfig::load(cli.config.as_deref())?;
    let endpoint = client::resolve_endpoint(cli.endpoint.as_deref(), &config);

    // Execute command
    match cli.command {
        Commands::Publish(args) => {
            commands::publish::execute(args, &endpoint, &config, cli.output).await
        }
        Commands::Config => {
            commands::config::execute(&endpoint, cli.config.as_deref(), &config, cli.output)
        }
    }
}
