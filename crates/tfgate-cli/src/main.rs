//! tf-gate CLI - gate an infrastructure plan before it is applied
//!
//! This CLI lets pipelines and operators:
//! - Evaluate a plan document into a GO/NO-GO decision
//! - List the loaded policy rules
//! - Print the effective configuration

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tfgate::{ConfigError, GateConfig, GateError, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{config, rules, validate};
use output::OutputFormat;

/// Exit code for malformed or unreadable input documents
const EXIT_MALFORMED_INPUT: u8 = 64;
/// Exit code for invalid configuration
const EXIT_CONFIG: u8 = 78;
/// Exit code for any other failure
const EXIT_SOFTWARE: u8 = 70;

/// tf-gate CLI application
#[derive(Parser)]
#[command(name = "tf-gate")]
#[command(about = "tf-gate - risk gate for infrastructure change-sets", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TFGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text", global = true)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Evaluate a plan document and exit with the decision's exit code
    Validate(validate::ValidateArgs),

    /// List the loaded rule set
    Rules,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::from(failure_code(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let gate_config = GateConfig::load(cli.config.as_deref())?;
    init_tracing(&gate_config.logging, cli.verbose, cli.log_json);

    match cli.command {
        Commands::Validate(args) => validate::execute(args, gate_config, cli.output).await,
        Commands::Rules => rules::execute(&gate_config, cli.output),
        Commands::Config => config::execute(&gate_config, cli.output),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(logging: &LoggingConfig, verbose: bool, json: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if json || logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
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
}

fn failure_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<GateError>().is_some() {
        EXIT_MALFORMED_INPUT
    } else if err.downcast_ref::<ConfigError>().is_some() {
        EXIT_CONFIG
    } else {
        EXIT_SOFTWARE
    }
}
