//! Bid adapter CLI for offline request building and configuration checks.
//!
//! This tool provides commands for:
//! - Building the outbound request for an auction round from JSON fixtures
//! - Interpreting a saved server reply into bid results
//! - Validating and printing adapter configuration

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

mod auction;
mod config;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "bacli")]
#[command(about = "Bid adapter CLI for building requests and interpreting bids")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the outbound request for one auction round
    Build {
        /// JSON array of slot bid requests
        #[arg(long)]
        slots: PathBuf,

        /// JSON auction context carrying consent data
        #[arg(long)]
        auction: Option<PathBuf>,

        /// JSON page context snapshot
        #[arg(long)]
        page: PathBuf,

        /// JSON targeting overrides keyed by ad unit id
        #[arg(long)]
        targeting: Option<PathBuf>,

        /// Path to the TOML configuration file (embedded defaults when omitted)
        #[arg(long, short, env = "BID_ADAPTER_CONFIG")]
        config: Option<PathBuf>,

        /// Write the request here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Interpret a server reply against the request that produced it
    Interpret {
        /// JSON request written by `build`
        #[arg(long)]
        request: PathBuf,

        /// JSON server reply
        #[arg(long)]
        response: PathBuf,

        /// Path to the TOML configuration file (embedded defaults when omitted)
        #[arg(long, short, env = "BID_ADAPTER_CONFIG")]
        config: Option<PathBuf>,

        /// Write the bids here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config against settings validation
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Print the effective config after environment overrides
    Show {
        /// Path to the TOML configuration file (embedded defaults when omitted)
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

fn init_logger(verbose: bool) -> Result<(), CliError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .map_err(|e| CliError::Logging(e.to_string()))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Build {
            slots,
            auction: auction_context,
            page,
            targeting,
            config,
            output,
        } => auction::build(
            &auction::BuildInputs {
                slots: &slots,
                auction: auction_context.as_deref(),
                page: &page,
                targeting: targeting.as_deref(),
            },
            config.as_deref(),
            output.as_deref(),
            cli.verbose,
        ),
        Commands::Interpret {
            request,
            response,
            config,
            output,
        } => auction::interpret(
            &request,
            &response,
            config.as_deref(),
            output.as_deref(),
            cli.verbose,
        ),
        Commands::Config { action } => match action {
            ConfigAction::Validate { file } => config::validate(&file, cli.verbose),
            ConfigAction::Show { file } => config::show(file.as_deref(), cli.verbose),
        },
    }
}
