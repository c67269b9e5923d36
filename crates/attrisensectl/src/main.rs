//! AttriSense Control - command-line front end for attrition risk assessment
//!
//! Reads one employee record, scores it against the trained pipeline and
//! prints the risk gauge with retention advice.

mod commands;
mod output;

use attrisense_common::config::ColorMode;
use attrisense_common::AttriSenseConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// Version is embedded at build time
const VERSION: &str = env!("ATTRISENSE_VERSION");

#[derive(Parser)]
#[command(name = "attrisensectl")]
#[command(about = "AttriSense - employee attrition risk assessment", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Configuration file (default: ~/.config/attrisense/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Color output: auto, basic, none
    #[arg(long, global = true)]
    color: Option<ColorMode>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess attrition risk for one employee
    Predict {
        /// Employee record (.toml or .json)
        #[arg(long, short)]
        input: PathBuf,

        /// Override the model artifact path
        #[arg(long)]
        model: Option<PathBuf>,

        /// Emit the assessment as JSON
        #[arg(long)]
        json: bool,

        /// Skip the AI provider and show the general advice
        #[arg(long)]
        no_ai: bool,
    },

    /// Print a pre-filled employee record to start from
    Template,

    /// Print the feature contract
    Schema,

    /// Load the model artifact and validate it against the feature contract
    CheckModel {
        /// Override the model artifact path
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn dispatch(command: Commands, config: AttriSenseConfig) -> commands::CommandResult {
    match command {
        Commands::Predict {
            input,
            model,
            json,
            no_ai,
        } => commands::predict(
            config,
            commands::PredictArgs {
                input,
                model,
                json,
                no_ai,
            },
        ),
        Commands::Template => commands::template(),
        Commands::Schema => commands::schema(&config),
        Commands::CheckModel { model } => commands::check_model(&config, model),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        // Reads no configuration
        Commands::Template => commands::template(),
        command => commands::load_config(cli.config.as_deref(), cli.color)
            .and_then(|config| dispatch(command, config)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => failure.report(),
    }
}
