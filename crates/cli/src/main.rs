//! Studio CLI
//!
//! Runs the persona video pipeline inline, without the HTTP server, and reports which
//! stages would hit real providers under the current configuration.

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "studio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate a short documentary-style video for a persona")]
#[command(long_about = r#"
Runs the six-stage pipeline (script, storyboard, assets, camera, composition, audio).
Stages whose provider credentials are missing fall back to offline placeholders.

Examples:
  studio run --persona 诸葛亮                 # Run with config from VIDEO_GEN_CONFIG or config/services.toml
  studio run --persona 李白 --json           # Print the terminal task as JSON
  studio capabilities --config ./services.toml
"#)]
struct Cli {
    /// Enable debug logging for the workspace crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one persona and print the finished task
    Run {
        /// Historical figure or character to build the video around
        #[arg(short, long)]
        persona: String,

        /// Services TOML file (overrides VIDEO_GEN_CONFIG)
        #[arg(short, long, env = "VIDEO_GEN_CONFIG")]
        config: Option<PathBuf>,

        /// Print the terminal task as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show the per-stage capability decision
    Capabilities {
        /// Services TOML file (overrides VIDEO_GEN_CONFIG)
        #[arg(short, long, env = "VIDEO_GEN_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    utils::logging::init_tracing_at(default_level, &["studio", "studio_cli", "utils"]);

    match cli.command {
        Commands::Run {
            persona,
            config,
            json,
        } => commands::run(&persona, config.as_deref(), json).await,
        Commands::Capabilities { config } => commands::capabilities(config.as_deref()),
    }
}
