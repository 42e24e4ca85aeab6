//! faceclear CLI - face detection, blur scoring, and region restoration.
//!
//! faceclear takes a photograph as input, locates faces, scores each face
//! region for optical sharpness, optionally restores blurred regions, and
//! emits a JSON summary plus an annotated image.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a photo and write the annotated result
//! faceclear analyze photo.jpg --output annotated.png
//!
//! # Analysis only, custom threshold, no restoration
//! faceclear analyze photo.jpg --threshold 140 --no-correction
//!
//! # View configuration
//! faceclear config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// faceclear - face-region blur analysis and restoration.
#[derive(Parser, Debug)]
#[command(name = "faceclear")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a photo: detect faces, score blur, restore and annotate
    Analyze(cli::analyze::AnalyzeArgs),

    /// View configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match faceclear_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `faceclear config path`."
            );
            faceclear_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("faceclear v{}", faceclear_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config),
    }
}
