mod commands;
mod printing;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Heritage - forward-time population genetics simulator
#[derive(Parser, Debug)]
#[command(name = "heritage")]
#[command(author, version, about = "Forward-time population genetics simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a configuration file primed with defaults
    Init {
        /// Path of the configuration file to create
        #[arg(short, long, default_value = "heritage.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a configuration file without running anything
    Validate {
        /// Configuration file to check
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run a simulation
    Run {
        /// Configuration file; missing fields take their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the number of generations
        #[arg(short, long)]
        generations: Option<u32>,

        /// Override the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show progress bar
        #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
        progress: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output, force } => commands::init::create_config(&output, force),
        Commands::Validate { config } => commands::validate::validate_config(&config),
        Commands::Run {
            config,
            seed,
            generations,
            output,
            progress,
        } => commands::run::run_simulation(config.as_deref(), seed, generations, output, progress),
    }
}
