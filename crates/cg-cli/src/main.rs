//! CLI frontend for the campaign guide engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cg",
    about = "Campaign guide runner for data-defined card game campaigns",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a guide file and report diagnostics
    Check {
        /// Guide JSON file
        guide: PathBuf,
    },

    /// Play a campaign interactively
    Play {
        /// Guide JSON file
        guide: PathBuf,

        /// Session file: resumed if it exists, rewritten after every choice
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Difficulty: easy, standard, hard, expert
        #[arg(short, long, default_value = "standard")]
        difficulty: String,

        /// Investigator as CODE or CODE:Name (repeatable)
        #[arg(short, long = "investigator")]
        investigators: Vec<String>,

        /// RNG seed for random draws
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Rebuild a saved session by replay and show where it stands
    Replay {
        /// Guide JSON file
        guide: PathBuf,

        /// Saved session file
        save: PathBuf,
    },

    /// Print the choices recorded in a saved session
    Log {
        /// Saved session file
        save: PathBuf,

        /// Output format: text, markdown
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { guide } => commands::check::run(&guide),
        Commands::Play {
            guide,
            save,
            difficulty,
            investigators,
            seed,
        } => commands::play::run(&guide, save.as_deref(), &difficulty, &investigators, seed),
        Commands::Replay { guide, save } => commands::replay::run(&guide, &save),
        Commands::Log { save, format } => commands::log::run(&save, &format),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
