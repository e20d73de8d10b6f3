//! quizforge CLI: practice question sessions in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod loader;
mod render;

#[derive(Parser)]
#[command(name = "quizforge", version, about = "Practice question sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive practice session
    Run {
        /// Question set file (.toml or .json), or a set id found in question_dir
        #[arg(long)]
        question_set: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the session summary as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Seed for the matching-option shuffle
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Validate question set files
    Validate {
        /// Path to question set file or directory
        #[arg(long)]
        question_set: PathBuf,
    },

    /// Create starter config and a sample question set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            question_set,
            config,
            report,
            seed,
        } => commands::run::execute(question_set, config, report, seed).await,
        Commands::Validate { question_set } => commands::validate::execute(question_set).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
