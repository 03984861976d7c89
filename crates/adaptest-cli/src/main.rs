//! adaptest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Adaptive NCLEX-style practice exam engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run simulated candidates through the adaptive engine
    Simulate {
        /// Path to a .toml bank file or a directory of bank files
        #[arg(long)]
        bank: PathBuf,

        /// Exam config file (defaults to the built-in NCLEX configuration)
        #[arg(long)]
        config: Option<PathBuf>,

        /// True ability of the simulated candidates on the logit scale
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        ability: f64,

        /// Number of candidates to simulate
        #[arg(long, default_value = "1")]
        candidates: usize,

        /// Seed for the engine and response randomness; fixes the whole run
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for per-candidate reports
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report format: json, markdown, html, all
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Validate bank files and the exam configuration
    Validate {
        /// Path to a .toml bank file or a directory of bank files
        #[arg(long)]
        bank: PathBuf,

        /// Exam config file (defaults to the built-in NCLEX configuration)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a saved exam report
    Report {
        /// Path to a report JSON file
        #[arg(long)]
        input: PathBuf,

        /// Output format: markdown, html
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create a starter config and example item bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            bank,
            config,
            ability,
            candidates,
            seed,
            output,
            format,
        } => commands::simulate::execute(bank, config, ability, candidates, seed, output, format).await,
        Commands::Validate { bank, config } => commands::validate::execute(bank, config),
        Commands::Report {
            input,
            format,
            output,
        } => commands::report::execute(input, format, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
