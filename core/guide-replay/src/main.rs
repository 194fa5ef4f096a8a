//! guide-replay: feeds a recorded agent stream through the session projector.
//!
//! Input is JSON Lines, one stream frame per line, read from a file or stdin.
//!
//! ## Subcommands
//!
//! - `replay`: Submit a query, apply every frame, print the final projection
//! - `classify`: Print how each streamed message is classified

mod classify;
mod input;
mod logging;
mod replay;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "guide-replay")]
#[command(about = "Travel-guide session projector replay tool")]
#[command(version)]
struct Cli {
    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a stream as the response to a query
    Replay {
        /// The destination query the stream answers
        #[arg(long)]
        query: String,

        /// JSONL stream file (defaults to stdin)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Projector config (defaults to ~/.travel-guide/projector.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Classify every streamed message without tracking a run
    Classify {
        /// JSONL stream file (defaults to stdin)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Projector config (defaults to ~/.travel-guide/projector.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let _logging_guard = logging::init(cli.log_dir.as_deref());

    let result = match cli.command {
        Commands::Replay {
            query,
            input,
            config,
            format,
        } => replay::run(&query, input.as_deref(), config, format),
        Commands::Classify { input, config } => classify::run(input.as_deref(), config),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "guide-replay failed");
        std::process::exit(1);
    }
}
