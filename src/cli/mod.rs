//! CLI entry point for finchat.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// finchat CLI
#[derive(Parser, Debug)]
#[command(name = "finchat", version, about = "Stream answers from the financial assistant")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a message and stream the reply
    Chat(ChatArgs),
    /// Run a captured response body through the stream core
    Replay(ReplayArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Continue an existing thread
    #[arg(long)]
    pub thread_id: Option<String>,

    /// Ask for whole messages instead of token deltas
    #[arg(long)]
    pub no_stream_tokens: bool,

    /// Print tool results as JSON
    #[arg(long)]
    pub json: bool,

    /// The message to send
    pub message: String,
}

/// Arguments for the `replay` subcommand.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// File containing a raw response body
    pub file: PathBuf,

    /// Split the file into reads of this many bytes
    #[arg(long, default_value_t = 64)]
    pub chunk_size: usize,

    /// Print tool results as JSON
    #[arg(long)]
    pub json: bool,
}
