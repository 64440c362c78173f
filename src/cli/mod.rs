//! Command-line interface for the `counsel` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Counsel chat backend
#[derive(Parser, Debug)]
#[command(name = "counsel", version, about = "Streaming business-advisory chat backend")]
pub struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve `GET /chat_stream` over HTTP
    Serve(ServeArgs),
    /// Run a single chat turn and print its frames
    Chat(ChatArgs),
}

/// Arguments for `counsel serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides COUNSEL_BIND_ADDR)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Arguments for `counsel chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Checkpoint id of an existing session
    #[arg(long)]
    pub checkpoint_id: Option<String>,

    #[arg(long, default_value = "local")]
    pub clerk_id: String,

    #[arg(long, default_value = "local")]
    pub project_id: String,

    /// Chat type profile (e.g. executive_summary, market_analysis)
    #[arg(short = 't', long, default_value = "executive_summary")]
    pub chat_type: String,

    /// Print raw SSE frames instead of rendered text
    #[arg(long)]
    pub raw: bool,

    /// User message
    pub message: String,
}
