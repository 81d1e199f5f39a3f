//! CLI entry point for brook.

use clap::{Parser, Subcommand};

use crate::types::ReasoningEffort;

/// Brook streaming orchestrator CLI
#[derive(Parser, Debug)]
#[command(name = "brook", version, about = "Run streamed, tool-calling chat turns")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one turn and print its progress events as SSE frames
    Chat(ChatArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model to use (defaults to BROOK_MODEL or gpt-5)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Reasoning effort (minimal, low, medium, high)
    #[arg(short, long)]
    pub effort: Option<ReasoningEffort>,

    /// Reject incompatible effort/tool combinations instead of raising the effort
    #[arg(long)]
    pub strict: bool,

    /// Enable the built-in image generation tool
    #[arg(long)]
    pub image: bool,

    /// System instructions
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// User prompt
    pub prompt: String,
}
