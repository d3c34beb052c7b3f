//! CLI definitions for quill.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "quill",
    version,
    about = "Build playground programs against a remote compile service",
    infer_subcommands = true,
    after_help = "Examples:\n  quill build --project ./counter\n  quill build --server http://localhost:8080\n  quill patch src/lib.rs 9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin\n  quill program-id"
)]
pub struct Cli {
    /// Show debug logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the project and rewrite its program id declaration.
    Build {
        /// Project directory (defaults to the current directory).
        #[arg(long)]
        project: Option<PathBuf>,
        /// Compile service URL (overrides `[build] server_url`).
        #[arg(long)]
        server: Option<String>,
        /// Report what would change without writing files.
        #[arg(long)]
        dry_run: bool,
    },
    /// Rewrite the program id literal in one file.
    Patch {
        /// Source file containing the declaration.
        file: PathBuf,
        /// New base58 public key.
        key: String,
        /// Project directory used to read marker settings.
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Print the program id the project builds with.
    ProgramId {
        /// Project directory (defaults to the current directory).
        #[arg(long)]
        project: Option<PathBuf>,
    },
}
