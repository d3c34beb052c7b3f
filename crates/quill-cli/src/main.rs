//! CLI entrypoint for quill.

mod build;
mod cli;
mod patch;
mod project;
mod style;

use clap::Parser;

use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{}", style::error(format!("Error: {err:#}")));
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Build {
            project,
            server,
            dry_run,
        } => build::run_build(project, server, dry_run).await,
        Command::Patch { file, key, project } => patch::run_patch(&file, &key, project),
        Command::ProgramId { project } => project::run_program_id(project),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}
