//! `quill build`: send the project to the compile service and propagate the
//! program id it returns.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use quill_session::{
    ExtensionSet, HeadlessHost, HttpBuildTransport, PatchOutcome, PropagationReport, Workbench,
};
use tracing::warn;

use crate::project::{identity_file, Project};
use crate::style;

pub async fn run_build(
    project: Option<PathBuf>,
    server: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let project = Project::open(project)?;
    let mut config = project.config.clone();
    if let Some(server) = server {
        config.build.server_url = server.trim_end_matches('/').to_string();
    }
    let identities = Arc::new(project.load_identities()?);
    let transport = HttpBuildTransport::new(&config.build.server_url, config.build.timeout());
    let mut bench = Workbench::from_config(
        &config,
        Arc::clone(&project.store),
        HeadlessHost::new(),
        transport,
        Arc::clone(&identities),
        ExtensionSet::new(),
    );

    let identity_path = bench.identity_path().to_string();
    if project.store.contains(&identity_path) {
        project.store.open_tab(&identity_path)?;
    } else {
        warn!("{identity_path} is not part of the project; program id will not be written");
    }
    bench.session_mut().initialize();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Building on {}...", config.build.server_url));
    let result = bench.build().await;
    spinner.finish_and_clear();
    let report = result.with_context(|| format!("build on {} failed", config.build.server_url))?;
    bench.session_mut().flush()?;

    if !report.outcome.stderr.trim().is_empty() {
        eprintln!("{}", report.outcome.stderr.trim_end());
    }
    println!("Build {}", report.outcome.uuid);
    println!("Program id {}", style::accent(&report.program_id));
    describe(&identity_path, &report.propagation);

    if dry_run {
        println!("Dry run: no files written");
        return Ok(());
    }
    for path in project.write_back()? {
        println!("{}", style::success(format!("Wrote {path}")));
    }
    let identity_path = identity_file(&project.root, &config);
    if identities.save(&identity_path)? {
        println!("Identity saved to {}", identity_path.display());
    }
    Ok(())
}

fn describe(path: &str, propagation: &PropagationReport) {
    match &propagation.store {
        PatchOutcome::Applied { .. } => println!("Updated program id in {path}"),
        PatchOutcome::Unchanged => println!("{path} already declares this program id"),
        PatchOutcome::Skipped(reason) => {
            eprintln!("{}", style::warning(format!("Warning: {path}: {reason}")));
        }
        PatchOutcome::Missing | PatchOutcome::NotOpen | PatchOutcome::Rejected(_) => {}
    }
}
