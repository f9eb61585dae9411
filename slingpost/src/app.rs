use std::path::PathBuf;

use anyhow::{Context, bail};
use sling_core::{ContentClient, ImportOptions, SlingClient};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::import::{ImportReport, ImportRunner, sources_for};
use crate::sync::{StdFs, SyncReport, SyncRoot, Synchronizer};

/// Runs the parsed command against the configured servlet.
pub async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    cli.apply(&mut config);
    let client = SlingClient::new(&config.endpoint)
        .with_context(|| format!("invalid endpoint {}", config.endpoint.base_url()))?
        .with_request_limit(config.max_requests);

    match cli.command {
        Command::Post { directories, dest } => {
            config.log_options(false);
            let report = post(client, directories, &dest).await?;
            log::info!(
                "Pushed {} files, {} folders and {} nodes",
                report.counters.files,
                report.counters.folders,
                report.counters.nodes
            );
            if !report.warnings.is_empty() {
                log::warn!("{} writes were rejected", report.warnings.len());
            }
            if !report.is_success() {
                bail!(
                    "{} of {} directories failed",
                    report.failures().count(),
                    report.outcomes.len()
                );
            }
        }
        Command::Import { files, dest, .. } => {
            config.log_options(true);
            let report = import(client, &files, &dest, config.import).await?;
            if !report.warnings.is_empty() {
                log::warn!("{} imports were rejected", report.warnings.len());
            }
            if !report.is_success() {
                bail!(
                    "{} of {} imports failed",
                    report.failures().count(),
                    report.outcomes.len()
                );
            }
        }
    }
    Ok(())
}

/// Pushes each directory to `dest` with the local filesystem.
pub async fn post<C: ContentClient>(
    client: C,
    directories: Vec<PathBuf>,
    dest: &str,
) -> anyhow::Result<SyncReport> {
    let roots: Vec<SyncRoot> = directories
        .into_iter()
        .map(|dir| SyncRoot::new(dir, dest))
        .collect();
    let sync = Synchronizer::new(client, StdFs);
    Ok(sync.sync_roots(&roots).await?)
}

pub async fn import<C: ContentClient>(
    client: C,
    files: &[PathBuf],
    dest: &str,
    options: ImportOptions,
) -> anyhow::Result<ImportReport> {
    let runner = ImportRunner::new(client, options);
    Ok(runner.run(&sources_for(files, dest)).await?)
}
