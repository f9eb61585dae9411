use std::io;
use std::path::{Path, PathBuf};

use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, join_all};
use sling_core::{ClientError, ContentClient};
use thiserror::Error;

use super::descriptor::DescriptorError;
use super::level::{Level, LevelTask};
use super::local_fs::{EntryKind, LocalFs};
use super::paths::concat_resource;
use crate::report::{Activity, Counters, RemoteWarning, Reporter};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("the directory {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("the path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
    #[error("request to {path} failed: {source}")]
    Client {
        path: String,
        #[source]
        source: ClientError,
    },
    #[error("directory cycle at {}", .0.display())]
    Cycle(PathBuf),
}

/// A local directory and the resource it is pushed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRoot {
    pub local: PathBuf,
    pub resource: String,
}

impl SyncRoot {
    pub fn new(local: impl Into<PathBuf>, resource: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            resource: resource.into(),
        }
    }
}

#[derive(Debug)]
pub struct RootOutcome {
    pub root: SyncRoot,
    pub result: Result<(), SyncError>,
}

#[derive(Debug)]
pub struct SyncReport {
    pub outcomes: Vec<RootOutcome>,
    pub warnings: Vec<RemoteWarning>,
    pub counters: Counters,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SyncRoot, &SyncError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|err| (&outcome.root, err)))
    }
}

/// Pushes local trees level by level.
///
/// Every request of a level is in flight at once; the level's subdirectories
/// are entered only after all of them came back without a transport error.
/// Rejections by the servlet are reported as warnings and do not stop the
/// descent.
pub struct Synchronizer<C, F> {
    client: C,
    fs: F,
}

impl<C: ContentClient, F: LocalFs> Synchronizer<C, F> {
    pub fn new(client: C, fs: F) -> Self {
        Self { client, fs }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Checks that every root is an existing directory.
    pub fn validate_roots(&self, roots: &[SyncRoot]) -> Result<(), SyncError> {
        for root in roots {
            match self.fs.kind(&root.local) {
                Ok(EntryKind::Dir) => {}
                Ok(_) => return Err(SyncError::NotADirectory(root.local.clone())),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return Err(SyncError::NotFound(root.local.clone()));
                }
                Err(source) => {
                    return Err(SyncError::Io {
                        path: root.local.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validates all roots, then pushes them concurrently. A failing root
    /// does not stop the others; its error ends up in the report.
    pub async fn sync_roots(&self, roots: &[SyncRoot]) -> Result<SyncReport, SyncError> {
        self.validate_roots(roots)?;
        let reporter = Reporter::new();
        let results = join_all(
            roots
                .iter()
                .map(|root| self.sync_tree(&root.local, &root.resource, &reporter)),
        )
        .await;

        let outcomes = roots
            .iter()
            .cloned()
            .zip(results)
            .map(|(root, result)| {
                if let Err(err) = &result {
                    log::error!("failed to push {}: {err}", root.local.display());
                }
                RootOutcome { root, result }
            })
            .collect();

        Ok(SyncReport {
            outcomes,
            warnings: reporter.warnings(),
            counters: reporter.counters(),
        })
    }

    pub async fn sync_tree(
        &self,
        local: &Path,
        resource: &str,
        reporter: &Reporter,
    ) -> Result<(), SyncError> {
        self.sync_level(local.to_path_buf(), resource.to_string(), Vec::new(), reporter)
            .await
    }

    fn sync_level<'a>(
        &'a self,
        directory: PathBuf,
        resource: String,
        ancestors: Vec<PathBuf>,
        reporter: &'a Reporter,
    ) -> LocalBoxFuture<'a, Result<(), SyncError>>
    where
        C: 'a,
        F: 'a,
    {
        self.visit(directory, resource, ancestors, reporter)
            .boxed_local()
    }

    async fn visit(
        &self,
        directory: PathBuf,
        resource: String,
        mut ancestors: Vec<PathBuf>,
        reporter: &Reporter,
    ) -> Result<(), SyncError> {
        let canonical = self
            .fs
            .canonicalize(&directory)
            .map_err(|source| SyncError::Io {
                path: directory.clone(),
                source,
            })?;
        if ancestors.contains(&canonical) {
            return Err(SyncError::Cycle(directory));
        }

        let level = Level::read(&self.fs, &directory, &resource)?;
        self.run_level(&level, reporter).await?;

        ancestors.push(canonical);
        let branches = level.directories.iter().map(|name| {
            self.sync_level(
                directory.join(name),
                concat_resource(&resource, name),
                ancestors.clone(),
                reporter,
            )
        });
        join_all(branches).await.into_iter().collect()
    }

    /// Sends every request of the level and waits for all of them. The first
    /// transport error, in task order, fails the level.
    pub async fn run_level(&self, level: &Level, reporter: &Reporter) -> Result<(), SyncError> {
        let tasks = level.tasks();
        join_all(tasks.iter().map(|task| self.run_task(task, reporter)))
            .await
            .into_iter()
            .collect()
    }

    async fn run_task(&self, task: &LevelTask, reporter: &Reporter) -> Result<(), SyncError> {
        let result = match task {
            LevelTask::File {
                parent,
                local,
                properties,
            } => {
                reporter.activity(Activity::File, local);
                self.client.create_file(parent, local, properties).await
            }
            LevelTask::Node {
                path,
                local,
                properties,
            } => {
                reporter.activity(Activity::Node, local);
                self.client.create_node(path, properties).await
            }
            LevelTask::Folder {
                path,
                local,
                properties,
            } => {
                reporter.activity(Activity::Folder, local);
                self.client.create_node(path, properties).await
            }
        };

        let outcome = result.map_err(|source| SyncError::Client {
            path: task.target().to_string(),
            source,
        })?;
        if !outcome.is_success() {
            reporter.warn(RemoteWarning::from_rejection(task.target(), &outcome));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
