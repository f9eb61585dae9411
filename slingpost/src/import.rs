use std::path::PathBuf;

use futures_util::future::join_all;
use sling_core::{ClientError, ContentClient, ImportOptions};
use thiserror::Error;

use crate::report::{Activity, RemoteWarning, Reporter};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unable to determine the import type of {}", .0.display())]
    UnknownType(PathBuf),
    #[error("import of {} failed: {source}", file.display())]
    Client {
        file: PathBuf,
        #[source]
        source: ClientError,
    },
}

/// Content formats the servlet's import operation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportType {
    Json,
    Jar,
    Zip,
    JcrXml,
    Xml,
}

impl ImportType {
    /// Detection order. `jcr.xml` precedes `xml` so the longer suffix wins.
    pub const SUPPORTED: [ImportType; 5] = [
        ImportType::Json,
        ImportType::Jar,
        ImportType::Zip,
        ImportType::JcrXml,
        ImportType::Xml,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImportType::Json => "json",
            ImportType::Jar => "jar",
            ImportType::Zip => "zip",
            ImportType::JcrXml => "jcr.xml",
            ImportType::Xml => "xml",
        }
    }

    pub fn detect(file_name: &str) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|kind| file_name.ends_with(&format!(".{}", kind.as_str())))
    }

    /// `file_name` without this type's extension and its dot.
    pub fn node_name(self, file_name: &str) -> &str {
        file_name
            .strip_suffix(self.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap_or(file_name)
    }
}

/// A content file and the resource it is imported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
    pub file: PathBuf,
    pub resource: String,
}

impl ImportSource {
    pub fn new(file: impl Into<PathBuf>, resource: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            resource: resource.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportJob {
    pub file: PathBuf,
    pub parent: String,
    pub name: String,
    pub import_type: ImportType,
}

impl ImportJob {
    pub fn for_source(source: &ImportSource) -> Result<Self, ImportError> {
        let unknown = || ImportError::UnknownType(source.file.clone());
        let file_name = source
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(unknown)?;
        let import_type = ImportType::detect(file_name).ok_or_else(unknown)?;
        let name = import_type.node_name(file_name);
        Ok(Self {
            file: source.file.clone(),
            parent: source.resource.clone(),
            name: name.to_string(),
            import_type,
        })
    }
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub job: ImportJob,
    pub result: Result<(), ImportError>,
}

#[derive(Debug)]
pub struct ImportReport {
    pub outcomes: Vec<ImportOutcome>,
    pub warnings: Vec<RemoteWarning>,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ImportJob, &ImportError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|err| (&outcome.job, err)))
    }
}

/// Imports each content file on its own; every file gets the same options.
pub struct ImportRunner<C> {
    client: C,
    options: ImportOptions,
}

impl<C: ContentClient> ImportRunner<C> {
    pub fn new(client: C, options: ImportOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolves every source up front; one unknown extension rejects the
    /// whole batch.
    pub fn plan(sources: &[ImportSource]) -> Result<Vec<ImportJob>, ImportError> {
        sources.iter().map(ImportJob::for_source).collect()
    }

    pub async fn run(&self, sources: &[ImportSource]) -> Result<ImportReport, ImportError> {
        let jobs = Self::plan(sources)?;
        let reporter = Reporter::new();
        let results = join_all(jobs.iter().map(|job| self.import(job, &reporter))).await;

        let outcomes = jobs
            .into_iter()
            .zip(results)
            .map(|(job, result)| {
                if let Err(err) = &result {
                    log::error!("{err}");
                }
                ImportOutcome { job, result }
            })
            .collect();

        Ok(ImportReport {
            outcomes,
            warnings: reporter.warnings(),
        })
    }

    async fn import(&self, job: &ImportJob, reporter: &Reporter) -> Result<(), ImportError> {
        log::info!(
            "Importing {} with type '{}'",
            job.file.display(),
            job.import_type.as_str()
        );
        reporter.activity(Activity::Import, &job.file);
        let outcome = self
            .client
            .import_content(
                &job.parent,
                &job.name,
                &job.file,
                job.import_type.as_str(),
                &self.options,
            )
            .await
            .map_err(|source| ImportError::Client {
                file: job.file.clone(),
                source,
            })?;
        if !outcome.is_success() {
            reporter.warn(RemoteWarning::from_import_rejection(&job.parent, &outcome));
        }
        Ok(())
    }
}

/// Convenience for callers holding plain paths.
pub fn sources_for(files: &[PathBuf], resource: &str) -> Vec<ImportSource> {
    files
        .iter()
        .map(|file| ImportSource::new(file.clone(), resource))
        .collect()
}
