use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use sling_core::PostOutcome;

/// A request the servlet answered with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWarning {
    pub path: String,
    pub status: u16,
    pub class: Option<String>,
    pub message: Option<String>,
}

impl RemoteWarning {
    /// Warning for a rejected folder, file or node write, described by the
    /// response's `error` object.
    pub fn from_rejection(target: &str, outcome: &PostOutcome) -> Self {
        let error = outcome.body.error.clone().unwrap_or_default();
        Self {
            path: outcome
                .body
                .path
                .clone()
                .unwrap_or_else(|| target.to_string()),
            status: outcome.status.as_u16(),
            class: error.class,
            message: error.message,
        }
    }

    /// Warning for a rejected import, described by `status.message`.
    pub fn from_import_rejection(target: &str, outcome: &PostOutcome) -> Self {
        Self {
            path: outcome
                .body
                .path
                .clone()
                .unwrap_or_else(|| target.to_string()),
            status: outcome.status.as_u16(),
            class: None,
            message: outcome
                .body
                .status_message
                .clone()
                .or_else(|| outcome.body.title.clone()),
        }
    }
}

impl fmt::Display for RemoteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match &self.class {
            Some(class) => write!(f, "Error writing {}: {class}: {message}.", self.path),
            None => write!(f, "Error writing {}: {message}.", self.path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    File,
    Folder,
    Node,
    Import,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub files: usize,
    pub folders: usize,
    pub nodes: usize,
    pub imports: usize,
}

#[derive(Debug, Default)]
struct ReporterState {
    warnings: Vec<RemoteWarning>,
    counters: Counters,
}

/// Collects what a run did and what the servlet complained about.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    state: Arc<Mutex<ReporterState>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self, activity: Activity, local: &Path) {
        // Imports announce themselves together with their type.
        let label = match activity {
            Activity::File => Some("File"),
            Activity::Folder => Some("Dir "),
            Activity::Node => Some("Node"),
            Activity::Import => None,
        };
        if let Some(label) = label {
            log::info!("{label}: {}", local.display());
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let counters = &mut state.counters;
        match activity {
            Activity::File => counters.files += 1,
            Activity::Folder => counters.folders += 1,
            Activity::Node => counters.nodes += 1,
            Activity::Import => counters.imports += 1,
        }
    }

    pub fn warn(&self, warning: RemoteWarning) {
        log::warn!("{warning}");
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .warnings
            .push(warning);
    }

    pub fn warnings(&self) -> Vec<RemoteWarning> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .warnings
            .clone()
    }

    pub fn counters(&self) -> Counters {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .counters
    }
}
