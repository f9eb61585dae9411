use std::path::{Path, PathBuf};

use sling_core::{PropertyBag, PropertyValue};

use super::descriptor::{DescriptorStore, is_descriptor_name};
use super::engine::SyncError;
use super::local_fs::{EntryKind, LocalEntry, LocalFs};
use super::paths::{base_name, concat_resource};

pub const PRIMARY_TYPE_PROPERTY: &str = "jcr:primaryType";
pub const FOLDER_PRIMARY_TYPE: &str = "sling:Folder";

/// Children of one directory split by role. Every classified child lands in
/// exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub files: Vec<String>,
    pub directories: Vec<String>,
    pub descriptors: Vec<String>,
}

pub fn classify(entries: Vec<LocalEntry>) -> Classification {
    let mut out = Classification::default();
    for entry in entries {
        match entry.kind {
            EntryKind::Dir => out.directories.push(entry.name),
            EntryKind::File if is_descriptor_name(&entry.name) => out.descriptors.push(entry.name),
            EntryKind::File => out.files.push(entry.name),
            EntryKind::Other => log::debug!("ignoring {}: not a file or directory", entry.name),
        }
    }
    out
}

/// One request the level has to send.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelTask {
    File {
        parent: String,
        local: PathBuf,
        properties: PropertyBag,
    },
    Node {
        path: String,
        local: PathBuf,
        properties: PropertyBag,
    },
    Folder {
        path: String,
        local: PathBuf,
        properties: PropertyBag,
    },
}

impl LevelTask {
    /// Resource the request is addressed to.
    pub fn target(&self) -> &str {
        match self {
            LevelTask::File { parent, .. } => parent,
            LevelTask::Node { path, .. } | LevelTask::Folder { path, .. } => path,
        }
    }
}

/// Everything known about one directory while it is being pushed.
#[derive(Debug, Clone)]
pub struct Level {
    pub directory: PathBuf,
    pub resource: String,
    pub files: Vec<String>,
    pub directories: Vec<String>,
    pub descriptors: DescriptorStore,
}

impl Level {
    pub fn read(fs: &impl LocalFs, directory: &Path, resource: &str) -> Result<Self, SyncError> {
        let entries = fs.read_dir(directory).map_err(|source| SyncError::Io {
            path: directory.to_path_buf(),
            source,
        })?;
        let Classification {
            files,
            directories,
            descriptors,
        } = classify(entries);
        let descriptors = DescriptorStore::load(fs, directory, &descriptors)?;
        Ok(Self {
            directory: directory.to_path_buf(),
            resource: resource.to_string(),
            files,
            directories,
            descriptors,
        })
    }

    /// Descriptors describing neither a file nor a directory of this level.
    pub fn unused_descriptors(&self) -> Vec<&str> {
        self.descriptors
            .names()
            .filter(|name| {
                !self.directories.iter().any(|dir| dir == name)
                    && !self.files.iter().any(|file| base_name(file) == *name)
            })
            .collect()
    }

    /// Requests for this level: files, then virtual nodes, then folders.
    pub fn tasks(&self) -> Vec<LevelTask> {
        let files = self.files.iter().map(|name| LevelTask::File {
            parent: self.resource.clone(),
            local: self.directory.join(name),
            properties: self.descriptors.properties_for(name, PropertyBag::new()),
        });
        let nodes = self.unused_descriptors().into_iter().map(|name| LevelTask::Node {
            path: concat_resource(&self.resource, name),
            local: self.directory.join(format!("{name}.json")),
            properties: self.descriptors.properties_for_base(name, PropertyBag::new()),
        });
        let folders = self.directories.iter().map(|name| LevelTask::Folder {
            path: concat_resource(&self.resource, name),
            local: self.directory.join(name),
            properties: self.descriptors.properties_for(name, folder_seed()),
        });
        files.chain(nodes).chain(folders).collect()
    }
}

fn folder_seed() -> PropertyBag {
    PropertyBag::from([(
        PRIMARY_TYPE_PROPERTY.to_string(),
        PropertyValue::from(FOLDER_PRIMARY_TYPE),
    )])
}
