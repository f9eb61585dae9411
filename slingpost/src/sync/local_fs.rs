use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sling_core::PropertyBag;

use super::descriptor::DescriptorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl LocalEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Read access to the local tree being pushed.
pub trait LocalFs {
    /// Kind of whatever `path` points at, following symlinks.
    fn kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Children of `dir`, sorted by name, each typed with a single lookup.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<LocalEntry>>;

    fn read_descriptor(&self, path: &Path) -> Result<PropertyBag, DescriptorError>;

    fn canonicalize(&self, dir: &Path) -> io::Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl LocalFs for StdFs {
    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = fs::metadata(path)?;
        Ok(kind_of(&metadata))
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<LocalEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Dangling links and unreadable entries carry no content to push.
            let kind = match fs::metadata(entry.path()) {
                Ok(metadata) => kind_of(&metadata),
                Err(err) => {
                    log::debug!("skipping {}: {err}", entry.path().display());
                    EntryKind::Other
                }
            };
            entries.push(LocalEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_descriptor(&self, path: &Path) -> Result<PropertyBag, DescriptorError> {
        let text = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DescriptorError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn canonicalize(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(dir)
    }
}

fn kind_of(metadata: &fs::Metadata) -> EntryKind {
    if metadata.is_dir() {
        EntryKind::Dir
    } else if metadata.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::BTreeMap;

    use super::*;

    enum Node {
        Dir,
        File(String),
    }

    /// In-memory tree for exercising the synchronizer without touching disk.
    #[derive(Default)]
    pub struct MemoryFs {
        nodes: BTreeMap<PathBuf, Node>,
        canonical: BTreeMap<PathBuf, PathBuf>,
    }

    impl MemoryFs {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn dir(mut self, path: &str) -> Self {
            self.nodes.insert(PathBuf::from(path), Node::Dir);
            self
        }

        pub fn file(mut self, path: &str, content: &str) -> Self {
            self.nodes
                .insert(PathBuf::from(path), Node::File(content.to_string()));
            self
        }

        /// Makes `path` resolve to `target`, like a symlinked directory.
        pub fn alias(mut self, path: &str, target: &str) -> Self {
            self.canonical
                .insert(PathBuf::from(path), PathBuf::from(target));
            self
        }

        fn not_found(path: &Path) -> io::Error {
            io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
        }
    }

    impl LocalFs for MemoryFs {
        fn kind(&self, path: &Path) -> io::Result<EntryKind> {
            match self.nodes.get(path) {
                Some(Node::Dir) => Ok(EntryKind::Dir),
                Some(Node::File(_)) => Ok(EntryKind::File),
                None => Err(Self::not_found(path)),
            }
        }

        fn read_dir(&self, dir: &Path) -> io::Result<Vec<LocalEntry>> {
            if !matches!(self.nodes.get(dir), Some(Node::Dir)) {
                return Err(Self::not_found(dir));
            }
            Ok(self
                .nodes
                .iter()
                .filter(|(path, _)| path.parent() == Some(dir))
                .map(|(path, node)| LocalEntry {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    kind: match node {
                        Node::Dir => EntryKind::Dir,
                        Node::File(_) => EntryKind::File,
                    },
                })
                .collect())
        }

        fn read_descriptor(&self, path: &Path) -> Result<PropertyBag, DescriptorError> {
            match self.nodes.get(path) {
                Some(Node::File(content)) => {
                    serde_json::from_str(content).map_err(|source| DescriptorError::Parse {
                        path: path.to_path_buf(),
                        source,
                    })
                }
                _ => Err(DescriptorError::Io {
                    path: path.to_path_buf(),
                    source: Self::not_found(path),
                }),
            }
        }

        fn canonicalize(&self, dir: &Path) -> io::Result<PathBuf> {
            Ok(self
                .canonical
                .get(dir)
                .cloned()
                .unwrap_or_else(|| dir.to_path_buf()))
        }
    }
}
