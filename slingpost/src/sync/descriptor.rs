use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use sling_core::PropertyBag;
use thiserror::Error;

use super::local_fs::LocalFs;
use super::paths::base_name;

/// Extension that marks a file as a descriptor rather than content.
pub const DESCRIPTOR_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid descriptor {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn is_descriptor_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == DESCRIPTOR_EXTENSION)
}

/// Parsed descriptors of one directory, keyed by base name.
///
/// Loaded once when a level is read and never modified afterwards, so every
/// lookup within the level sees the same properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorStore {
    descriptors: BTreeMap<String, PropertyBag>,
}

impl DescriptorStore {
    pub fn load(
        fs: &impl LocalFs,
        directory: &Path,
        names: &[String],
    ) -> Result<Self, DescriptorError> {
        let mut descriptors = BTreeMap::new();
        for name in names {
            let properties = fs.read_descriptor(&directory.join(name))?;
            descriptors.insert(base_name(name).to_string(), properties);
        }
        Ok(Self { descriptors })
    }

    pub fn from_map(descriptors: BTreeMap<String, PropertyBag>) -> Self {
        Self { descriptors }
    }

    /// Properties for a content entry: its descriptor is looked up by the
    /// entry name minus its extension, then laid over `initial`.
    pub fn properties_for(&self, entry_name: &str, initial: PropertyBag) -> PropertyBag {
        self.properties_for_base(base_name(entry_name), initial)
    }

    /// Same as [`properties_for`](Self::properties_for) with an exact key.
    pub fn properties_for_base(&self, base: &str, mut initial: PropertyBag) -> PropertyBag {
        if let Some(descriptor) = self.descriptors.get(base) {
            initial.extend(
                descriptor
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
        }
        initial
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }
}
