pub mod descriptor;
pub mod engine;
pub mod level;
pub mod local_fs;
pub mod paths;

pub use descriptor::{DescriptorError, DescriptorStore};
pub use engine::{RootOutcome, SyncError, SyncReport, SyncRoot, Synchronizer};
pub use level::{Level, LevelTask};
pub use local_fs::{EntryKind, LocalEntry, LocalFs, StdFs};
