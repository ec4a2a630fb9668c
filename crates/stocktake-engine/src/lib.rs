pub mod diff;
pub mod dispatch;
pub mod error;
pub mod folders;
pub mod normalize;
pub mod run;
pub mod snapshot;

pub use diff::{classify, Change, DiffEntry, DiffRecord};
pub use dispatch::{dispatch_all, TaskOutcome};
pub use error::EngineError;
pub use folders::FolderIndex;
pub use normalize::{normalize_item, NormalizeRules, PathIndex};
pub use run::{folder_filters, run_sync, RunOutcome, RunSummary};
pub use snapshot::SnapshotStore;
