use thiserror::Error;

use stocktake_api::ApiError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The same business code appeared twice. Identity is ambiguous, so the
    /// run is rejected rather than silently keeping the last record seen.
    #[error("duplicate item code \"{code}\" in {scope}")]
    DuplicateCode { code: String, scope: &'static str },

    /// Per-item failure: the payload is structurally unusable. Counted and
    /// skipped at the run level, never propagated as fatal.
    #[error("item {id}: {reason}")]
    Normalization { id: String, reason: String },

    /// The listing named items but not a single one could be fetched; the
    /// run has produced nothing worth reporting or snapshotting.
    #[error("listing returned {listed} items but none could be fetched ({failed} failures)")]
    NoRecords { listed: usize, failed: usize },

    #[error("failed to write snapshot {path}: {source}")]
    SnapshotWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown folder \"{name}\"")]
    UnknownFolder { name: String },
}
