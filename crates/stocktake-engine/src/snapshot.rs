//! Persistence of the previous run's `code → quantity` state.
//!
//! The snapshot is a two-column text file with a header line:
//!
//! ```text
//! code,quantity
//! GB-001,14
//! GB-001-05,2.5
//! ```
//!
//! Codes may contain commas; lines are split on the *last* comma, which is
//! unambiguous because the quantity is always a plain number. A missing
//! file is an empty snapshot (first run), and an unreadable or corrupt file
//! is logged and treated as empty — change detection degrades to
//! "everything is new" instead of failing the run. Duplicate codes are the
//! one exception: identity is ambiguous, so the run is rejected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

const HEADER: &str = "code,quantity";

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previous run's mapping.
    ///
    /// # Errors
    ///
    /// Only [`EngineError::DuplicateCode`] — every other problem degrades
    /// to an empty mapping.
    pub fn load(&self) -> Result<BTreeMap<String, f64>, EngineError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no prior snapshot — treating every item as new");
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "snapshot unreadable — continuing with an empty one"
                );
                return Ok(BTreeMap::new());
            }
        };

        let mut mapping = BTreeMap::new();
        for (line_no, line) in content.lines().enumerate() {
            if line_no == 0 && line == HEADER {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            let Some((code, quantity)) = line.rsplit_once(',') else {
                tracing::warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    "snapshot corrupt — continuing with an empty one"
                );
                return Ok(BTreeMap::new());
            };
            let Ok(quantity) = quantity.trim().parse::<f64>() else {
                tracing::warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    "snapshot corrupt — continuing with an empty one"
                );
                return Ok(BTreeMap::new());
            };
            if mapping.insert(code.to_owned(), quantity).is_some() {
                return Err(EngineError::DuplicateCode {
                    code: code.to_owned(),
                    scope: "snapshot",
                });
            }
        }
        Ok(mapping)
    }

    /// Atomically replaces the snapshot with `mapping`.
    ///
    /// Writes a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the prior snapshot intact.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SnapshotWrite`] on any filesystem failure.
    pub fn save(&self, mapping: &BTreeMap<String, f64>) -> Result<(), EngineError> {
        let mut content = String::with_capacity(mapping.len() * 24 + HEADER.len() + 1);
        content.push_str(HEADER);
        content.push('\n');
        for (code, quantity) in mapping {
            content.push_str(code);
            content.push(',');
            // f64 Display round-trips exactly through parse::<f64>.
            content.push_str(&quantity.to_string());
            content.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|source| EngineError::SnapshotWrite {
            path: self.path.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| EngineError::SnapshotWrite {
            path: self.path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), items = mapping.len(), "snapshot replaced");
        Ok(())
    }
}
