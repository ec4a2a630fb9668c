//! Change classification between the current run and the prior snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use stocktake_core::ProductDetail;

/// Per-code verdict from comparing two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    Unchanged,
    New,
    Disappeared,
    StockChanged,
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Change::Unchanged => "unchanged",
            Change::New => "new",
            Change::Disappeared => "disappeared",
            Change::StockChanged => "stock_changed",
        })
    }
}

/// The record a classification applies to. Disappeared codes have no live
/// detail this run, so they carry a placeholder with the last-known state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiffRecord {
    Current(ProductDetail),
    Departed { code: String, last_stock: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub change: Change,
    pub record: DiffRecord,
}

impl DiffEntry {
    #[must_use]
    pub fn code(&self) -> &str {
        match &self.record {
            DiffRecord::Current(detail) => &detail.code,
            DiffRecord::Departed { code, .. } => code,
        }
    }
}

/// Classifies every code in the union of `current` and `previous`.
///
/// - only in `current` → [`Change::New`]
/// - only in `previous` → [`Change::Disappeared`] with a placeholder record
/// - in both with equal quantity → [`Change::Unchanged`]
/// - in both with different quantity → [`Change::StockChanged`]
///
/// Both inputs are keyed maps, so duplicate codes are impossible here —
/// they are rejected while the maps are built (run-fatal), never resolved
/// by keeping the last record seen.
#[must_use]
pub fn classify(
    current: BTreeMap<String, ProductDetail>,
    previous: &BTreeMap<String, f64>,
) -> Vec<DiffEntry> {
    let mut entries = Vec::with_capacity(current.len() + previous.len());

    let departed: Vec<(&String, &f64)> = previous
        .iter()
        .filter(|(code, _)| !current.contains_key(*code))
        .collect();

    for (code, detail) in current {
        let change = match previous.get(&code) {
            None => Change::New,
            Some(prior) if *prior == detail.stock => Change::Unchanged,
            Some(_) => Change::StockChanged,
        };
        entries.push(DiffEntry {
            change,
            record: DiffRecord::Current(detail),
        });
    }

    for (code, last_stock) in departed {
        entries.push(DiffEntry {
            change: Change::Disappeared,
            record: DiffRecord::Departed {
                code: code.clone(),
                last_stock: *last_stock,
            },
        });
    }

    entries
}
