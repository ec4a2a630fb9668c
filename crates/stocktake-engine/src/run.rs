//! Run orchestration: listing → detail phases → normalize → diff → snapshot.
//!
//! Two bounded-concurrency detail phases run strictly in sequence — base
//! products first, variants second — so every variant's parent path is on
//! record before any variant is normalized, no matter how detail fetches
//! interleave within a phase.

use std::collections::BTreeMap;

use serde::Serialize;

use stocktake_api::types::{ItemDetail, ListingRow};
use stocktake_api::InventoryClient;
use stocktake_core::ProductDetail;

use crate::diff::{classify, Change, DiffEntry};
use crate::dispatch::{dispatch_all, TaskOutcome};
use crate::error::EngineError;
use crate::folders::FolderIndex;
use crate::normalize::{normalize_item, NormalizeRules, PathIndex};
use crate::snapshot::SnapshotStore;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Items named by the listing.
    pub listed: usize,
    /// Items fetched and normalized successfully.
    pub fetched: usize,
    /// Items lost to fetch or normalization failures.
    pub failed_items: usize,
    pub new: usize,
    pub disappeared: usize,
    pub stock_changed: usize,
    pub unchanged: usize,
    pub snapshot_saved: bool,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub entries: Vec<DiffEntry>,
    pub summary: RunSummary,
}

/// Builds listing filter expressions covering `folder_name` and every
/// folder below it.
///
/// # Errors
///
/// Returns [`EngineError::UnknownFolder`] if no folder has that name, or
/// any listing-fetch error from the folder catalog.
pub async fn folder_filters(
    client: &InventoryClient,
    folder_name: &str,
) -> Result<Vec<String>, EngineError> {
    let index = FolderIndex::build(client.fetch_folders().await?);
    let Some(id) = index.find_by_name(folder_name) else {
        return Err(EngineError::UnknownFolder {
            name: folder_name.to_owned(),
        });
    };
    Ok(index
        .subtree_hrefs(id)
        .into_iter()
        .map(|href| format!("productFolder={href}"))
        .collect())
}

/// Executes one full sync run.
///
/// `filters` restricts the listing to the given filter expressions,
/// fetched sequentially so per-partition order is preserved; an empty
/// slice fetches the whole catalog in one stream.
///
/// Per-item failures are counted and reported in the summary; the run
/// itself fails only on listing failure, credential exhaustion, duplicate
/// business codes, or when a non-empty listing yields not a single record.
/// The prior snapshot is replaced only after at least one record was
/// produced, so a failed run never destroys the last good state.
///
/// # Errors
///
/// [`EngineError::Api`] (listing failure or fatal credential exhaustion),
/// [`EngineError::DuplicateCode`], [`EngineError::NoRecords`], or
/// [`EngineError::SnapshotWrite`].
pub async fn run_sync(
    client: &InventoryClient,
    config: &stocktake_core::AppConfig,
    snapshot: &SnapshotStore,
    filters: &[String],
) -> Result<RunOutcome, EngineError> {
    let previous = snapshot.load()?;
    tracing::info!(prior_items = previous.len(), "starting sync run");

    let mut rows: Vec<ListingRow> = Vec::new();
    if filters.is_empty() {
        rows = client.fetch_all_items(None).await?;
    } else {
        for expr in filters {
            rows.extend(client.fetch_all_items(Some(expr)).await?);
        }
    }
    let listed = rows.len();
    tracing::info!(listed, partitions = filters.len().max(1), "listing complete");

    let (variant_rows, base_rows): (Vec<ListingRow>, Vec<ListingRow>) =
        rows.into_iter().partition(ListingRow::is_variant);

    let rules = NormalizeRules::from_config(config);
    let limit = config.max_concurrent_fetches;
    let mut paths = PathIndex::default();
    let mut normalized: Vec<ProductDetail> = Vec::new();
    let mut failed = 0usize;

    // Phase 1: base products. Every base path must be on record before the
    // variant phase starts.
    let (hrefs, skipped) = detail_hrefs(base_rows);
    failed += skipped;
    let outcomes = dispatch_all(hrefs, limit, |href| async move {
        client.fetch_item_detail(&href).await
    })
    .await?;
    failed += collect_phase(outcomes, &mut paths, true, &rules, &mut normalized);

    // Phase 2: variants.
    let (hrefs, skipped) = detail_hrefs(variant_rows);
    failed += skipped;
    let outcomes = dispatch_all(hrefs, limit, |href| async move {
        client.fetch_item_detail(&href).await
    })
    .await?;
    failed += collect_phase(outcomes, &mut paths, false, &rules, &mut normalized);

    let fetched = normalized.len();
    if listed > 0 && fetched == 0 {
        return Err(EngineError::NoRecords { listed, failed });
    }

    let mut current: BTreeMap<String, ProductDetail> = BTreeMap::new();
    for product in normalized {
        let code = product.code.clone();
        if current.insert(code.clone(), product).is_some() {
            return Err(EngineError::DuplicateCode {
                code,
                scope: "current run",
            });
        }
    }

    let quantities: BTreeMap<String, f64> = current
        .iter()
        .map(|(code, product)| (code.clone(), product.stock))
        .collect();
    let entries = classify(current, &previous);

    let mut summary = RunSummary {
        listed,
        fetched,
        failed_items: failed,
        ..RunSummary::default()
    };
    for entry in &entries {
        match entry.change {
            Change::New => summary.new += 1,
            Change::Disappeared => summary.disappeared += 1,
            Change::StockChanged => summary.stock_changed += 1,
            Change::Unchanged => summary.unchanged += 1,
        }
    }

    if fetched > 0 {
        snapshot.save(&quantities)?;
        summary.snapshot_saved = true;
    }

    tracing::info!(
        listed = summary.listed,
        fetched = summary.fetched,
        failed_items = summary.failed_items,
        new = summary.new,
        disappeared = summary.disappeared,
        stock_changed = summary.stock_changed,
        unchanged = summary.unchanged,
        snapshot_saved = summary.snapshot_saved,
        "sync run complete"
    );

    Ok(RunOutcome { entries, summary })
}

/// Detail URLs of the given rows. Rows without one cannot be fetched and
/// are counted as failures, not silently dropped.
fn detail_hrefs(rows: Vec<ListingRow>) -> (Vec<String>, usize) {
    let mut hrefs = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        if row.meta.href.is_empty() {
            tracing::warn!(id = %row.id, "listing row has no detail href — skipping item");
            skipped += 1;
        } else {
            hrefs.push(row.meta.href);
        }
    }
    (hrefs, skipped)
}

/// Folds one phase's outcomes into the normalized set, recording base
/// paths when asked. Returns the number of items lost.
fn collect_phase(
    outcomes: Vec<TaskOutcome<ItemDetail>>,
    paths: &mut PathIndex,
    record_paths: bool,
    rules: &NormalizeRules,
    normalized: &mut Vec<ProductDetail>,
) -> usize {
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Fetched(detail) => {
                if record_paths && detail.has_variants() {
                    paths.record(detail.id.clone(), detail.path_name.clone());
                }
                match normalize_item(detail, paths, rules) {
                    Ok(product) => normalized.push(product),
                    Err(error) => {
                        tracing::warn!(error = %error, "skipping item — normalization failed");
                        failed += 1;
                    }
                }
            }
            TaskOutcome::Failed { .. } => failed += 1,
        }
    }
    failed
}
