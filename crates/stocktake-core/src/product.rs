use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// A fully normalized catalog item, produced once per successful detail
/// fetch and immutable afterwards.
///
/// `code` is the business key used for change detection between runs;
/// `id` is the service's internal identifier. The two are distinct:
/// snapshots and diffs key on `code`, variant path resolution keys on `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    pub id: String,
    pub code: String,
    pub name: String,
    /// Hierarchical folder path. For variants this is the parent
    /// product's path, resolved during normalization.
    pub path: String,
    pub category: String,
    /// Current stock quantity, clamped to zero — the service reports
    /// negative values for oversold items.
    pub stock: f64,
    /// Days the item has been in stock.
    pub stock_days: f64,
    /// Price-type name → price in major units, restricted to the
    /// configured allow-list.
    pub prices: BTreeMap<String, Decimal>,
    /// Barcode values for the preferred scheme, or the raw field names
    /// of the first barcode entry when the preferred scheme is absent.
    pub barcodes: Vec<String>,
}
