//! Normalization from raw detail payloads to [`ProductDetail`].
//!
//! Missing or malformed optional fields degrade to defaults; only
//! structurally unusable input (no business code — the payload has already
//! proven it has an `id` by deserializing) is rejected, as a per-item
//! failure the run counts and skips.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use stocktake_api::types::ItemDetail;
use stocktake_core::ProductDetail;

use crate::error::EngineError;

/// Category value used when an item has no recognized category
/// characteristic.
pub const DEFAULT_CATEGORY: &str = "base";

/// Site-specific normalization policy, lifted from configuration.
#[derive(Debug, Clone)]
pub struct NormalizeRules {
    /// Price-type names copied into the price map; all others are dropped.
    pub price_types: Vec<String>,
    /// Characteristic name that carries the category label.
    pub category_field: String,
    /// Preferred barcode scheme, e.g. `ean13`.
    pub barcode_scheme: String,
}

impl NormalizeRules {
    #[must_use]
    pub fn from_config(config: &stocktake_core::AppConfig) -> Self {
        Self {
            price_types: config.price_types.clone(),
            category_field: config.category_field.clone(),
            barcode_scheme: config.barcode_scheme.clone(),
        }
    }
}

/// Identifier → folder path index recorded during the base-product phase
/// and consulted when variants resolve their inherited path.
///
/// The two phases are strictly ordered by the run orchestrator, so lookups
/// here never race with insertions; completion order *within* a phase does
/// not affect the result.
#[derive(Debug, Default)]
pub struct PathIndex {
    paths: HashMap<String, String>,
}

impl PathIndex {
    pub fn record(&mut self, id: String, path: String) {
        self.paths.insert(id, path);
    }

    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.paths.get(id).map(String::as_str)
    }
}

/// Normalizes one raw detail payload.
///
/// # Errors
///
/// Returns [`EngineError::Normalization`] when the item has no usable
/// business code — the diffing key cannot be defaulted without
/// manufacturing colliding identities.
pub fn normalize_item(
    detail: ItemDetail,
    paths: &PathIndex,
    rules: &NormalizeRules,
) -> Result<ProductDetail, EngineError> {
    if detail.code.trim().is_empty() {
        return Err(EngineError::Normalization {
            id: detail.id,
            reason: "missing business code".to_owned(),
        });
    }

    let path = if detail.is_variant() {
        let parent_id = detail
            .product
            .as_ref()
            .and_then(|parent| parent.meta.href_id());
        match parent_id.and_then(|id| paths.lookup(id)) {
            Some(parent_path) => parent_path.to_owned(),
            None => {
                tracing::warn!(
                    id = %detail.id,
                    code = %detail.code,
                    "variant has no resolvable base-product path"
                );
                String::new()
            }
        }
    } else {
        detail.path_name.clone()
    };

    let category = detail
        .characteristics
        .iter()
        .find(|c| c.name == rules.category_field)
        .map(|c| stringify_characteristic(&c.value))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());

    let prices: BTreeMap<String, Decimal> = detail
        .sale_prices
        .iter()
        .filter(|p| rules.price_types.iter().any(|t| *t == p.price_type.name))
        .map(|p| (p.price_type.name.clone(), minor_to_major(p.value)))
        .collect();

    let barcodes = extract_barcodes(&detail, &rules.barcode_scheme);

    Ok(ProductDetail {
        id: detail.id,
        code: detail.code,
        name: detail.name,
        path,
        category,
        // The service reports negative stock for oversold items.
        stock: detail.stock.max(0.0),
        stock_days: detail.stock_days,
        prices,
        barcodes,
    })
}

/// Converts a minor-unit price to major units. The wire value is a JSON
/// number with an occasional float tail (`849900.0`), but the units
/// themselves are integral.
fn minor_to_major(value: f64) -> Decimal {
    #[allow(clippy::cast_possible_truncation)]
    Decimal::new(value.round() as i64, 2)
}

fn stringify_characteristic(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => DEFAULT_CATEGORY.to_owned(),
        other => other.to_string(),
    }
}

/// Prefer the configured scheme's values; fall back to the field names of
/// the first barcode entry; no barcodes at all yields an empty list.
fn extract_barcodes(detail: &ItemDetail, scheme: &str) -> Vec<String> {
    let preferred: Vec<String> = detail
        .barcodes
        .iter()
        .filter_map(|entry| entry.get(scheme).cloned())
        .collect();
    if !preferred.is_empty() {
        return preferred;
    }
    detail
        .barcodes
        .first()
        .map(|entry| entry.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> NormalizeRules {
        NormalizeRules {
            price_types: vec!["Retail".to_owned(), "Bulk".to_owned()],
            category_field: "Category".to_owned(),
            barcode_scheme: "ean13".to_owned(),
        }
    }

    fn base_detail(id: &str, code: &str) -> ItemDetail {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "Ginger Beer",
            "code": code,
            "pathName": "Drinks/Sodas",
            "stock": 14.0,
            "stockDays": 3.0,
            "meta": {"href": format!("https://inventory.test/entity/product/{id}"), "type": "product"}
        }))
        .unwrap()
    }

    fn variant_detail(id: &str, code: &str, parent_id: &str) -> ItemDetail {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "Ginger Beer 0.5l",
            "code": code,
            "meta": {"href": format!("https://inventory.test/entity/variant/{id}"), "type": "variant"},
            "product": {"meta": {"href": format!("https://inventory.test/entity/product/{parent_id}")}}
        }))
        .unwrap()
    }

    #[test]
    fn base_product_keeps_its_own_path() {
        let normalized =
            normalize_item(base_detail("p1", "GB-001"), &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.path, "Drinks/Sodas");
        assert_eq!(normalized.code, "GB-001");
    }

    #[test]
    fn variant_inherits_path_from_recorded_base_product() {
        let mut paths = PathIndex::default();
        paths.record("p1".to_owned(), "Drinks/Sodas".to_owned());
        let normalized = normalize_item(variant_detail("v1", "GB-001-05", "p1"), &paths, &rules()).unwrap();
        assert_eq!(normalized.path, "Drinks/Sodas");
    }

    #[test]
    fn variant_with_unknown_parent_degrades_to_empty_path() {
        let normalized = normalize_item(
            variant_detail("v1", "GB-001-05", "p-unknown"),
            &PathIndex::default(),
            &rules(),
        )
        .unwrap();
        assert_eq!(normalized.path, "");
    }

    #[test]
    fn missing_code_is_a_per_item_failure() {
        let result = normalize_item(base_detail("p1", "  "), &PathIndex::default(), &rules());
        assert!(
            matches!(result, Err(EngineError::Normalization { ref id, .. }) if id == "p1"),
            "expected Normalization failure, got: {result:?}"
        );
    }

    #[test]
    fn category_comes_from_first_matching_characteristic() {
        let mut detail = base_detail("p1", "GB-001");
        detail.characteristics = serde_json::from_value(serde_json::json!([
            {"name": "Color", "value": "amber"},
            {"name": "Category", "value": "soda"},
            {"name": "Category", "value": "ignored-second-match"}
        ]))
        .unwrap();
        let normalized = normalize_item(detail, &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.category, "soda");
    }

    #[test]
    fn absent_category_characteristic_uses_sentinel() {
        let normalized =
            normalize_item(base_detail("p1", "GB-001"), &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn non_string_category_value_is_stringified() {
        let mut detail = base_detail("p1", "GB-001");
        detail.characteristics = serde_json::from_value(serde_json::json!([
            {"name": "Category", "value": 7}
        ]))
        .unwrap();
        let normalized = normalize_item(detail, &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.category, "7");
    }

    #[test]
    fn prices_respect_allow_list_and_convert_to_major_units() {
        let mut detail = base_detail("p1", "GB-001");
        detail.sale_prices = serde_json::from_value(serde_json::json!([
            {"value": 12500.0, "priceType": {"name": "Retail"}},
            {"value": 9900.0, "priceType": {"name": "Bulk"}},
            {"value": 100.0, "priceType": {"name": "Internal"}}
        ]))
        .unwrap();
        let normalized = normalize_item(detail, &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.prices.len(), 2);
        assert_eq!(normalized.prices["Retail"], Decimal::new(12500, 2));
        assert_eq!(normalized.prices["Bulk"], Decimal::new(9900, 2));
        assert!(!normalized.prices.contains_key("Internal"));
    }

    #[test]
    fn barcodes_prefer_configured_scheme() {
        let mut detail = base_detail("p1", "GB-001");
        detail.barcodes = serde_json::from_value(serde_json::json!([
            {"code128": "A-1"},
            {"ean13": "4600682000129"},
            {"ean13": "4600682000136"}
        ]))
        .unwrap();
        let normalized = normalize_item(detail, &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.barcodes, vec!["4600682000129", "4600682000136"]);
    }

    #[test]
    fn barcodes_fall_back_to_first_entry_field_names() {
        let mut detail = base_detail("p1", "GB-001");
        detail.barcodes = serde_json::from_value(serde_json::json!([
            {"code128": "A-1", "gtin": "B-2"}
        ]))
        .unwrap();
        let normalized = normalize_item(detail, &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.barcodes, vec!["code128", "gtin"]);
    }

    #[test]
    fn no_barcodes_yields_empty_list() {
        let normalized =
            normalize_item(base_detail("p1", "GB-001"), &PathIndex::default(), &rules()).unwrap();
        assert!(normalized.barcodes.is_empty());
    }

    #[test]
    fn negative_stock_is_clamped_to_zero() {
        let mut detail = base_detail("p1", "GB-001");
        detail.stock = -3.0;
        let normalized = normalize_item(detail, &PathIndex::default(), &rules()).unwrap();
        assert_eq!(normalized.stock, 0.0);
    }
}
