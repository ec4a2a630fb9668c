//! Raw response types for the inventory service's JSON API.
//!
//! ## Observed shape
//!
//! Every collection endpoint (`assortment`, `productfolder`) wraps its
//! results in a `{"rows": [...]}` envelope sliced by `limit`/`offset`.
//! Detail objects are tolerant by design: apart from `id`, every field we
//! read may be absent depending on entity type and account configuration,
//! so everything else carries `#[serde(default)]` and normalization deals
//! with the fallout.
//!
//! ### `characteristics`
//! Only present on variants. `value` is usually a string but the API also
//! emits numbers and booleans for custom fields; we keep the raw JSON value
//! and stringify during normalization.
//!
//! ### `salePrices[].value`
//! Price in minor units. Documented as an integer, but observed responses
//! carry a float tail (`849900.0`), so the field deserializes as `f64`.
//!
//! ### `barcodes`
//! A list of single-entry objects keyed by scheme, e.g.
//! `[{"ean13": "4600682…"}, {"code128": "…"}]`. Ordered maps keep the
//! fallback output deterministic.
//!
//! ### `product`
//! Variant rows carry a back-reference to their base product; the parent's
//! identifier is the last segment of `product.meta.href`.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One `limit`/`offset` slice of a collection endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RowsPage<T> {
    #[serde(default)]
    pub rows: Vec<T>,
}

/// Entity metadata attached to every object and reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    /// Absolute URL of the entity's detail endpoint.
    #[serde(default)]
    pub href: String,
    /// Entity type discriminator, e.g. `"product"` or `"variant"`.
    #[serde(rename = "type", default)]
    pub entity_type: String,
}

impl Meta {
    /// The entity identifier, i.e. the last path segment of `href`.
    #[must_use]
    pub fn href_id(&self) -> Option<&str> {
        self.href
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }
}

/// A reference to another entity (variant → base product, folder → parent).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityRef {
    #[serde(default)]
    pub meta: Meta,
}

/// One listing row. Deliberately minimal: the listing is only used to
/// partition items and to learn each item's detail URL; all fields that
/// feed normalization come from the detail fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingRow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub meta: Meta,
}

impl ListingRow {
    #[must_use]
    pub fn is_variant(&self) -> bool {
        self.meta.entity_type == "variant"
    }
}

/// A full item detail payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub path_name: String,
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub stock_days: f64,
    #[serde(default)]
    pub variants_count: i64,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
    #[serde(default)]
    pub sale_prices: Vec<SalePrice>,
    #[serde(default)]
    pub barcodes: Vec<BTreeMap<String, String>>,
    /// Back-reference to the base product; present on variants only.
    #[serde(default)]
    pub product: Option<EntityRef>,
}

impl ItemDetail {
    #[must_use]
    pub fn is_variant(&self) -> bool {
        self.meta.entity_type == "variant"
    }

    /// `true` for base products that own at least one variant.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        self.variants_count > 0
    }
}

/// One custom characteristic attached to a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct Characteristic {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePrice {
    /// Price in minor units; see the module docs for why this is `f64`.
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub price_type: PriceType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceType {
    #[serde(default)]
    pub name: String,
}

/// One folder row from the `productfolder` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub meta: Meta,
    /// Parent folder reference; absent on top-level folders.
    #[serde(default)]
    pub product_folder: Option<EntityRef>,
}
