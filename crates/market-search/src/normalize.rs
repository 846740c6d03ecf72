//! Normalization of backend rows into uniform result items.
//!
//! Joins come back from the backend as an object, a one-element array, an
//! empty array, `null`, or not at all. Everything downstream sees a single
//! shape: [`SearchResultItem`] with its ad and seller records always present.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{AdId, ProductId};

/// A catalog row exactly as the data source returned it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(pub Value);

impl From<Value> for RawRow {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Promotion data joined from the ads table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdSummary {
    pub id: AdId,
    pub is_promoted: bool,
    pub views: u64,
}

/// Denormalized seller data joined from the shops table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SellerSummary {
    pub name: String,
    pub location: String,
}

/// A renderable search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub rating: f64,
    pub category: String,
    pub images: Vec<String>,
    pub ad: AdSummary,
    pub seller: SellerSummary,
}

impl SearchResultItem {
    pub fn is_promoted(&self) -> bool {
        self.ad.is_promoted
    }

    pub fn views(&self) -> u64 {
        self.ad.views
    }

    /// First image, if any.
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Normalize a page of rows. Total: never fails, never panics.
pub fn normalize(rows: &[RawRow]) -> Vec<SearchResultItem> {
    rows.iter().map(normalize_row).collect()
}

/// Normalize a single row. Non-object rows produce an all-default item.
pub fn normalize_row(row: &RawRow) -> SearchResultItem {
    let empty = Map::new();
    let fields = row.0.as_object().unwrap_or(&empty);

    let ad = joined(fields, &["ads", "ad"])
        .map(|ad| AdSummary {
            id: AdId::new(string_field(ad, "id")),
            is_promoted: bool_field(ad, &["is_promoted", "isPromoted"]),
            views: number_field(ad, "views").map(|v| v.max(0.0) as u64).unwrap_or(0),
        })
        .unwrap_or_default();

    let seller = joined(fields, &["shops", "shop"])
        .map(|shop| SellerSummary {
            name: string_field(shop, "name"),
            location: string_field(shop, "location"),
        })
        .unwrap_or_default();

    SearchResultItem {
        id: ProductId::new(string_field(fields, "id")),
        name: string_field(fields, "name"),
        description: string_field(fields, "description"),
        price: number_field(fields, "price").unwrap_or(0.0),
        currency: string_field(fields, "currency"),
        rating: number_field(fields, "rating").unwrap_or(0.0),
        category: string_field(fields, "category"),
        images: images_field(fields),
        ad,
        seller,
    }
}

/// First object of a join that may be an object or an array of objects.
fn joined<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    let value = keys.iter().find_map(|k| fields.get(*k))?;
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn bool_field(fields: &Map<String, Value>, keys: &[&str]) -> bool {
    match keys.iter().find_map(|k| fields.get(*k)) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn images_field(fields: &Map<String, Value>) -> Vec<String> {
    let value = ["images", "image_urls", "image"]
        .iter()
        .find_map(|k| fields.get(*k));
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
