//! In-memory catalog, used for fixtures and tests.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use crate::compiler::{Field, Predicate, QueryRequest};
use crate::error::SearchError;
use crate::normalize::{normalize_row, RawRow, SearchResultItem};
use crate::source::{CatalogSource, QueryPage};

/// Evaluates compiled queries against a fixed set of rows with the same
/// semantics the hosted backend applies.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    rows: Vec<(RawRow, SearchResultItem)>,
}

impl MemoryCatalog {
    pub fn new(rows: impl IntoIterator<Item = Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|value| {
                let raw = RawRow(value);
                let item = normalize_row(&raw);
                (raw, item)
            })
            .collect();
        Self { rows }
    }

    /// Load from a JSON array of rows.
    pub fn from_json(json: &str) -> Result<Self, SearchError> {
        let rows: Vec<Value> = serde_json::from_str(json)?;
        Ok(Self::new(rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Run a query synchronously.
    pub fn execute(&self, request: &QueryRequest) -> QueryPage {
        let predicates = request.predicates();
        let mut matching: Vec<&(RawRow, SearchResultItem)> = self
            .rows
            .iter()
            .filter(|(_, item)| predicates.iter().all(|p| matches(item, p)))
            .collect();

        matching.sort_by(|(_, a), (_, b)| {
            let ord = compare_ids(a.id.as_str(), b.id.as_str());
            if request.order.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let total_count = matching.len() as u64;
        let rows = matching
            .into_iter()
            .skip(request.range.start as usize)
            .take(request.range.size() as usize)
            .map(|(raw, _)| raw.clone())
            .collect();

        QueryPage { rows, total_count }
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage, SearchError> {
        Ok(self.execute(request))
    }
}

fn matches(item: &SearchResultItem, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::AnyOf(inner) => inner.iter().any(|p| matches(item, p)),
        Predicate::ILike { field, needle } => text_of(item, *field)
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        Predicate::In { field, values } => {
            let value = text_of(item, *field);
            values.iter().any(|v| v == value)
        }
        Predicate::Gte { field, value } => number_of(item, *field) >= *value as f64,
        Predicate::Lte { field, value } => number_of(item, *field) <= *value as f64,
    }
}

fn text_of(item: &SearchResultItem, field: Field) -> &str {
    match field {
        Field::Id => item.id.as_str(),
        Field::Name => &item.name,
        Field::Description => &item.description,
        Field::Category => &item.category,
        Field::SellerLocation => &item.seller.location,
        Field::Price => "",
    }
}

fn number_of(item: &SearchResultItem, field: Field) -> f64 {
    match field {
        Field::Price => item.price,
        _ => 0.0,
    }
}

/// Numeric ids compare numerically, everything else lexically.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
