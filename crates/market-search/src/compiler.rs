//! Compiles a [`FilterState`] into one paginated catalog query.

use serde::{Deserialize, Serialize};

use crate::filter::FilterState;
use crate::pagination::PageWindow;

/// Catalog attributes a predicate can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Id,
    Name,
    Description,
    Category,
    Price,
    /// `location` of the joined shop record.
    SellerLocation,
}

impl Field {
    /// Backend column path.
    pub fn column(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Description => "description",
            Field::Category => "category",
            Field::Price => "price",
            Field::SellerLocation => "shops.location",
        }
    }
}

/// A single constraint on catalog rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches when any inner predicate matches.
    AnyOf(Vec<Predicate>),
    /// Case-insensitive substring match.
    ILike { field: Field, needle: String },
    /// Set membership.
    In { field: Field, values: Vec<String> },
    /// `field >= value`.
    Gte { field: Field, value: u64 },
    /// `field <= value`.
    Lte { field: Field, value: u64 },
}

/// Inclusive row bounds of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub start: u64,
    pub end: u64,
}

impl RowRange {
    /// Number of rows the range spans.
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: Field,
    pub descending: bool,
}

impl OrderBy {
    /// Newest first, by identity. Stable while the data set does not change.
    pub const NEWEST_FIRST: OrderBy = OrderBy {
        field: Field::Id,
        descending: true,
    };
}

/// How the total number of matches is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CountMode {
    #[default]
    Exact,
}

/// A compiled catalog query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Substring matched against name OR description.
    pub text: Option<String>,
    /// Any-of category membership.
    pub categories: Option<Vec<String>>,
    pub price_min: u64,
    pub price_max: u64,
    /// Substring matched against the seller's location.
    pub location: Option<String>,
    pub range: RowRange,
    pub order: OrderBy,
    pub count: CountMode,
}

impl QueryRequest {
    /// The request as a flat, ordered list of predicates: text group,
    /// category membership, price lower bound, price upper bound, location.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(text) = &self.text {
            predicates.push(Predicate::AnyOf(vec![
                Predicate::ILike {
                    field: Field::Name,
                    needle: text.clone(),
                },
                Predicate::ILike {
                    field: Field::Description,
                    needle: text.clone(),
                },
            ]));
        }
        if let Some(categories) = &self.categories {
            predicates.push(Predicate::In {
                field: Field::Category,
                values: categories.clone(),
            });
        }
        predicates.push(Predicate::Gte {
            field: Field::Price,
            value: self.price_min,
        });
        predicates.push(Predicate::Lte {
            field: Field::Price,
            value: self.price_max,
        });
        if let Some(location) = &self.location {
            predicates.push(Predicate::ILike {
                field: Field::SellerLocation,
                needle: location.clone(),
            });
        }

        predicates
    }

    /// Whether the request narrows the catalog by text, category or location.
    pub fn is_constrained(&self) -> bool {
        self.text.is_some() || self.categories.is_some() || self.location.is_some()
    }
}

/// Compile a filter state. Pure; every state compiles.
pub fn compile(state: &FilterState, page_size: u32) -> QueryRequest {
    let window = PageWindow::new(state.page(), page_size);
    let range = state.price_range();

    QueryRequest {
        text: non_empty(state.query_text()),
        categories: if state.categories().is_empty() {
            None
        } else {
            Some(state.categories().to_vec())
        },
        price_min: range.min,
        price_max: range.max,
        location: non_empty(state.location()),
        range: window.range(),
        order: OrderBy::NEWEST_FIRST,
        count: CountMode::Exact,
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
