//! Filter state: what the shopper is currently asking the catalog for.

use serde::{Deserialize, Serialize};

/// Platform-wide price ceiling, in currency minor units.
pub const DEFAULT_PRICE_CEILING: u64 = 10_000_000;

/// Smallest gap kept between the two price bounds on single-bound edits.
pub const PRICE_STEP: u64 = 1_000;

/// Inclusive price bounds. Always satisfies `min <= max <= DEFAULT_PRICE_CEILING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

impl PriceRange {
    /// The unconstrained range.
    pub const FULL: PriceRange = PriceRange {
        min: 0,
        max: DEFAULT_PRICE_CEILING,
    };

    /// Build a range from two bounds. Inverted bounds are swapped and both
    /// are capped at the platform ceiling.
    pub fn new(a: u64, b: u64) -> Self {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        Self {
            min: min.min(DEFAULT_PRICE_CEILING),
            max: max.min(DEFAULT_PRICE_CEILING),
        }
    }

    /// Whether this is the platform default.
    pub fn is_default(&self) -> bool {
        *self == Self::FULL
    }

    /// Move the lower bound, never closer than `PRICE_STEP` to `max`.
    pub fn with_min(self, min: u64) -> Self {
        let limit = self.max.saturating_sub(PRICE_STEP);
        Self {
            min: min.min(limit),
            max: self.max,
        }
    }

    /// Move the upper bound, never closer than `PRICE_STEP` to `min`.
    pub fn with_max(self, max: u64) -> Self {
        let floor = self.min.saturating_add(PRICE_STEP).min(DEFAULT_PRICE_CEILING);
        Self {
            min: self.min,
            max: max.clamp(floor, DEFAULT_PRICE_CEILING),
        }
    }

    /// Whether a price falls inside the bounds.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min as f64 && price <= self.max as f64
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// A shallow partial update to a [`FilterState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub query_text: Option<String>,
    pub categories: Option<Vec<String>>,
    pub price_range: Option<PriceRange>,
    pub location: Option<String>,
    pub page: Option<u32>,
}

impl FilterPatch {
    pub fn query_text(text: impl Into<String>) -> Self {
        Self {
            query_text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn categories<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: Some(ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn price_range(range: PriceRange) -> Self {
        Self {
            price_range: Some(range),
            ..Default::default()
        }
    }

    pub fn location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Default::default()
        }
    }

    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    /// True when the patch touches at least one facet other than the page.
    pub fn touches_facets(&self) -> bool {
        self.query_text.is_some()
            || self.categories.is_some()
            || self.price_range.is_some()
            || self.location.is_some()
    }
}

/// The canonical, serializable search request of one UI session.
///
/// Fields are private so every mutation goes through the methods below,
/// which keep the price invariant and the page-reset rule.
///
/// Only `Serialize` is derived; a state is rebuilt from a link with
/// [`FilterState::from_query_string`], which normalizes every facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    query_text: String,
    categories: Vec<String>,
    price_range: PriceRange,
    location: String,
    page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query_text: String::new(),
            categories: Vec::new(),
            price_range: PriceRange::FULL,
            location: String::new(),
            page: 1,
        }
    }
}

impl FilterState {
    /// Create an unconstrained state on page 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text query.
    pub fn with_query(mut self, text: impl AsRef<str>) -> Self {
        self.set_query_text(text);
        self
    }

    /// Select a category (no-op if already selected).
    pub fn with_category(mut self, id: impl AsRef<str>) -> Self {
        let id = id.as_ref().trim();
        if !id.is_empty() && !self.has_category(id) {
            let mut next = self.categories.clone();
            next.push(id.to_string());
            self.apply(FilterPatch::categories(next));
        }
        self
    }

    /// Set the price range.
    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.set_price_range(range);
        self
    }

    /// Set the location substring.
    pub fn with_location(mut self, location: impl AsRef<str>) -> Self {
        self.set_location(location);
        self
    }

    /// Jump to a page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.set_page(page);
        self
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn price_range(&self) -> PriceRange {
        self.price_range
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_category(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c == id)
    }

    /// Shallow-merge a patch. Any facet in the patch resets the page to 1;
    /// a page-only patch moves the page. Returns whether the state changed.
    pub fn apply(&mut self, patch: FilterPatch) -> bool {
        let before = self.clone();
        let touches_facets = patch.touches_facets();

        if let Some(text) = patch.query_text {
            self.query_text = text.trim().to_string();
        }
        if let Some(ids) = patch.categories {
            self.categories.clear();
            for id in ids {
                let id = id.trim();
                if !id.is_empty() && !self.has_category(id) {
                    self.categories.push(id.to_string());
                }
            }
        }
        if let Some(range) = patch.price_range {
            self.price_range = PriceRange::new(range.min, range.max);
        }
        if let Some(location) = patch.location {
            self.location = location.trim().to_string();
        }

        if touches_facets {
            self.page = 1;
        } else if let Some(page) = patch.page {
            self.page = page.max(1);
        }

        *self != before
    }

    pub fn set_query_text(&mut self, text: impl AsRef<str>) -> bool {
        self.apply(FilterPatch::query_text(text.as_ref()))
    }

    pub fn set_location(&mut self, location: impl AsRef<str>) -> bool {
        self.apply(FilterPatch::location(location.as_ref()))
    }

    /// Toggle a category: selected ids are removed, others appended.
    pub fn toggle_category(&mut self, id: impl AsRef<str>) -> bool {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return false;
        }
        let mut next = self.categories.clone();
        match next.iter().position(|c| c == id) {
            Some(idx) => {
                next.remove(idx);
            }
            None => next.push(id.to_string()),
        }
        self.apply(FilterPatch::categories(next))
    }

    /// Commit a whole range; inverted bounds are swapped.
    pub fn set_price_range(&mut self, range: PriceRange) -> bool {
        self.apply(FilterPatch::price_range(range))
    }

    /// Move only the lower price bound (clamped below `max - PRICE_STEP`).
    pub fn set_min_price(&mut self, min: u64) -> bool {
        let range = self.price_range.with_min(min);
        self.apply(FilterPatch::price_range(range))
    }

    /// Move only the upper price bound (clamped above `min + PRICE_STEP`).
    pub fn set_max_price(&mut self, max: u64) -> bool {
        let range = self.price_range.with_max(max);
        self.apply(FilterPatch::price_range(range))
    }

    /// Move to a page. Page numbers below 1 are treated as 1.
    pub fn set_page(&mut self, page: u32) -> bool {
        self.apply(FilterPatch::page(page))
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    /// Reset every facet to its default.
    pub fn clear(&mut self) -> bool {
        let before = std::mem::take(self);
        *self != before
    }

    /// Whether any of text, categories or location constrains the search.
    pub fn has_constraints(&self) -> bool {
        !self.query_text.is_empty() || !self.categories.is_empty() || !self.location.is_empty()
    }

    /// Whether every facet, page included, is at its default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
