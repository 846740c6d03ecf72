//! Shareable-link codec for [`FilterState`].
//!
//! | param | meaning | presence |
//! |---|---|---|
//! | `q` | free text | omitted when empty |
//! | `categories` | comma-joined category ids | omitted when empty |
//! | `minPrice`, `maxPrice` | integers | both omitted when the range is the default |
//! | `location` | free text | omitted when empty |
//! | `page` | 1-based page | omitted on page 1 |
//!
//! Decoding never fails: anything that does not parse falls back to the
//! facet's default.

use tracing::debug;
use url::form_urlencoded;

use crate::filter::{FilterState, PriceRange, DEFAULT_PRICE_CEILING};

pub const PARAM_QUERY: &str = "q";
pub const PARAM_CATEGORIES: &str = "categories";
pub const PARAM_MIN_PRICE: &str = "minPrice";
pub const PARAM_MAX_PRICE: &str = "maxPrice";
pub const PARAM_LOCATION: &str = "location";
pub const PARAM_PAGE: &str = "page";

/// Encode a state as a query string (no leading `?`). Empty for the default state.
pub fn to_query_string(state: &FilterState) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();

    if !state.query_text().is_empty() {
        pairs.push((PARAM_QUERY, encode(state.query_text())));
    }
    if !state.categories().is_empty() {
        let joined = state
            .categories()
            .iter()
            .map(|c| encode(c))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push((PARAM_CATEGORIES, joined));
    }
    let range = state.price_range();
    if !range.is_default() {
        pairs.push((PARAM_MIN_PRICE, range.min.to_string()));
        pairs.push((PARAM_MAX_PRICE, range.max.to_string()));
    }
    if !state.location().is_empty() {
        pairs.push((PARAM_LOCATION, encode(state.location())));
    }
    if state.page() > 1 {
        pairs.push((PARAM_PAGE, state.page().to_string()));
    }

    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a query string (leading `?` optional) into a state.
pub fn from_query_string(qs: &str) -> FilterState {
    let qs = qs.strip_prefix('?').unwrap_or(qs);

    let mut state = FilterState::new();
    let mut min_price = None;
    let mut max_price = None;
    let mut page = 1;

    for pair in qs.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));

        match decode(raw_key).as_str() {
            PARAM_QUERY => {
                state.set_query_text(decode(raw_value));
            }
            PARAM_CATEGORIES => {
                for id in raw_value.split(',').map(decode) {
                    state = state.with_category(id);
                }
            }
            PARAM_MIN_PRICE => min_price = parse_price(PARAM_MIN_PRICE, &decode(raw_value)),
            PARAM_MAX_PRICE => max_price = parse_price(PARAM_MAX_PRICE, &decode(raw_value)),
            PARAM_LOCATION => {
                state.set_location(decode(raw_value));
            }
            PARAM_PAGE => {
                page = match decode(raw_value).trim().parse::<u32>() {
                    Ok(p) if p >= 1 => p,
                    _ => {
                        debug!(value = raw_value, "discarding malformed page parameter");
                        1
                    }
                }
            }
            other => debug!(param = other, "ignoring unknown query parameter"),
        }
    }

    let range = match (min_price, max_price) {
        (None, None) => PriceRange::FULL,
        (Some(min), None) => PriceRange::new(min, DEFAULT_PRICE_CEILING),
        (None, Some(max)) => PriceRange::new(0, max),
        (Some(min), Some(max)) => PriceRange::new(min, max),
    };

    state.with_price_range(range).with_page(page)
}

/// Path plus query string, or the bare path when nothing is constrained.
pub fn to_href(path: &str, state: &FilterState) -> String {
    let qs = to_query_string(state);
    if qs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, qs)
    }
}

impl FilterState {
    /// See [`to_query_string`].
    pub fn to_query_string(&self) -> String {
        to_query_string(self)
    }

    /// See [`from_query_string`].
    pub fn from_query_string(qs: &str) -> Self {
        from_query_string(qs)
    }
}

fn encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn decode(raw: &str) -> String {
    // form_urlencoded::parse splits on '='; escape it so the whole
    // component decodes as a single key.
    let escaped = raw.replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}

fn parse_price(param: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(param, value, "discarding malformed price parameter");
            None
        }
    }
}
