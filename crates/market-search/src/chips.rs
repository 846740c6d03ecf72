//! Active-filter chips shown above the result grid.

use serde::{Deserialize, Serialize};

use crate::filter::{FilterPatch, FilterState, PriceRange};

/// Which facet a chip represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ChipKind {
    Query,
    Category(String),
    Price,
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterChip {
    pub kind: ChipKind,
    pub label: String,
}

/// One chip per non-default facet, in URL parameter order.
pub fn active_chips(state: &FilterState) -> Vec<FilterChip> {
    let mut chips = Vec::new();

    if !state.query_text().is_empty() {
        chips.push(FilterChip {
            kind: ChipKind::Query,
            label: format!("\"{}\"", state.query_text()),
        });
    }
    for category in state.categories() {
        chips.push(FilterChip {
            kind: ChipKind::Category(category.clone()),
            label: category.clone(),
        });
    }
    let range = state.price_range();
    if !range.is_default() {
        chips.push(FilterChip {
            kind: ChipKind::Price,
            label: format!(
                "{} - {}",
                group_thousands(range.min),
                group_thousands(range.max)
            ),
        });
    }
    if !state.location().is_empty() {
        chips.push(FilterChip {
            kind: ChipKind::Location,
            label: state.location().to_string(),
        });
    }

    chips
}

impl FilterState {
    /// Reset the facet a chip stands for. Returns whether the state changed.
    pub fn remove_chip(&mut self, kind: &ChipKind) -> bool {
        match kind {
            ChipKind::Query => self.apply(FilterPatch::query_text("")),
            ChipKind::Category(id) => {
                if self.has_category(id) {
                    self.toggle_category(id)
                } else {
                    false
                }
            }
            ChipKind::Price => self.apply(FilterPatch::price_range(PriceRange::FULL)),
            ChipKind::Location => self.apply(FilterPatch::location("")),
        }
    }
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_chips_for_default_state() {
        assert!(active_chips(&FilterState::new()).is_empty());
    }

    #[test]
    fn test_chip_order_and_labels() {
        let state = FilterState::new()
            .with_query("shoe")
            .with_category("Fashion")
            .with_category("Sports")
            .with_price_range(PriceRange::new(500_000, 10_000_000))
            .with_location("Lagos");
        let chips = active_chips(&state);
        let labels: Vec<&str> = chips.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["\"shoe\"", "Fashion", "Sports", "500,000 - 10,000,000", "Lagos"]
        );
    }

    #[test]
    fn test_remove_chip_resets_only_that_facet() {
        let mut state = FilterState::new()
            .with_query("shoe")
            .with_category("Fashion")
            .with_location("Lagos")
            .with_page(3);

        assert!(state.remove_chip(&ChipKind::Category("Fashion".into())));
        assert!(state.categories().is_empty());
        assert_eq!(state.query_text(), "shoe");
        assert_eq!(state.page(), 1);

        assert!(!state.remove_chip(&ChipKind::Category("Fashion".into())));
        assert!(state.remove_chip(&ChipKind::Location));
        assert_eq!(state.location(), "");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(10_000_000), "10,000,000");
    }
}
