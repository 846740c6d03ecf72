//! CLI command implementations.

pub mod config;
pub mod link;
pub mod search;

use clap::{Args, Subcommand};
use market_search::codec;
use market_search::filter::{FilterState, PriceRange};

/// Facet overrides shared by `search` and `link encode`.
#[derive(Args, Debug, Default, Clone)]
pub struct FacetArgs {
    /// Start from this query string (e.g. copied from a shared link).
    #[arg(long, value_name = "QUERY")]
    pub url: Option<String>,

    /// Free-text query.
    #[arg(short, long)]
    pub q: Option<String>,

    /// Category to include (repeatable).
    #[arg(short = 'C', long = "category", value_name = "ID")]
    pub categories: Vec<String>,

    /// Lower price bound.
    #[arg(long)]
    pub min_price: Option<u64>,

    /// Upper price bound.
    #[arg(long)]
    pub max_price: Option<u64>,

    /// Seller location substring.
    #[arg(short, long)]
    pub location: Option<String>,

    /// Results page (1-indexed).
    #[arg(short, long)]
    pub page: Option<u32>,
}

impl FacetArgs {
    /// The filter state these arguments describe. Flags override `--url`.
    pub fn to_state(&self) -> FilterState {
        let mut state = self
            .url
            .as_deref()
            .map(query_part)
            .map(codec::from_query_string)
            .unwrap_or_default();

        if let Some(q) = &self.q {
            state.set_query_text(q);
        }
        for category in &self.categories {
            state = state.with_category(category);
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let current = state.price_range();
            state.set_price_range(PriceRange::new(
                self.min_price.unwrap_or(current.min),
                self.max_price.unwrap_or(current.max),
            ));
        }
        if let Some(location) = &self.location {
            state.set_location(location);
        }
        if let Some(page) = self.page {
            state.set_page(page);
        }
        state
    }
}

/// Accept a full link as well as a bare query string.
fn query_part(input: &str) -> &str {
    match input.split_once('?') {
        Some((_, query)) => query,
        None => input,
    }
}

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub facets: FacetArgs,

    /// Search a JSON array of product rows instead of the backend.
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<String>,
}

/// Arguments for the link command.
#[derive(Args)]
pub struct LinkArgs {
    #[command(subcommand)]
    pub command: LinkCommand,
}

#[derive(Subcommand)]
pub enum LinkCommand {
    /// Print the canonical link for a set of filters.
    Encode(FacetArgs),
    /// Parse a link or query string into filters.
    Decode {
        /// Query string or full link.
        query: String,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_url() {
        let args = FacetArgs {
            url: Some("https://shop.example/search?q=lamp&location=Abuja&page=3".into()),
            q: Some("desk lamp".into()),
            categories: vec!["Home".into()],
            ..Default::default()
        };
        let state = args.to_state();
        assert_eq!(state.query_text(), "desk lamp");
        assert_eq!(state.location(), "Abuja");
        assert_eq!(state.categories(), ["Home".to_string()]);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_single_price_bound_keeps_other() {
        let args = FacetArgs {
            url: Some("?minPrice=5000&maxPrice=90000".into()),
            max_price: Some(40_000),
            ..Default::default()
        };
        assert_eq!(args.to_state().price_range(), PriceRange::new(5_000, 40_000));
    }

    #[test]
    fn test_explicit_page_applies_last() {
        let args = FacetArgs {
            q: Some("x".into()),
            page: Some(2),
            ..Default::default()
        };
        assert_eq!(args.to_state().page(), 2);
    }
}
