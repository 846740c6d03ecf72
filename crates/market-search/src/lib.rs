//! Product search and filtering for shift-market.
//!
//! This crate holds everything between the search page and the catalog
//! backend, independent of any UI toolkit or transport:
//!
//! - **Filters**: [`FilterState`], its URL codec and the shared [`FilterStore`]
//! - **Queries**: compiling filters into a backend-neutral [`QueryRequest`]
//! - **Results**: normalizing raw rows and computing [`Pagination`]
//! - **Session**: debouncing, URL sync and last-write-wins result handling
//!
//! # Example
//!
//! ```rust,ignore
//! use market_search::prelude::*;
//!
//! let catalog = MemoryCatalog::from_json(FIXTURE)?;
//! let session = SearchSession::new(SearchConfig::default(), "?q=shoe");
//! let mut driver = SearchDriver::new(session, catalog);
//!
//! driver.start().await;
//! driver.dispatch(SearchEvent::ToggleCategory("Fashion".into())).await;
//!
//! let view = driver.session().view();
//! println!("{} results, page {}", view.pagination.total, view.pagination.page);
//! ```

pub mod error;
pub mod ids;

pub mod chips;
pub mod codec;
pub mod compiler;
pub mod config;
pub mod debounce;
pub mod filter;
pub mod memory;
pub mod normalize;
pub mod pagination;
pub mod session;
pub mod source;
pub mod store;
pub mod url_sync;

pub use error::SearchError;
pub use ids::*;

pub use compiler::{compile, QueryRequest};
pub use filter::{FilterPatch, FilterState, PriceRange};
pub use pagination::Pagination;
pub use source::{CatalogSource, QueryPage};
pub use store::FilterStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::SearchError;
    pub use crate::ids::*;

    // Filters
    pub use crate::chips::{active_chips, ChipKind, FilterChip};
    pub use crate::codec::{from_query_string, to_href, to_query_string};
    pub use crate::filter::{FilterPatch, FilterState, PriceRange};
    pub use crate::store::FilterStore;

    // Queries and results
    pub use crate::compiler::{compile, CountMode, Field, OrderBy, Predicate, QueryRequest, RowRange};
    pub use crate::normalize::{normalize, RawRow, SearchResultItem};
    pub use crate::pagination::{PageWindow, Pagination, PAGE_SIZE};
    pub use crate::source::{CatalogSource, QueryPage};
    pub use crate::memory::MemoryCatalog;

    // Session
    pub use crate::config::SearchConfig;
    pub use crate::debounce::Debouncer;
    pub use crate::session::{
        Completion, FetchTicket, PendingFetch, RenderState, SearchDriver, SearchEvent,
        SearchSession, SearchStatus, SearchView, Trigger,
    };
    pub use crate::url_sync::{HistoryMode, UrlSynchronizer, UrlUpdate};
}
