//! Search session: the state machine behind one search page.
//!
//! ```text
//! Idle --(trigger)--> Fetching --(ok)--> Idle
//!                         |
//!                         +--(err)--> Error --(any change)--> Fetching
//! ```
//!
//! The session is synchronous and clock-injected. It decides *when* to
//! fetch and *what* to show; the caller runs the fetch (see
//! [`SearchDriver`] for an async loop) and hands the result back through
//! [`SearchSession::complete`]. Every issued fetch carries a ticket and only
//! the latest ticket may change what is displayed.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::chips::{active_chips, ChipKind, FilterChip};
use crate::codec;
use crate::compiler::{compile, QueryRequest};
use crate::config::SearchConfig;
use crate::debounce::Debouncer;
use crate::error::SearchError;
use crate::filter::{FilterState, PriceRange};
use crate::normalize::{normalize, SearchResultItem};
use crate::pagination::Pagination;
use crate::source::{CatalogSource, QueryPage};
use crate::store::FilterStore;
use crate::url_sync::{UrlSynchronizer, UrlUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Idle,
    Fetching,
    Error,
}

/// UI events the session consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// Keystroke in the search box (debounced).
    TextInput(String),
    /// Enter / search button: flush pending text and search again.
    Submit,
    ToggleCategory(String),
    CommitPrice(PriceRange),
    CommitMinPrice(u64),
    CommitMaxPrice(u64),
    CommitLocation(String),
    NextPage,
    PreviousPage,
    GoToPage(u32),
    RemoveChip(ChipKind),
    ClearFilters,
    /// Back/forward navigation to a URL with this query string.
    Navigate(String),
}

/// Monotonically increasing fetch identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A fetch the caller should run.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub ticket: FetchTicket,
    pub request: QueryRequest,
}

/// What an event asks the caller to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Run this fetch now.
    Fetch(PendingFetch),
    /// Call [`SearchSession::tick`] again at this instant.
    Deferred(Instant),
    /// Nothing to do.
    Skip,
}

impl Trigger {
    pub fn into_fetch(self) -> Option<PendingFetch> {
        match self {
            Trigger::Fetch(pending) => Some(pending),
            _ => None,
        }
    }
}

/// Outcome of handing a response back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response was the latest and is now displayed.
    Applied,
    /// A newer fetch was issued; the response was dropped.
    Discarded,
}

/// Which panel the page should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RenderState {
    /// Nothing searched yet.
    Initial,
    Loading,
    Failed { message: String },
    NoResults,
    Results,
}

/// Everything the search page renders.
#[derive(Debug, Clone, Serialize)]
pub struct SearchView {
    pub status: SearchStatus,
    pub render: RenderState,
    pub items: Vec<SearchResultItem>,
    pub pagination: Pagination,
    pub error: Option<String>,
    pub chips: Vec<FilterChip>,
    pub href: String,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: FetchTicket,
    page: u32,
}

pub struct SearchSession {
    config: SearchConfig,
    store: FilterStore,
    url: UrlSynchronizer,
    debouncer: Debouncer<String>,
    status: SearchStatus,
    items: Vec<SearchResultItem>,
    pagination: Pagination,
    error: Option<String>,
    next_ticket: u64,
    latest: Option<InFlight>,
    search_active: bool,
    url_update: Option<UrlUpdate>,
}

impl SearchSession {
    /// Mount a session on a page loaded with `query` (leading `?` optional).
    pub fn new(config: SearchConfig, query: &str) -> Self {
        let mut url = UrlSynchronizer::new(config.path.clone(), config.history_mode);
        let initial = url.on_mount(query);
        let debouncer = Debouncer::new(config.debounce());
        let pagination = Pagination::new(1, config.page_size, 0);

        Self {
            config,
            store: FilterStore::new(initial),
            url,
            debouncer,
            status: SearchStatus::Idle,
            items: Vec::new(),
            pagination,
            error: None,
            next_ticket: 0,
            latest: None,
            search_active: false,
            url_update: None,
        }
    }

    /// First fetch after mount; skipped when the URL carried no constraints.
    /// Also queues the canonical URL if the mounted one was not.
    pub fn start(&mut self) -> Trigger {
        self.sync_url();
        self.begin_fetch()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The filter store, for subscribers.
    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn state(&self) -> FilterState {
        self.store.get()
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn items(&self) -> &[SearchResultItem] {
        &self.items
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// What the search box should show: pending input, else the committed query.
    pub fn text_draft(&self) -> String {
        match self.debouncer.peek() {
            Some(text) => text.clone(),
            None => self.store.get().query_text().to_string(),
        }
    }

    /// When pending text input becomes due.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// The latest address-bar rewrite not yet taken by the caller.
    pub fn take_url_update(&mut self) -> Option<UrlUpdate> {
        self.url_update.take()
    }

    /// Feed one UI event.
    pub fn handle(&mut self, event: SearchEvent, now: Instant) -> Trigger {
        let changed = match event {
            SearchEvent::TextInput(text) => {
                return Trigger::Deferred(self.debouncer.push(text, now));
            }
            SearchEvent::Submit => {
                if let Some(text) = self.debouncer.flush() {
                    self.store.update(|s| s.set_query_text(&text));
                }
                self.sync_url();
                return self.begin_fetch();
            }
            SearchEvent::Navigate(query) => {
                self.debouncer.cancel();
                let state = self.url.on_navigate(&query);
                let changed = self.store.get() != state;
                self.store.replace(state);
                return if changed {
                    self.begin_fetch()
                } else {
                    Trigger::Skip
                };
            }
            other => self.apply_discrete(other),
        };

        if changed {
            self.sync_url();
            self.begin_fetch()
        } else {
            Trigger::Skip
        }
    }

    /// Release debounced text input whose window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Trigger {
        match self.debouncer.poll(now) {
            Some(text) => {
                let mut changed = false;
                self.store.update(|s| {
                    changed = s.set_query_text(&text);
                    changed
                });
                if changed {
                    self.sync_url();
                    self.begin_fetch()
                } else {
                    Trigger::Skip
                }
            }
            None => match self.debouncer.deadline() {
                Some(deadline) => Trigger::Deferred(deadline),
                None => Trigger::Skip,
            },
        }
    }

    /// Hand back the result of a fetch issued earlier.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<QueryPage, SearchError>,
    ) -> Completion {
        let in_flight = match self.latest {
            Some(latest) if latest.ticket == ticket => latest,
            _ => {
                debug!(ticket = ticket.value(), "discarding stale search response");
                return Completion::Discarded;
            }
        };

        match result {
            Ok(page) => {
                self.items = normalize(&page.rows);
                self.pagination =
                    Pagination::new(in_flight.page, self.config.page_size, page.total_count);
                self.error = None;
                self.status = SearchStatus::Idle;
                info!(
                    ticket = ticket.value(),
                    total = page.total_count,
                    shown = self.items.len(),
                    "search results applied"
                );
            }
            Err(e) => {
                warn!(ticket = ticket.value(), error = %e, "search failed");
                self.items.clear();
                self.pagination = Pagination::new(in_flight.page, self.config.page_size, 0);
                self.error = Some(e.user_message());
                self.status = SearchStatus::Error;
            }
        }
        Completion::Applied
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> SearchView {
        let state = self.store.get();
        let render = match self.status {
            SearchStatus::Fetching => RenderState::Loading,
            SearchStatus::Error => RenderState::Failed {
                message: self.error.clone().unwrap_or_default(),
            },
            SearchStatus::Idle if !self.search_active => RenderState::Initial,
            SearchStatus::Idle if self.items.is_empty() => RenderState::NoResults,
            SearchStatus::Idle => RenderState::Results,
        };

        SearchView {
            status: self.status,
            render,
            items: self.items.clone(),
            pagination: self.pagination,
            error: self.error.clone(),
            chips: active_chips(&state),
            href: codec::to_href(self.url.path(), &state),
            loading: self.status == SearchStatus::Fetching,
        }
    }

    fn apply_discrete(&mut self, event: SearchEvent) -> bool {
        let mut changed = false;
        self.store.update(|s| {
            changed = match event {
                SearchEvent::CommitPrice(range) => s.set_price_range(range),
                SearchEvent::CommitMinPrice(min) => s.set_min_price(min),
                SearchEvent::CommitMaxPrice(max) => s.set_max_price(max),
                SearchEvent::CommitLocation(location) => s.set_location(location),
                SearchEvent::NextPage => s.next_page(),
                SearchEvent::PreviousPage => s.previous_page(),
                SearchEvent::GoToPage(page) => s.set_page(page),
                SearchEvent::RemoveChip(kind) => s.remove_chip(&kind),
                SearchEvent::ClearFilters => s.clear(),
                SearchEvent::ToggleCategory(id) => s.toggle_category(id),
                SearchEvent::TextInput(_) | SearchEvent::Submit | SearchEvent::Navigate(_) => {
                    false
                }
            };
            changed
        });
        changed
    }

    fn sync_url(&mut self) {
        if let Some(update) = self.url.commit(&self.store.get()) {
            self.url_update = Some(update);
        }
    }

    fn begin_fetch(&mut self) -> Trigger {
        let state = self.store.get();
        if !state.has_constraints() && !self.search_active {
            debug!("no constraints and no active search; not fetching");
            return Trigger::Skip;
        }

        self.search_active = true;
        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        self.latest = Some(InFlight {
            ticket,
            page: state.page(),
        });
        self.status = SearchStatus::Fetching;

        let request = compile(&state, self.config.page_size);
        info!(ticket = ticket.value(), page = state.page(), "search fetch issued");
        Trigger::Fetch(PendingFetch { ticket, request })
    }
}

/// Async loop around a [`SearchSession`] and a [`CatalogSource`].
///
/// Runs one fetch at a time; overlapping fetches are a caller concern and
/// are reconciled by tickets in [`SearchSession::complete`].
pub struct SearchDriver<S> {
    session: SearchSession,
    source: S,
}

impl<S: CatalogSource> SearchDriver<S> {
    pub fn new(session: SearchSession, source: S) -> Self {
        Self { session, source }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SearchSession {
        &mut self.session
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run the mount-time fetch, if any.
    pub async fn start(&mut self) -> Option<Completion> {
        let trigger = self.session.start();
        self.run(trigger).await
    }

    /// Handle an event and run whatever fetch it triggers.
    pub async fn dispatch(&mut self, event: SearchEvent) -> Option<Completion> {
        let trigger = self.session.handle(event, Instant::now());
        self.run(trigger).await
    }

    /// Wait out the debounce window and run the resulting fetch.
    pub async fn settle(&mut self) -> Option<Completion> {
        let mut completion = None;
        while let Some(deadline) = self.session.debounce_deadline() {
            tokio::time::sleep_until(deadline).await;
            let trigger = self.session.tick(Instant::now());
            if let Some(done) = self.run(trigger).await {
                completion = Some(done);
            }
        }
        completion
    }

    /// Execute a fetch and hand its result to the session.
    pub async fn execute(&mut self, pending: PendingFetch) -> Completion {
        let result = self.source.query(&pending.request).await;
        self.session.complete(pending.ticket, result)
    }

    async fn run(&mut self, trigger: Trigger) -> Option<Completion> {
        match trigger {
            Trigger::Fetch(pending) => Some(self.execute(pending).await),
            Trigger::Deferred(_) | Trigger::Skip => None,
        }
    }

    pub fn into_parts(self) -> (SearchSession, S) {
        (self.session, self.source)
    }
}
