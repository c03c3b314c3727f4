//! Fetch lifecycle of the search page.
//!
//! A [`SearchView`] owns the full candidate list for the current query.
//! Each fetch is stamped with a generation number when it starts; only the
//! most recent fetch may commit its result, so a slow response for an older
//! query can never overwrite a newer one.
//!
//! Stored candidates are only reused for filter and sort changes, and only
//! while they are younger than a caller-supplied age.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache as MokaCache;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::Ride;
use crate::session::Session;

use super::filter::FilterState;
use super::pipeline::{ResultsState, results_for};
use super::query::SearchQuery;

/// Proof that a fetch was started; hand it back to [`SearchView::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    query: SearchQuery,
}

impl FetchTicket {
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }
}

#[derive(Debug, Clone, Default)]
enum Candidates {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<Ride>),
    Failed(String),
}

/// Search page state for one browser.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    query: Option<SearchQuery>,
    generation: u64,
    candidates: Candidates,
    /// When the held candidates were committed.
    fetched_at: Option<Instant>,
}

impl SearchView {
    pub fn new() -> Self {
        Self::default()
    }

    /// A view that already holds a settled result for `query`.
    pub fn settled(query: SearchQuery, result: Result<Vec<Ride>, String>) -> Self {
        let mut view = Self::new();
        let ticket = view.begin(query);
        view.commit(ticket, result);
        view
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    /// Start a fetch for `query`. Any fetch still in flight is superseded.
    pub fn begin(&mut self, query: SearchQuery) -> FetchTicket {
        self.generation += 1;
        self.query = Some(query.clone());
        self.candidates = Candidates::Loading;
        self.fetched_at = None;
        FetchTicket {
            generation: self.generation,
            query,
        }
    }

    /// Store a fetch result if `ticket` is still the latest fetch.
    ///
    /// Returns whether the result was applied.
    pub fn commit(&mut self, ticket: FetchTicket, result: Result<Vec<Ride>, String>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                query = ?ticket.query,
                ticket = ticket.generation,
                latest = self.generation,
                "Dropping stale search result"
            );
            return false;
        }

        self.candidates = match result {
            Ok(rides) => Candidates::Loaded(rides),
            Err(message) => Candidates::Failed(message),
        };
        self.fetched_at = Some(Instant::now());
        true
    }

    /// Whether a successful result for `query`, fetched less than
    /// `max_age` ago, is already held.
    pub fn has_fresh_results_for(&self, query: &SearchQuery, max_age: Duration) -> bool {
        self.query.as_ref() == Some(query)
            && matches!(self.candidates, Candidates::Loaded(_))
            && self.fetched_at.is_some_and(|at| at.elapsed() < max_age)
    }

    /// Number of candidates fetched, before self-exclusion and filtering.
    pub fn candidate_count(&self) -> usize {
        match &self.candidates {
            Candidates::Loaded(rides) => rides.len(),
            _ => 0,
        }
    }

    /// Recompute the visible results from the full candidate list.
    pub fn render(&self, filters: &FilterState, session: &Session) -> ResultsState {
        match &self.candidates {
            Candidates::Idle | Candidates::Loading => ResultsState::Loading,
            Candidates::Failed(message) => results_for(Err(message.as_str()), filters, session),
            Candidates::Loaded(rides) => results_for(Ok(rides.as_slice()), filters, session),
        }
    }
}

/// One [`SearchView`] per browser session.
#[derive(Clone)]
pub struct SearchViews {
    views: MokaCache<String, Arc<Mutex<SearchView>>>,
}

impl SearchViews {
    pub fn new(idle: Duration, max_capacity: u64) -> Self {
        let views = MokaCache::builder()
            .time_to_idle(idle)
            .max_capacity(max_capacity)
            .build();
        Self { views }
    }

    /// The view for `key`, created empty on first use.
    pub async fn get(&self, key: &str) -> Arc<Mutex<SearchView>> {
        self.views
            .get_with(key.to_string(), async { Arc::new(Mutex::new(SearchView::new())) })
            .await
    }

    pub async fn remove(&self, key: &str) {
        self.views.invalidate(key).await;
    }
}

impl Default for SearchViews {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60), 10_000)
    }
}
