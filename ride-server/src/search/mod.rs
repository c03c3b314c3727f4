//! Ride search: query string, filters, sorting and the result pipeline.
//!
//! Candidates are fetched once per query. Every filter or sort change is
//! recomputed from that full list:
//!
//! 1. self-exclusion drops the viewer's own rides,
//! 2. the composite filter keeps rides passing every active predicate,
//! 3. the sort orders what is left (stable),
//! 4. each listing is flagged bookable iff seats remain.

mod filter;
mod pipeline;
mod query;
mod sort;
mod view;

pub use filter::{FilterState, apply_filters};
pub use pipeline::{Listing, ResultsKind, ResultsState, prepare_candidates, project, results_for};
pub use query::{MAX_SEATS, QueryError, SearchQuery};
pub use sort::{SortOption, sort_rides};
pub use view::{FetchTicket, SearchView, SearchViews};
