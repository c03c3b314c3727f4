//! From fetched candidates to the rendered result list.
//!
//! Order of operations: self-exclusion, then the composite filter, then the
//! sort, then the bookable flag. Each step only ever narrows or reorders
//! what the previous step produced.

use serde::Serialize;
use tracing::debug;

use crate::domain::Ride;
use crate::session::Session;

use super::filter::{FilterState, apply_filters};
use super::sort::sort_rides;

/// One ride as shown in the result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub ride: Ride,
    /// Seats remain; when false the card is disabled and not linked.
    pub bookable: bool,
}

impl Listing {
    pub fn new(ride: Ride) -> Self {
        let bookable = ride.is_bookable();
        Self { ride, bookable }
    }
}

/// What the results area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsState {
    /// A fetch is in flight.
    Loading,
    /// The fetch failed; nothing is listed.
    Failed { message: String },
    /// The fetch succeeded but nothing matches.
    Empty,
    Listings(Vec<Listing>),
}

impl ResultsState {
    /// The listings, empty for every non-list state.
    pub fn listings(&self) -> &[Listing] {
        match self {
            ResultsState::Listings(listings) => listings,
            _ => &[],
        }
    }

    /// Short machine-readable name, used in JSON responses.
    pub fn kind(&self) -> ResultsKind {
        match self {
            ResultsState::Loading => ResultsKind::Loading,
            ResultsState::Failed { .. } => ResultsKind::Failed,
            ResultsState::Empty => ResultsKind::Empty,
            ResultsState::Listings(_) => ResultsKind::Listings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsKind {
    Loading,
    Failed,
    Empty,
    Listings,
}

/// Drop the signed-in user's own rides from the candidate list.
///
/// Anonymous viewers get the list unchanged.
pub fn prepare_candidates(rides: Vec<Ride>, session: &Session) -> Vec<Ride> {
    let Some(user) = session.user_id() else {
        return rides;
    };

    let before = rides.len();
    let rides: Vec<Ride> = rides
        .into_iter()
        .filter(|r| !r.is_created_by(user))
        .collect();

    if rides.len() < before {
        debug!(
            user = %user,
            excluded = before - rides.len(),
            "Excluded own rides from search results"
        );
    }
    rides
}

/// Filter, sort and flag the candidates.
pub fn project(candidates: &[Ride], filters: &FilterState) -> Vec<Listing> {
    let mut visible = apply_filters(candidates, filters);
    sort_rides(&mut visible, filters.sort);
    visible.into_iter().cloned().map(Listing::new).collect()
}

/// Run the whole pipeline over a settled fetch.
///
/// A failed fetch is treated as an empty candidate list: nothing is listed
/// and the error message is surfaced instead.
pub fn results_for(
    fetched: Result<&[Ride], &str>,
    filters: &FilterState,
    session: &Session,
) -> ResultsState {
    match fetched {
        Err(message) => ResultsState::Failed {
            message: message.to_string(),
        },
        Ok(rides) => {
            let candidates = prepare_candidates(rides.to_vec(), session);
            let listings = project(&candidates, filters);
            if listings.is_empty() {
                ResultsState::Empty
            } else {
                ResultsState::Listings(listings)
            }
        }
    }
}
