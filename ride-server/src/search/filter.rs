//! Filter state and the composite filter.
//!
//! The filter is a pure function of the full candidate list and the current
//! [`FilterState`]. It is always recomputed from the complete list, so
//! switching a toggle off brings back every ride that no longer fails an
//! active predicate.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{Amenity, Ride, TimeBucket};

use super::sort::SortOption;

/// Prefix of the departure-time toggle keys, e.g. `dep_before_eight`.
const BUCKET_PREFIX: &str = "dep_";

/// Whether a checkbox value means "on".
fn is_on(value: &str) -> bool {
    matches!(value.trim(), "on" | "true" | "1")
}

/// Sidebar state: sort option, departure-time toggles and amenity toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub sort: Option<SortOption>,
    buckets: BTreeSet<TimeBucket>,
    amenities: BTreeSet<Amenity>,
}

impl Default for FilterState {
    /// State on first visit: earliest departure first, no toggles.
    fn default() -> Self {
        Self {
            sort: Some(SortOption::EarliestDeparture),
            buckets: BTreeSet::new(),
            amenities: BTreeSet::new(),
        }
    }
}

impl FilterState {
    /// No sort and no toggles: the state after "Clear filters".
    pub fn cleared() -> Self {
        Self {
            sort: None,
            buckets: BTreeSet::new(),
            amenities: BTreeSet::new(),
        }
    }

    /// Read the sidebar state from query parameters.
    ///
    /// `sort=earliest|price` picks the order, `dep_{bucket}` toggles a
    /// departure bucket, and an amenity's wire key toggles that amenity.
    /// Malformed values impose no constraint and unknown keys are ignored.
    ///
    /// With no filter keys at all the default state applies; a form
    /// submitted with every toggle off still carries `sort`, so an explicit
    /// empty `sort` means "no sort".
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let Some(sort) = params.get("sort") else {
            let mut state = Self::default();
            state.read_toggles(params);
            return state;
        };

        let mut state = Self::cleared();
        state.sort = SortOption::parse(sort.trim());
        state.read_toggles(params);
        state
    }

    fn read_toggles(&mut self, params: &HashMap<String, String>) {
        for (key, value) in params {
            if !is_on(value) {
                continue;
            }
            if let Some(bucket) = key.strip_prefix(BUCKET_PREFIX).and_then(TimeBucket::parse) {
                self.buckets.insert(bucket);
            } else if let Some(amenity) = Amenity::parse(key) {
                self.amenities.insert(amenity);
            }
        }
    }

    /// The active state as query parameters, in a stable order.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(
            "sort".to_string(),
            self.sort.map(|s| s.key()).unwrap_or("").to_string(),
        )];
        params.extend(
            self.buckets
                .iter()
                .map(|b| (format!("{BUCKET_PREFIX}{}", b.key()), "on".to_string())),
        );
        params.extend(
            self.amenities
                .iter()
                .map(|a| (a.key().to_string(), "on".to_string())),
        );
        params
    }

    pub fn set_bucket(&mut self, bucket: TimeBucket, on: bool) {
        if on {
            self.buckets.insert(bucket);
        } else {
            self.buckets.remove(&bucket);
        }
    }

    pub fn set_amenity(&mut self, amenity: Amenity, on: bool) {
        if on {
            self.amenities.insert(amenity);
        } else {
            self.amenities.remove(&amenity);
        }
    }

    pub fn has_bucket(&self, bucket: TimeBucket) -> bool {
        self.buckets.contains(&bucket)
    }

    pub fn has_amenity(&self, amenity: Amenity) -> bool {
        self.amenities.contains(&amenity)
    }

    /// Whether any predicate is active. Sorting is not a predicate.
    pub fn is_filtering(&self) -> bool {
        !self.buckets.is_empty() || !self.amenities.is_empty()
    }

    /// Whether a ride passes every active predicate.
    ///
    /// Departure buckets are OR'd together; amenities and the bucket family
    /// are AND'd.
    pub fn matches(&self, ride: &Ride) -> bool {
        let time_ok = self.buckets.is_empty()
            || self.buckets.iter().any(|b| b.contains(&ride.start_time));

        time_ok && self.amenities.iter().all(|a| ride.amenities.has(*a))
    }
}

/// Keep the candidates that pass every active predicate, in their original
/// order.
pub fn apply_filters<'a>(candidates: &'a [Ride], filters: &FilterState) -> Vec<&'a Ride> {
    candidates.iter().filter(|r| filters.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::ride_at;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(rides: &[&Ride]) -> Vec<String> {
        rides.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn default_sorts_by_earliest() {
        let state = FilterState::default();
        assert_eq!(state.sort, Some(SortOption::EarliestDeparture));
        assert!(!state.is_filtering());

        assert_eq!(FilterState::from_params(&HashMap::new()), state);
    }

    #[test]
    fn parse_params() {
        let state = FilterState::from_params(&params(&[
            ("sort", "price"),
            ("dep_before_eight", "on"),
            ("dep_after_six", "true"),
            ("smokingAllowed", "1"),
            ("petsAllowed", "off"),
            ("from", "Tunis"),
        ]));

        assert_eq!(state.sort, Some(SortOption::LowestPrice));
        assert!(state.has_bucket(TimeBucket::BeforeEight));
        assert!(state.has_bucket(TimeBucket::AfterSix));
        assert!(!state.has_bucket(TimeBucket::NoonToSix));
        assert!(state.has_amenity(Amenity::SmokingAllowed));
        assert!(!state.has_amenity(Amenity::PetsAllowed));
    }

    #[test]
    fn malformed_values_impose_no_constraint() {
        let state = FilterState::from_params(&params(&[
            ("sort", "cheapest"),
            ("dep_midnight", "on"),
            ("jacuzzi", "on"),
            ("airConditioning", "yes please"),
        ]));

        assert_eq!(state, FilterState::cleared());
    }

    #[test]
    fn params_roundtrip() {
        let mut state = FilterState::cleared();
        state.sort = Some(SortOption::LowestPrice);
        state.set_bucket(TimeBucket::EightToNoon, true);
        state.set_amenity(Amenity::HeavyLuggage, true);

        let map: HashMap<String, String> = state.to_params().into_iter().collect();
        assert_eq!(FilterState::from_params(&map), state);

        let cleared: HashMap<String, String> =
            FilterState::cleared().to_params().into_iter().collect();
        assert_eq!(FilterState::from_params(&cleared), FilterState::cleared());
    }

    #[test]
    fn smoking_filter_keeps_only_smoking_ride() {
        let mut smoking = ride_at("smoking", 9, 0, 10.0, 2);
        smoking.amenities = smoking.amenities.with(Amenity::SmokingAllowed);
        let plain = ride_at("plain", 10, 0, 10.0, 2);
        let pets = {
            let mut r = ride_at("pets", 11, 0, 10.0, 2);
            r.amenities = r.amenities.with(Amenity::PetsAllowed);
            r
        };
        let candidates = vec![plain, smoking, pets];

        let mut state = FilterState::cleared();
        state.set_amenity(Amenity::SmokingAllowed, true);

        assert_eq!(ids(&apply_filters(&candidates, &state)), ["smoking"]);
    }

    #[test]
    fn before_eight_bucket() {
        let early = ride_at("early", 7, 30, 10.0, 2);
        let late = ride_at("late", 9, 0, 10.0, 2);
        let candidates = vec![early, late];

        let mut state = FilterState::cleared();
        state.set_bucket(TimeBucket::BeforeEight, true);

        assert_eq!(ids(&apply_filters(&candidates, &state)), ["early"]);
    }

    #[test]
    fn buckets_or_amenities_and() {
        let mut a = ride_at("a", 7, 0, 10.0, 2);
        a.amenities = a.amenities.with(Amenity::AirConditioning);
        let b = ride_at("b", 19, 0, 10.0, 2);
        let mut c = ride_at("c", 19, 30, 10.0, 2);
        c.amenities = c.amenities.with(Amenity::AirConditioning);
        let d = ride_at("d", 13, 0, 10.0, 2);
        let candidates = vec![a, b, c, d];

        let mut state = FilterState::cleared();
        state.set_bucket(TimeBucket::BeforeEight, true);
        state.set_bucket(TimeBucket::AfterSix, true);
        assert_eq!(ids(&apply_filters(&candidates, &state)), ["a", "b", "c"]);

        state.set_amenity(Amenity::AirConditioning, true);
        assert_eq!(ids(&apply_filters(&candidates, &state)), ["a", "c"]);
    }

    #[test]
    fn toggling_off_restores_hidden_rides() {
        let mut a = ride_at("a", 7, 0, 10.0, 2);
        a.amenities = a.amenities.with(Amenity::PetsAllowed);
        let b = ride_at("b", 8, 0, 10.0, 2);
        let candidates = vec![a, b];

        let mut state = FilterState::cleared();
        state.set_amenity(Amenity::PetsAllowed, true);
        assert_eq!(apply_filters(&candidates, &state).len(), 1);

        state.set_amenity(Amenity::PetsAllowed, false);
        assert_eq!(ids(&apply_filters(&candidates, &state)), ["a", "b"]);
    }
}
