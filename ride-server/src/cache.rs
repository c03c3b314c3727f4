//! Caching layer for backend ride reads.
//!
//! Search results and ride details are cached for a short TTL so that
//! filter and sort changes, back navigation and repeated detail views do
//! not hit the backend. Any ride mutation made through this server
//! invalidates both caches, so seat counts are fresh after a booking.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::backend::{Backend, BackendError, Credentials};
use crate::domain::{Ride, RideDraft, RideId};
use crate::search::SearchQuery;

/// Cached search result entry.
type SearchEntry = Arc<Vec<Ride>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per cache.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_capacity: 500,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Cache for backend ride reads.
pub struct RideCache {
    /// Search results, keyed by the full query.
    searches: MokaCache<SearchQuery, SearchEntry>,

    /// Ride details, keyed by id.
    rides: MokaCache<RideId, Arc<Ride>>,
}

impl RideCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let searches = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let rides = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { searches, rides }
    }

    fn entry_count(&self) -> u64 {
        self.searches.entry_count() + self.rides.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.searches.invalidate_all();
        self.rides.invalidate_all();
    }
}

/// Backend with caching.
///
/// Wraps a [`Backend`] and caches search and ride-detail responses.
/// Ride mutations go through here so they can invalidate; everything else
/// uses [`CachedBackend::backend`] directly.
pub struct CachedBackend {
    backend: Backend,
    cache: RideCache,
}

impl CachedBackend {
    /// Create a new cached backend.
    pub fn new(backend: Backend, cache_config: &CacheConfig) -> Self {
        Self {
            backend,
            cache: RideCache::new(cache_config),
        }
    }

    /// Search rides, using the cache if available.
    pub async fn find_rides(&self, query: &SearchQuery) -> Result<SearchEntry, BackendError> {
        if let Some(cached) = self.cache.searches.get(query).await {
            debug!(?query, "Search cache hit");
            return Ok(cached);
        }

        let entry = Arc::new(self.backend.find_rides(query).await?);
        self.cache.searches.insert(query.clone(), entry.clone()).await;
        Ok(entry)
    }

    /// Get a ride, using the cache if available.
    pub async fn get_ride(&self, id: &RideId) -> Result<Arc<Ride>, BackendError> {
        if let Some(cached) = self.cache.rides.get(id).await {
            return Ok(cached);
        }

        let ride = Arc::new(self.backend.get_ride(id).await?);
        self.cache.rides.insert(id.clone(), ride.clone()).await;
        Ok(ride)
    }

    pub async fn create_ride(
        &self,
        credentials: &Credentials,
        draft: &RideDraft,
    ) -> Result<Option<RideId>, BackendError> {
        let result = self.backend.create_ride(credentials, draft).await;
        self.invalidate_cache();
        result
    }

    pub async fn update_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
        draft: &RideDraft,
    ) -> Result<(), BackendError> {
        let result = self.backend.update_ride(credentials, id, draft).await;
        self.invalidate_cache();
        result
    }

    pub async fn delete_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        let result = self.backend.delete_ride(credentials, id).await;
        self.invalidate_cache();
        result
    }

    pub async fn join_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        let result = self.backend.join_ride(credentials, id).await;
        self.invalidate_cache();
        result
    }

    pub async fn leave_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        let result = self.backend.leave_ride(credentials, id).await;
        self.invalidate_cache();
        result
    }

    /// Access the underlying backend for operations that bypass cache.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        debug!(entries = self.cache.entry_count(), "Invalidating ride caches");
        self.cache.invalidate_all();
    }
}
