//! Time-bounded memoization of identifier resolution.
//!
//! Resolution issues several external lookups, and the same caller tends to
//! request the same identifier repeatedly while paging through their
//! records. [`ResolutionCache`] memoizes resolved sets per
//! `(caller, requested id)` with a TTL; [`CachedResolver`] is the memoizing
//! front over [`IdentifierResolver`].
//!
//! Expired entries are swept opportunistically whenever a store pushes the
//! entry count over the configured threshold. There is no background expiry
//! task, so the count may briefly overshoot the threshold between stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::chart::ChartStore;
use crate::id_set::ResolvedIds;
use crate::profile::Profile;
use crate::resolver::IdentifierResolver;

/// Resolution depends on the caller's own identity as well as the requested
/// id, so both are part of the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    caller_auth_id: String,
    requested_id: String,
}

#[derive(Clone, Debug)]
struct CacheEntry {
    ids: ResolvedIds,
    computed_at: Instant,
}

/// TTL-bounded map of resolved identifier sets.
///
/// An entry older than the TTL is treated as absent. The cache is owned by
/// the process's dependency-injection root and shared behind an `Arc`;
/// tests construct a fresh instance each.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    entry_threshold: usize,
}

impl ResolutionCache {
    pub fn new(ttl: Duration, entry_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            entry_threshold,
        }
    }

    /// Look up a fresh entry. Stale entries are treated as absent (they are
    /// removed by the next sweep, not here).
    pub fn get(&self, caller_auth_id: &str, requested_id: &str) -> Option<ResolvedIds> {
        let key = CacheKey {
            caller_auth_id: caller_auth_id.to_owned(),
            requested_id: requested_id.to_owned(),
        };
        let entries = self.lock_entries();
        let entry = entries.get(&key)?;
        if entry.computed_at.elapsed() < self.ttl {
            Some(entry.ids.clone())
        } else {
            None
        }
    }

    /// Store a resolved set, then sweep expired entries if the entry count
    /// now exceeds the threshold.
    pub fn put(&self, caller_auth_id: &str, requested_id: &str, ids: ResolvedIds) {
        let key = CacheKey {
            caller_auth_id: caller_auth_id.to_owned(),
            requested_id: requested_id.to_owned(),
        };
        let mut entries = self.lock_entries();
        entries.insert(
            key,
            CacheEntry {
                ids,
                computed_at: Instant::now(),
            },
        );
        if entries.len() > self.entry_threshold {
            let removed = Self::sweep_expired(&mut entries, self.ttl);
            tracing::debug!(
                removed,
                remaining = entries.len(),
                "swept expired resolution cache entries"
            );
        }
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock_entries();
        Self::sweep_expired(&mut entries, self.ttl)
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn sweep_expired(entries: &mut HashMap<CacheKey, CacheEntry>, ttl: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.computed_at.elapsed() < ttl);
        before - entries.len()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Memoizing front over [`IdentifierResolver`].
///
/// A fresh hit short-circuits the resolver entirely. Concurrent misses for
/// the same key may each invoke the resolver and overwrite the entry; there
/// is deliberately no single-flight, since resolution is idempotent and
/// side-effect free.
pub struct CachedResolver<S: ?Sized> {
    resolver: IdentifierResolver<S>,
    cache: Arc<ResolutionCache>,
}

impl<S: ?Sized> Clone for CachedResolver<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S: ChartStore + ?Sized> CachedResolver<S> {
    pub fn new(resolver: IdentifierResolver<S>, cache: Arc<ResolutionCache>) -> Self {
        Self { resolver, cache }
    }

    /// Same contract as [`IdentifierResolver::resolve`], memoized per
    /// `(caller_auth_id, requested_id)` within the TTL.
    pub async fn resolve(
        &self,
        requested_id: &str,
        caller_auth_id: &str,
        profile: &Profile,
    ) -> ResolvedIds {
        if let Some(ids) = self.cache.get(caller_auth_id, requested_id) {
            return ids;
        }

        let ids = self
            .resolver
            .resolve(requested_id, caller_auth_id, profile)
            .await;
        self.cache.put(caller_auth_id, requested_id, ids.clone());
        ids
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Chart, ChartStore};
    use crate::config::CoreConfig;
    use crate::error::ChartResult;
    use crate::memory::InMemoryChartStore;
    use crate::profile::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts every round trip to the wrapped store.
    struct CountingChartStore {
        inner: InMemoryChartStore,
        round_trips: AtomicUsize,
    }

    impl CountingChartStore {
        fn new(inner: InMemoryChartStore) -> Self {
            Self {
                inner,
                round_trips: AtomicUsize::new(0),
            }
        }

        fn round_trips(&self) -> usize {
            self.round_trips.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChartStore for CountingChartStore {
        async fn fetch(&self, chart_id: &str) -> ChartResult<Option<Chart>> {
            self.round_trips.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(chart_id).await
        }

        async fn find_by_phone(&self, phone: &str, limit: usize) -> ChartResult<Vec<Chart>> {
            self.round_trips.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_phone(phone, limit).await
        }

        async fn find_by_owner_user_id(
            &self,
            owner_user_id: &str,
            limit: usize,
        ) -> ChartResult<Vec<Chart>> {
            self.round_trips.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_owner_user_id(owner_user_id, limit).await
        }

        async fn find_by_auth_user_id(
            &self,
            auth_user_id: &str,
            limit: usize,
        ) -> ChartResult<Vec<Chart>> {
            self.round_trips.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_auth_user_id(auth_user_id, limit).await
        }
    }

    fn cached_resolver(
        store: Arc<CountingChartStore>,
        ttl: Duration,
    ) -> CachedResolver<CountingChartStore> {
        let cfg = Arc::new(CoreConfig::default());
        let cache = Arc::new(ResolutionCache::new(ttl, 1000));
        CachedResolver::new(IdentifierResolver::new(store, cfg), cache)
    }

    #[tokio::test]
    async fn test_hit_within_ttl_issues_no_round_trips() {
        let inner = InMemoryChartStore::new();
        inner
            .insert(Chart::new("C1").with_auth_user_id("U1"))
            .await;
        let store = Arc::new(CountingChartStore::new(inner));
        let resolver = cached_resolver(Arc::clone(&store), Duration::from_secs(300));

        let profile = Profile::with_role(Role::Patient);
        let first = resolver.resolve("U1", "U1", &profile).await;
        let after_first = store.round_trips();
        assert!(after_first > 0);

        let second = resolver.resolve("U1", "U1", &profile).await;
        assert_eq!(
            store.round_trips(),
            after_first,
            "cached call must not reach the store"
        );
        assert!(first.same_ids(&second));
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes_and_sees_store_changes() {
        let inner = InMemoryChartStore::new();
        let store = Arc::new(CountingChartStore::new(inner));
        let resolver = cached_resolver(Arc::clone(&store), Duration::from_millis(40));

        let profile = Profile::with_role(Role::Patient);
        let first = resolver.resolve("U1", "U1", &profile).await;
        assert!(!first.contains("C1"));

        // The store changes while the entry goes stale.
        store
            .inner
            .insert(Chart::new("C1").with_auth_user_id("U1"))
            .await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let before = store.round_trips();
        let second = resolver.resolve("U1", "U1", &profile).await;
        assert!(store.round_trips() > before, "stale entry must recompute");
        assert!(second.contains("C1"));
    }

    #[tokio::test]
    async fn test_distinct_callers_do_not_share_entries() {
        let inner = InMemoryChartStore::new();
        let store = Arc::new(CountingChartStore::new(inner));
        let resolver = cached_resolver(Arc::clone(&store), Duration::from_secs(300));

        let patient = Profile::with_role(Role::Patient);
        let doctor = Profile::with_role(Role::Doctor);

        let as_patient = resolver.resolve("X1", "U1", &patient).await;
        let as_doctor = resolver.resolve("X1", "D1", &doctor).await;

        assert!(as_patient.contains("U1"));
        assert!(!as_doctor.contains("U1"));
    }

    #[test]
    fn test_stale_entry_is_treated_as_absent() {
        let cache = ResolutionCache::new(Duration::from_millis(20), 1000);
        let ids: ResolvedIds = ["U1"].into_iter().collect();
        cache.put("U1", "U1", ids);

        assert!(cache.get("U1", "U1").is_some());
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("U1", "U1").is_none());
        // The entry is still in the map until a sweep runs.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_over_threshold_sweeps_expired_entries() {
        let cache = ResolutionCache::new(Duration::from_millis(200), 1000);
        let ids: ResolvedIds = ["U1"].into_iter().collect();

        for i in 0..1001 {
            cache.put(&format!("caller-{i}"), "R1", ids.clone());
        }
        assert_eq!(cache.len(), 1001);

        std::thread::sleep(Duration::from_millis(300));
        cache.put("caller-fresh", "R1", ids);

        // The 1001 expired entries are gone; only the fresh store remains.
        assert_eq!(cache.len(), 1);
        assert!(cache.get("caller-fresh", "R1").is_some());
    }

    #[test]
    fn test_manual_sweep_reports_removals() {
        let cache = ResolutionCache::new(Duration::from_millis(20), 1000);
        let ids: ResolvedIds = ["U1"].into_iter().collect();
        cache.put("U1", "A", ids.clone());
        cache.put("U1", "B", ids);

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.sweep(), 2);
        assert!(cache.is_empty());
    }
}
