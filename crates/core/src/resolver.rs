//! Patient identifier resolution.
//!
//! A patient's clinical records may be keyed by their auth-provider user id,
//! by a chart document id a clinician created for them, or by a legacy
//! profile-linked id. Given a requested identifier and the caller's own
//! identity, [`IdentifierResolver::resolve`] accumulates every identifier
//! the caller's records may be filed under.
//!
//! Resolution never fails. Every chart-store lookup is individually guarded
//! with a bounded timeout; a failed or timed-out lookup is logged and
//! contributes zero matches, and the remaining lookups still run. In the
//! worst case (total store outage) the result degrades to the identifiers
//! derivable from the request itself.

use std::future::Future;
use std::sync::Arc;

use crate::chart::{Chart, ChartStore};
use crate::config::CoreConfig;
use crate::error::ChartStoreError;
use crate::id_set::ResolvedIds;
use crate::profile::Profile;

/// Outcome of a guarded point lookup against the chart store.
///
/// `Absent` is a definitive "no such document"; `Failed` means the store
/// could not answer, which proves nothing about existence.
enum FetchOutcome {
    Found(Chart),
    Absent,
    Failed,
}

/// Resolves the set of identifiers under which a caller's clinical records
/// may be stored.
pub struct IdentifierResolver<S: ?Sized> {
    store: Arc<S>,
    cfg: Arc<CoreConfig>,
}

impl<S: ?Sized> Clone for IdentifierResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cfg: Arc::clone(&self.cfg),
        }
    }
}

impl<S: ChartStore + ?Sized> IdentifierResolver<S> {
    pub fn new(store: Arc<S>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Resolve the identifier set for `requested_id` on behalf of the
    /// caller identified by `caller_auth_id` with `profile`.
    ///
    /// Always returns at least the trimmed `requested_id` when it is
    /// non-blank; never returns blank identifiers. External lookup failures
    /// are logged and degrade to "no additional matches".
    ///
    /// # Arguments
    ///
    /// * `requested_id` - The identifier the caller asked for records under.
    /// * `caller_auth_id` - The caller's own auth-provider id.
    /// * `profile` - The caller's profile, resolved by the external profile
    ///   layer before this runs.
    pub async fn resolve(
        &self,
        requested_id: &str,
        caller_auth_id: &str,
        profile: &Profile,
    ) -> ResolvedIds {
        let mut ids = ResolvedIds::new();
        ids.insert(requested_id);

        let is_patient_caller = profile.role.is_patient();
        let is_self_access = caller_auth_id == requested_id;

        // Patients are always identified by their auth id, even when
        // staff-created records carry a chart id instead.
        if is_patient_caller {
            ids.insert(caller_auth_id);
        }

        if let Some(linked) = profile.linked_patient_id.as_deref() {
            ids.insert(linked);
        }

        if is_patient_caller {
            // Phone is a best-effort secondary key: duplicate and legacy
            // charts may share one, so every match within the limit counts.
            if let Some(phone) = profile
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
            {
                let limit = self.cfg.search_limit();
                for chart in self
                    .search("phone", self.store.find_by_phone(phone, limit))
                    .await
                {
                    ids.insert(&chart.chart_id);
                }
            }

            if is_self_access {
                // Covers deployments that store the auth id in the legacy
                // owner field or in authUserId rather than as the chart key.
                self.collect_account_links(requested_id, &mut ids).await;

                // Symmetric closure: a chart keyed by the requested id links
                // back to its auth id, and vice versa.
                if let FetchOutcome::Found(chart) = self.fetch("self-chart", requested_id).await {
                    ids.insert(&chart.chart_id);
                    if let Some(auth_id) = chart.auth_user_id.as_deref() {
                        ids.insert(auth_id);
                    }
                }
            } else {
                // The caller may be requesting by chart id while records are
                // keyed by the auth id that chart carries.
                if let FetchOutcome::Found(chart) =
                    self.fetch("cross-ref-chart", requested_id).await
                {
                    if let Some(auth_id) = chart.auth_user_id.as_deref() {
                        ids.insert(auth_id);
                    }
                }

                // A patient browsing by chart id still recovers every
                // identifier linked to their own account.
                self.collect_account_links(caller_auth_id, &mut ids).await;
            }
        } else if !requested_id.trim().is_empty() {
            // Staff pass either a chart id or an auth id interchangeably.
            match self.fetch("staff-chart", requested_id).await {
                FetchOutcome::Found(chart) => {
                    if let Some(auth_id) = chart.auth_user_id.as_deref() {
                        ids.insert(auth_id);
                    }
                }
                FetchOutcome::Absent => {
                    for chart in self
                        .search(
                            "staff-owner-user-id",
                            self.store.find_by_owner_user_id(requested_id, 1),
                        )
                        .await
                    {
                        ids.insert(&chart.chart_id);
                    }
                    for chart in self
                        .search(
                            "staff-auth-user-id",
                            self.store.find_by_auth_user_id(requested_id, 1),
                        )
                        .await
                    {
                        ids.insert(&chart.chart_id);
                    }
                }
                // A failed point lookup proves nothing about existence, so
                // the secondary searches do not run.
                FetchOutcome::Failed => {}
            }
        }

        if self.cfg.verbose_resolution() {
            tracing::debug!(
                requested_id,
                caller_auth_id,
                role = %profile.role,
                resolved = %ids,
                "resolved identifier set"
            );
        }

        ids
    }

    /// Both equality searches keyed on `account_id`: the legacy owner field
    /// and `authUserId`, each up to the configured limit.
    async fn collect_account_links(&self, account_id: &str, ids: &mut ResolvedIds) {
        let limit = self.cfg.search_limit();
        for chart in self
            .search(
                "owner-user-id",
                self.store.find_by_owner_user_id(account_id, limit),
            )
            .await
        {
            ids.insert(&chart.chart_id);
        }
        for chart in self
            .search(
                "auth-user-id",
                self.store.find_by_auth_user_id(account_id, limit),
            )
            .await
        {
            ids.insert(&chart.chart_id);
        }
    }

    /// Run one equality search under the lookup timeout. Failures and
    /// timeouts are logged and yield no matches.
    async fn search(
        &self,
        lookup: &'static str,
        query: impl Future<Output = Result<Vec<Chart>, ChartStoreError>>,
    ) -> Vec<Chart> {
        match tokio::time::timeout(self.cfg.lookup_timeout(), query).await {
            Ok(Ok(charts)) => charts,
            Ok(Err(e)) => {
                tracing::warn!(lookup, error = %e, "chart search failed, continuing without its matches");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(lookup, "chart search timed out, continuing without its matches");
                Vec::new()
            }
        }
    }

    /// Run one point lookup under the lookup timeout.
    async fn fetch(&self, lookup: &'static str, chart_id: &str) -> FetchOutcome {
        match tokio::time::timeout(self.cfg.lookup_timeout(), self.store.fetch(chart_id)).await {
            Ok(Ok(Some(chart))) => FetchOutcome::Found(chart),
            Ok(Ok(None)) => FetchOutcome::Absent,
            Ok(Err(e)) => {
                tracing::warn!(lookup, chart_id, error = %e, "chart fetch failed, continuing without its matches");
                FetchOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(lookup, chart_id, "chart fetch timed out, continuing without its matches");
                FetchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Chart;
    use crate::error::ChartResult;
    use crate::memory::InMemoryChartStore;
    use crate::profile::Role;
    use async_trait::async_trait;

    /// A chart store where every lookup fails, simulating a store outage.
    struct FailingChartStore;

    #[async_trait]
    impl ChartStore for FailingChartStore {
        async fn fetch(&self, _chart_id: &str) -> ChartResult<Option<Chart>> {
            Err(ChartStoreError::Unavailable("connection refused".into()))
        }

        async fn find_by_phone(&self, _phone: &str, _limit: usize) -> ChartResult<Vec<Chart>> {
            Err(ChartStoreError::Unavailable("connection refused".into()))
        }

        async fn find_by_owner_user_id(
            &self,
            _owner_user_id: &str,
            _limit: usize,
        ) -> ChartResult<Vec<Chart>> {
            Err(ChartStoreError::Unavailable("connection refused".into()))
        }

        async fn find_by_auth_user_id(
            &self,
            _auth_user_id: &str,
            _limit: usize,
        ) -> ChartResult<Vec<Chart>> {
            Err(ChartStoreError::Unavailable("connection refused".into()))
        }
    }

    /// Point lookups fail; equality searches answer from the inner store.
    struct BrokenFetchStore {
        inner: InMemoryChartStore,
    }

    #[async_trait]
    impl ChartStore for BrokenFetchStore {
        async fn fetch(&self, _chart_id: &str) -> ChartResult<Option<Chart>> {
            Err(ChartStoreError::Backend("primary index offline".into()))
        }

        async fn find_by_phone(&self, phone: &str, limit: usize) -> ChartResult<Vec<Chart>> {
            self.inner.find_by_phone(phone, limit).await
        }

        async fn find_by_owner_user_id(
            &self,
            owner_user_id: &str,
            limit: usize,
        ) -> ChartResult<Vec<Chart>> {
            self.inner.find_by_owner_user_id(owner_user_id, limit).await
        }

        async fn find_by_auth_user_id(
            &self,
            auth_user_id: &str,
            limit: usize,
        ) -> ChartResult<Vec<Chart>> {
            self.inner.find_by_auth_user_id(auth_user_id, limit).await
        }
    }

    fn resolver<S: ChartStore>(store: S) -> IdentifierResolver<S> {
        IdentifierResolver::new(Arc::new(store), Arc::new(CoreConfig::default()))
    }

    fn patient() -> Profile {
        Profile::with_role(Role::Patient)
    }

    #[tokio::test]
    async fn test_patient_requesting_own_chart_id_gets_auth_id() {
        // Caller is patient U1 requesting by chart id C1; the chart links
        // back to U1.
        let store = InMemoryChartStore::new();
        store
            .insert(Chart::new("C1").with_auth_user_id("U1"))
            .await;

        let ids = resolver(store).resolve("C1", "U1", &patient()).await;

        let expected: ResolvedIds = ["C1", "U1"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_patient_self_access_with_empty_store() {
        let store = InMemoryChartStore::new();

        let ids = resolver(store).resolve("U1", "U1", &patient()).await;

        let expected: ResolvedIds = ["U1"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_patient_self_access_collects_linked_charts() {
        let store = InMemoryChartStore::new();
        // Chart keyed by something else but owned via the legacy field.
        store
            .insert(Chart::new("C2").with_owner_user_id("U1"))
            .await;
        // Chart linked through authUserId.
        store
            .insert(Chart::new("C3").with_auth_user_id("U1"))
            .await;
        // Chart whose own key is the auth id, carrying a different auth id;
        // both sides of the closure are included.
        store
            .insert(Chart::new("U1").with_auth_user_id("U9"))
            .await;

        let ids = resolver(store).resolve("U1", "U1", &patient()).await;

        let expected: ResolvedIds = ["U1", "C2", "C3", "U9"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_patient_phone_fallback_recovers_duplicate_charts() {
        let store = InMemoryChartStore::new();
        store
            .insert(Chart::new("C4").with_phone("+15551234"))
            .await;
        store
            .insert(Chart::new("C5").with_phone("+15551234"))
            .await;
        store
            .insert(Chart::new("C6").with_phone("+15559999"))
            .await;

        let mut profile = patient();
        profile.phone = Some("+15551234".into());

        let ids = resolver(store).resolve("U1", "U1", &profile).await;

        assert!(ids.contains("U1"));
        assert!(ids.contains("C4"));
        assert!(ids.contains("C5"));
        assert!(!ids.contains("C6"));
    }

    #[tokio::test]
    async fn test_phone_fallback_is_bounded() {
        let store = InMemoryChartStore::new();
        for i in 0..8 {
            store
                .insert(Chart::new(format!("C{i}")).with_phone("+15551234"))
                .await;
        }

        let mut profile = patient();
        profile.phone = Some("+15551234".into());

        let ids = resolver(store).resolve("U1", "U1", &profile).await;

        // U1 plus at most five phone matches.
        assert_eq!(ids.len(), 6, "got {ids}");
    }

    #[tokio::test]
    async fn test_patient_cross_access_recovers_own_account_links() {
        // Patient U1 browsing by a chart id that is not their auth id.
        let store = InMemoryChartStore::new();
        store
            .insert(Chart::new("C1").with_auth_user_id("U1"))
            .await;
        store
            .insert(Chart::new("C7").with_owner_user_id("U1"))
            .await;

        let ids = resolver(store).resolve("C1", "U1", &patient()).await;

        let expected: ResolvedIds = ["C1", "U1", "C7"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_linked_patient_id_is_added_and_trimmed() {
        let store = InMemoryChartStore::new();
        let mut profile = Profile::with_role(Role::Doctor);
        profile.linked_patient_id = Some("  L1  ".into());

        let ids = resolver(store).resolve("U2", "D1", &profile).await;

        assert!(ids.contains("L1"));
        assert!(ids.contains("U2"));
    }

    #[tokio::test]
    async fn test_staff_requesting_auth_id_falls_back_to_searches() {
        // No chart keyed "U1", but C9 links to it via authUserId.
        let store = InMemoryChartStore::new();
        store
            .insert(Chart::new("C9").with_auth_user_id("U1"))
            .await;

        let profile = Profile::with_role(Role::Doctor);
        let ids = resolver(store).resolve("U1", "D1", &profile).await;

        let expected: ResolvedIds = ["U1", "C9"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_staff_requesting_chart_id_adds_its_auth_id() {
        let store = InMemoryChartStore::new();
        store
            .insert(Chart::new("C1").with_auth_user_id("U1"))
            .await;

        let profile = Profile::with_role(Role::Nurse);
        let ids = resolver(store).resolve("C1", "N1", &profile).await;

        let expected: ResolvedIds = ["C1", "U1"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_staff_fetch_failure_skips_secondary_searches() {
        // The searches would find C9, but the point lookup failing means
        // existence is unknown, so they must not run.
        let inner = InMemoryChartStore::new();
        inner
            .insert(Chart::new("C9").with_auth_user_id("U1"))
            .await;
        let store = BrokenFetchStore { inner };

        let profile = Profile::with_role(Role::Doctor);
        let ids = resolver(store).resolve("U1", "D1", &profile).await;

        let expected: ResolvedIds = ["U1"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_total_outage_degrades_to_input_derived_ids() {
        let mut profile = patient();
        profile.linked_patient_id = Some("L1".into());
        profile.phone = Some("+15551234".into());

        let ids = resolver(FailingChartStore).resolve("C1", "U1", &profile).await;

        let expected: ResolvedIds = ["C1", "U1", "L1"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
    }

    #[tokio::test]
    async fn test_blank_requested_id_never_leaks() {
        let store = InMemoryChartStore::new();

        let ids = resolver(store).resolve("   ", "U1", &patient()).await;

        let expected: ResolvedIds = ["U1"].into_iter().collect();
        assert!(ids.same_ids(&expected), "got {ids}");
        assert!(ids.iter().all(|id| !id.trim().is_empty()));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let store = InMemoryChartStore::new();
        store
            .insert(Chart::new("C1").with_auth_user_id("U1"))
            .await;
        store
            .insert(Chart::new("C2").with_owner_user_id("U1"))
            .await;

        let resolver = resolver(store);
        let first = resolver.resolve("U1", "U1", &patient()).await;
        let second = resolver.resolve("U1", "U1", &patient()).await;

        assert!(first.same_ids(&second));
    }
}
