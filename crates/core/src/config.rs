//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services. Reading process-wide environment variables during request
//! handling leads to inconsistent behaviour in multi-threaded runtimes and
//! test harnesses, so nothing in this crate touches the environment after
//! [`CoreConfig::from_env`] has run.

use std::time::Duration;

/// How long a cached resolution stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
/// Entry count above which a store triggers a sweep of expired entries.
pub const DEFAULT_CACHE_ENTRY_THRESHOLD: usize = 1000;
/// Maximum matches requested from any equality search on the chart store.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
/// Bound on any single chart-store lookup, so one slow dependency cannot
/// stall resolution indefinitely.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    cache_ttl: Duration,
    cache_entry_threshold: usize,
    search_limit: usize,
    lookup_timeout: Duration,
    verbose_resolution: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_entry_threshold: DEFAULT_CACHE_ENTRY_THRESHOLD,
            search_limit: DEFAULT_SEARCH_LIMIT,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            verbose_resolution: false,
        }
    }
}

impl CoreConfig {
    /// Create a `CoreConfig` with explicit values.
    pub fn new(
        cache_ttl: Duration,
        cache_entry_threshold: usize,
        search_limit: usize,
        lookup_timeout: Duration,
        verbose_resolution: bool,
    ) -> Self {
        Self {
            cache_ttl,
            cache_entry_threshold,
            search_limit,
            lookup_timeout,
            verbose_resolution,
        }
    }

    /// Resolve configuration from the environment, once, at startup.
    ///
    /// # Environment Variables
    /// - `CHARTLINK_RESOLUTION_TTL_SECS`: cache TTL in seconds (default 300)
    /// - `CHARTLINK_LOOKUP_TIMEOUT_SECS`: per-lookup timeout in seconds (default 3)
    /// - `CHARTLINK_DEBUG_RESOLUTION`: `true`/`1`/`yes` enables verbose
    ///   diagnostic logging of resolution inputs and outputs (observational
    ///   only, no behavioural effect)
    pub fn from_env() -> Self {
        let cache_ttl = env_secs("CHARTLINK_RESOLUTION_TTL_SECS").unwrap_or(DEFAULT_CACHE_TTL);
        let lookup_timeout =
            env_secs("CHARTLINK_LOOKUP_TIMEOUT_SECS").unwrap_or(DEFAULT_LOOKUP_TIMEOUT);
        let verbose_resolution = std::env::var("CHARTLINK_DEBUG_RESOLUTION")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Self {
            cache_ttl,
            cache_entry_threshold: DEFAULT_CACHE_ENTRY_THRESHOLD,
            search_limit: DEFAULT_SEARCH_LIMIT,
            lookup_timeout,
            verbose_resolution,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn cache_entry_threshold(&self) -> usize {
        self.cache_entry_threshold
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit
    }

    pub fn lookup_timeout(&self) -> Duration {
        self.lookup_timeout
    }

    pub fn verbose_resolution(&self) -> bool {
        self.verbose_resolution
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
