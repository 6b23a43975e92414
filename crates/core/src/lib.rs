//! # Chartlink Core
//!
//! Patient identity resolution for the Chartlink record access backend.
//!
//! Patients accumulate identifiers over time: the auth-provider user id they
//! log in with, the chart document id a clinician created for them, and a
//! legacy profile-linked id. Clinical records may be keyed by any of these,
//! under either of two historical field names. This crate reconciles them:
//!
//! - [`IdentifierResolver`] produces the complete set of identifiers a
//!   caller's records may be filed under, consulting an external
//!   [`ChartStore`] on a best-effort basis.
//! - [`CachedResolver`] / [`ResolutionCache`] memoize resolution per
//!   `(caller, requested id)` with a TTL.
//!
//! **No API concerns**: HTTP routing, caller authentication, and record
//! storage belong in `chartlink-api` and `chartlink-records`.

pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod id_set;
pub mod memory;
pub mod profile;
pub mod resolver;

pub use cache::{CachedResolver, ResolutionCache};
pub use chart::{Chart, ChartStore};
pub use config::CoreConfig;
pub use error::{ChartResult, ChartStoreError};
pub use id_set::ResolvedIds;
pub use memory::InMemoryChartStore;
pub use profile::{Profile, Role};
pub use resolver::IdentifierResolver;
