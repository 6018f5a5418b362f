//! Source/cache synchronization.
//!
//! - `diff`: identity-keyed create/update/delete partition
//! - `retry`: bounded retries that never repeat a terminal failure
//! - `availability`: per-call reachability check
//! - `service`: the read-through, stale-while-revalidate orchestrator
//! - `reconcile`: best-effort application of a diff to the cache
//! - `clear`: parallel clear of every kind's cache

pub mod availability;
pub mod clear;
pub mod diff;
pub mod reconcile;
pub mod retry;
pub mod revalidation;
pub mod service;

pub use availability::Availability;
pub use clear::ClearCacheCoordinator;
pub use diff::{diff, diff_by, DiffResult, EntityDiff};
pub use reconcile::{CacheReconciler, ReconcileReport};
pub use retry::{retry_until_success, Retryable, RetryPolicy, DEFAULT_MAX_RETRIES};
pub use revalidation::Revalidation;
pub use service::{CollectionQuery, Fetched, ReadOrigin, ReadThroughService};
