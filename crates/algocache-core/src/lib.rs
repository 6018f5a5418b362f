//! Offline-first read-through sync for articles, tags, algorithms and the
//! intro sequence.
//!
//! Reads are answered from the local cache whenever it has data; a
//! background revalidation fetches the source, reports newer content once
//! through [`sync::Revalidation`], and reconciles the cache. Without a
//! connection the cache is served as-is.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod sync;

#[cfg(test)]
mod testing;

pub use catalog::SyncContext;
pub use config::Config;
pub use error::{CacheError, SyncError, SyncResult};
pub use models::{EntityKind, VersionedEntity};
pub use sync::{Fetched, ReadOrigin, ReadThroughService, Revalidation};
