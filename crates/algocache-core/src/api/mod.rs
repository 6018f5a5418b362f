//! REST source for the synced entity kinds.
//!
//! `ApiClient` implements [`SourceRepository`](crate::repository::SourceRepository)
//! for every kind that has an [`Endpoint`], sharing one connection pool.
//! Reachability is answered with a short health probe.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::ApiClient;
pub use endpoints::Endpoint;
pub use error::SourceError;
