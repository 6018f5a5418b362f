//! Data models for the synced entity kinds.
//!
//! - `VersionedEntity`: identity + last-modified contract shared by every kind
//! - `Article`, `Tag`, `Algorithm`, `IntroStep`: the concrete kinds
//! - Identifier newtypes and `ImageRef`

pub mod algorithm;
pub mod article;
pub mod entity;
pub mod ids;
pub mod image;
pub mod intro;
pub mod tag;

pub use algorithm::{Algorithm, AlgorithmCategory};
pub use article::Article;
pub use entity::{EntityKind, Timestamp, VersionedEntity};
pub use ids::{AlgorithmId, ArticleId, IntroStepId, TagId};
pub use image::ImageRef;
pub use intro::{Designation, IntroStep};
pub use tag::Tag;
