//! Per-kind read services and the context that ties them together.

pub mod algorithms;
pub mod articles;
pub mod context;
pub mod intro;
pub mod tags;

pub use algorithms::AlgorithmService;
pub use articles::ArticleService;
pub use context::{SyncContext, WarmOutcome};
pub use intro::IntroSequenceService;
pub use tags::TagService;
