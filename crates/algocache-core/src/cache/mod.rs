//! Local cache repositories for offline data access.
//!
//! - `JsonFileCache`: one JSON file per entity kind, survives restarts
//! - `MemoryCache`: process-local, used when persistence is not wanted
//! - `FsImageStore`: resolves downloaded images for offline display

pub mod file;
pub mod images;
pub mod memory;

pub use file::{CachedData, JsonFileCache};
pub use images::FsImageStore;
pub use memory::MemoryCache;
