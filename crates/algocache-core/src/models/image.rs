use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Reference to an image attached to an article or intro step.
///
/// The source hands out `Remote` references. On the offline path they are
/// rehydrated into `Local` file references, or `Placeholder` when the
/// downloaded file is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageRef {
    Remote { url: String },
    Local { path: PathBuf },
    Placeholder,
}

impl ImageRef {
    pub fn remote(url: impl Into<String>) -> Self {
        ImageRef::Remote { url: url.into() }
    }
}
