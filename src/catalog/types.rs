//! Core catalog types shared across the crate.

use serde::{Deserialize, Serialize};

/// Sentinel MIME value for entries whose type could not be resolved.
///
/// Inferred ancestors of non-HTML leaves carry this value so that an image
/// or file download never classifies its parent directory.
pub const MIME_UNKNOWN: &str = "unknown";

/// A normalized URL together with its MIME type.
///
/// This is the value stored on the processed side of the catalog, both for
/// directly crawled URLs and for inferred ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntry {
    pub url: String,
    pub mime: String,
}

impl UrlEntry {
    #[must_use]
    pub fn new(url: impl Into<String>, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        Self {
            url: url.into(),
            mime: if mime.is_empty() {
                MIME_UNKNOWN.to_string()
            } else {
                mime
            },
        }
    }

    /// Entry with the `unknown` sentinel MIME.
    #[must_use]
    pub fn with_unknown_mime(url: impl Into<String>) -> Self {
        Self::new(url, MIME_UNKNOWN)
    }
}

/// Crawl status derived from what is present on disk.
///
/// Never stored directly: `NotStarted` means no persisted catalog exists,
/// `Partial` means a catalog exists alongside a live session marker, and
/// `Complete` means the catalog exists with no marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpiderStatus {
    NotStarted,
    Partial,
    Complete,
}

/// How a downstream importer should treat a URL it has already imported.
///
/// Closed set so that importer match arms stay exhaustiveness-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStrategy {
    Overwrite,
    Duplicate,
    Skip,
}
