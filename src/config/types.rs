//! The `CatalogConfig` struct and its accessors.

use std::path::{Path, PathBuf};

use regex::Regex;
use url::Url;

/// Configuration for one catalog crawl.
///
/// Construct through [`CatalogConfig::builder`]; the builder is the only
/// place the base URL is parsed and the exclude patterns are compiled.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub(crate) base_url: Url,
    pub(crate) storage_dir: PathBuf,
    pub(crate) seed_url: String,
    pub(crate) rule_id: String,
    pub(crate) exclude_patterns: Vec<String>,
    /// Compiled from `exclude_patterns` at build time to keep regex
    /// compilation out of the per-event path.
    pub(crate) exclude_patterns_compiled: Vec<Regex>,
    pub(crate) extra_seeds: Vec<String>,
    pub(crate) limit: Option<usize>,
}

impl CatalogConfig {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// The URL the crawl starts from. Defaults to the base URL.
    #[must_use]
    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    /// Identifier of the active normalization rule.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    #[must_use]
    pub fn extra_seeds(&self) -> &[String] {
        &self.extra_seeds
    }

    /// Optional cap on documents cataloged per run.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether any compiled exclude pattern matches `url`.
    #[must_use]
    pub fn is_excluded(&self, url: &str) -> bool {
        self.exclude_patterns_compiled
            .iter()
            .any(|pattern| pattern.is_match(url))
    }
}
