//! Type-safe builder for `CatalogConfig` using the typestate pattern.
//!
//! The two required fields, storage directory and base URL, are enforced at
//! compile time: `build()` only exists once both have been provided.

use regex::Regex;
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::CatalogConfig;
use crate::catalog::CatalogError;
use crate::normalize::ExtensionStripRule;

/// Compile a glob pattern into a regex.
///
/// `*` matches any sequence; the pattern is anchored to the full string.
/// Compilation happens once at config creation, and a malformed pattern is
/// a fatal configuration error rather than a per-URL failure.
fn compile_glob_pattern(pattern: &str) -> Result<Regex, CatalogError> {
    let regex_pattern = pattern.replace('*', ".*");
    let anchored = format!("^{regex_pattern}$");
    Regex::new(&anchored)
        .map_err(|e| CatalogError::Config(format!("invalid exclude pattern '{pattern}': {e}")))
}

// Type states for the builder
pub struct WithStorageDir;
pub struct WithBaseUrl;

pub struct CatalogConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) base_url: Option<String>,
    pub(crate) seed_url: Option<String>,
    pub(crate) rule_id: String,
    pub(crate) exclude_patterns: Vec<String>,
    pub(crate) extra_seeds: Vec<String>,
    pub(crate) limit: Option<usize>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CatalogConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            base_url: None,
            seed_url: None,
            rule_id: ExtensionStripRule::ID.to_string(),
            exclude_patterns: Vec::new(),
            extra_seeds: Vec::new(),
            limit: None,
            _phantom: PhantomData,
        }
    }
}

impl CatalogConfig {
    /// Create a builder with a fluent interface.
    #[must_use]
    pub fn builder() -> CatalogConfigBuilder<()> {
        CatalogConfigBuilder::default()
    }
}

impl CatalogConfigBuilder<()> {
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> CatalogConfigBuilder<WithStorageDir> {
        CatalogConfigBuilder {
            storage_dir: Some(dir.into()),
            base_url: self.base_url,
            seed_url: self.seed_url,
            rule_id: self.rule_id,
            exclude_patterns: self.exclude_patterns,
            extra_seeds: self.extra_seeds,
            limit: self.limit,
            _phantom: PhantomData,
        }
    }
}

impl CatalogConfigBuilder<WithStorageDir> {
    pub fn base_url(self, url: impl Into<String>) -> CatalogConfigBuilder<WithBaseUrl> {
        let url_string = url.into();

        // Add https:// when no scheme is present.
        let normalized = if url_string.starts_with("http://") || url_string.starts_with("https://")
        {
            url_string
        } else {
            format!("https://{url_string}")
        };

        CatalogConfigBuilder {
            storage_dir: self.storage_dir,
            base_url: Some(normalized),
            seed_url: self.seed_url,
            rule_id: self.rule_id,
            exclude_patterns: self.exclude_patterns,
            extra_seeds: self.extra_seeds,
            limit: self.limit,
            _phantom: PhantomData,
        }
    }
}

// Optional fields can be set in any state.
impl<State> CatalogConfigBuilder<State> {
    /// Override the URL the crawl starts from (defaults to the base URL).
    #[must_use]
    pub fn seed_url(mut self, url: impl Into<String>) -> Self {
        self.seed_url = Some(url.into());
        self
    }

    /// Select the normalization rule by registry identifier.
    #[must_use]
    pub fn rule_id(mut self, id: impl Into<String>) -> Self {
        self.rule_id = id.into();
        self
    }

    /// Glob patterns for URLs the session must never catalog.
    #[must_use]
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Entry points to crawl in addition to the seed URL.
    #[must_use]
    pub fn extra_seeds(mut self, seeds: Vec<String>) -> Self {
        self.extra_seeds = seeds;
        self
    }

    /// Cap on documents cataloged per run.
    #[must_use]
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

// Build is only available once both required fields are set.
impl CatalogConfigBuilder<WithBaseUrl> {
    pub fn build(self) -> Result<CatalogConfig, CatalogError> {
        let base_string = self
            .base_url
            .ok_or_else(|| CatalogError::Config("base_url is required".to_string()))?;
        let base_url = Url::parse(&base_string)
            .map_err(|e| CatalogError::Config(format!("invalid base URL '{base_string}': {e}")))?;
        if base_url.host_str().is_none() {
            return Err(CatalogError::Config(format!(
                "base URL '{base_string}' has no host"
            )));
        }

        let exclude_patterns_compiled = self
            .exclude_patterns
            .iter()
            .map(|p| compile_glob_pattern(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CatalogConfig {
            storage_dir: self
                .storage_dir
                .ok_or_else(|| CatalogError::Config("storage_dir is required".to_string()))?,
            seed_url: self.seed_url.unwrap_or_else(|| base_string.clone()),
            base_url,
            rule_id: self.rule_id,
            exclude_patterns: self.exclude_patterns,
            exclude_patterns_compiled,
            extra_seeds: self.extra_seeds,
            limit: self.limit,
        })
    }
}
