//! The persisted URL catalog.
//!
//! The catalog holds two maps: `regular`, keyed by the raw URL exactly as
//! the crawler discovered it, and `inferred`, keyed by processed URL,
//! holding ancestors synthesized purely to keep the hierarchy connected.
//! Two invariants hold after every mutation:
//!
//! - a processed URL appears in at most one of the two maps;
//! - every non-root processed URL's parent is present in one of them
//!   (the catalog is parent-closed).
//!
//! `BTreeMap` rather than `HashMap` keeps reprocessing order and the
//! serialized form deterministic, which the idempotent-reprocess contract
//! depends on.

pub mod hierarchy;
pub mod store;
pub mod types;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use log::warn;
use url::Url;

use crate::normalize::{NormalizationRule, NormalizeError};
use self::types::UrlEntry;

/// Error taxonomy for catalog operations.
///
/// Configuration problems are fatal and surface before crawling starts;
/// out-of-scope URLs are raised to the caller; storage failures wrap the
/// underlying I/O or serialization error.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("URL '{url}' is outside the configured base '{base}'")]
    OutOfScopeUrl { url: String, base: String },

    #[error("catalog storage error: {0}")]
    Store(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// In-memory catalog of raw and inferred URLs.
pub struct UrlCatalog {
    base_url: Url,
    rule: Arc<dyn NormalizationRule>,
    regular: BTreeMap<String, UrlEntry>,
    inferred: BTreeMap<String, UrlEntry>,
}

impl UrlCatalog {
    /// Empty catalog for the given site base and active rule.
    #[must_use]
    pub fn new(base_url: Url, rule: Arc<dyn NormalizationRule>) -> Self {
        Self {
            base_url,
            rule,
            regular: BTreeMap::new(),
            inferred: BTreeMap::new(),
        }
    }

    /// Catalog rebuilt from persisted maps.
    #[must_use]
    pub fn from_parts(
        base_url: Url,
        rule: Arc<dyn NormalizationRule>,
        regular: BTreeMap<String, UrlEntry>,
        inferred: BTreeMap<String, UrlEntry>,
    ) -> Self {
        Self {
            base_url,
            rule,
            regular,
            inferred,
        }
    }

    /// Normalize a raw URL and store it, then backfill any missing
    /// ancestors.
    ///
    /// Idempotent per raw key: re-adding the same raw URL overwrites the
    /// previous entry, never duplicates it. A normalization failure is
    /// returned for the caller to log and skip; nothing is stored.
    pub fn add_url(&mut self, raw: &str, mime: &str) -> Result<(), NormalizeError> {
        let entry = self.rule.process(raw, mime)?;
        // The processed URL may have been inferred earlier; direct
        // discovery takes precedence.
        self.inferred.remove(&entry.url);
        self.regular.insert(raw.to_string(), entry.clone());
        self.backfill(&entry);
        Ok(())
    }

    /// Resolve an absolute URL against the configured base and add it.
    pub fn add_absolute_url(&mut self, url: &str, mime: &str) -> Result<(), CatalogError> {
        let raw = self.to_relative(url)?.into_owned();
        self.add_url(&raw, mime)?;
        Ok(())
    }

    /// Store an inferred entry unless its processed URL is already known,
    /// backfilling its own ancestors in turn.
    pub fn add_inferred(&mut self, entry: UrlEntry) {
        if self.contains_processed(&entry.url) {
            return;
        }
        self.inferred.insert(entry.url.clone(), entry.clone());
        self.backfill(&entry);
    }

    /// Raw-side lookup. Absolute inputs are resolved against the base URL
    /// first and raise [`CatalogError::OutOfScopeUrl`] when they point
    /// elsewhere.
    pub fn has_url(&self, url: &str) -> Result<bool, CatalogError> {
        let raw = self.to_relative(url)?;
        Ok(self.regular.contains_key(raw.as_ref()))
    }

    /// Processed-side lookup across both maps.
    #[must_use]
    pub fn has_processed_url(&self, url: &str) -> bool {
        self.contains_processed(url)
    }

    /// Look up an entry by raw or processed URL, for downstream consumers.
    #[must_use]
    pub fn processed_url(&self, url: &str) -> Option<&UrlEntry> {
        if let Some(entry) = self.regular.get(url) {
            return Some(entry);
        }
        if let Some(entry) = self.inferred.get(url) {
            return Some(entry);
        }
        self.regular.values().find(|entry| entry.url == url)
    }

    /// Processed URLs exactly one path/query segment below `url`.
    ///
    /// `url` may be a raw key or an already-processed URL; it is resolved
    /// to its processed form before matching. The result is de-duplicated
    /// and unordered.
    #[must_use]
    pub fn children_of(&self, url: &str) -> Vec<String> {
        let parent = self.resolve_processed(url);
        let mut children = HashSet::new();
        for candidate in self
            .regular
            .values()
            .map(|entry| entry.url.as_str())
            .chain(self.inferred.keys().map(String::as_str))
        {
            if hierarchy::is_direct_child(&parent, candidate) {
                children.insert(candidate.to_string());
            }
        }
        children.into_iter().collect()
    }

    /// Re-derive the whole catalog under the current rule.
    ///
    /// Drops every inferred entry, re-normalizes each regular entry in key
    /// order, then backfills ancestors for the full set. Running this twice
    /// with no mutation in between yields identical state: the outcome is a
    /// pure function of the raw keys, their MIME values and the rule. An
    /// entry whose re-normalization fails keeps its previous processed
    /// value.
    pub fn reprocess_urls(&mut self) {
        self.inferred.clear();

        let snapshot: Vec<(String, UrlEntry)> = self
            .regular
            .iter()
            .map(|(raw, entry)| (raw.clone(), entry.clone()))
            .collect();
        for (raw, previous) in snapshot {
            match self.rule.process(&raw, &previous.mime) {
                Ok(entry) => {
                    self.regular.insert(raw, entry);
                }
                Err(err) => {
                    warn!("reprocess kept previous entry for '{raw}': {err}");
                }
            }
        }

        // Backfill only after every value reflects the current rule, so the
        // inferred set never depends on a half-reprocessed view.
        let entries: Vec<UrlEntry> = self.regular.values().cloned().collect();
        for entry in &entries {
            self.backfill(entry);
        }
    }

    /// All processed entries, regular values first, then inferred.
    pub fn entries(&self) -> impl Iterator<Item = &UrlEntry> {
        self.regular.values().chain(self.inferred.values())
    }

    /// Number of directly cataloged URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regular.len()
    }

    /// Number of inferred ancestor entries.
    #[must_use]
    pub fn inferred_len(&self) -> usize {
        self.inferred.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.inferred.is_empty()
    }

    /// The configured site base.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn regular_map(&self) -> &BTreeMap<String, UrlEntry> {
        &self.regular
    }

    pub(crate) fn inferred_map(&self) -> &BTreeMap<String, UrlEntry> {
        &self.inferred
    }

    fn contains_processed(&self, url: &str) -> bool {
        self.inferred.contains_key(url) || self.regular.values().any(|entry| entry.url == url)
    }

    /// Create missing ancestors of `entry` up to the root.
    ///
    /// Iterative on purpose: pathological URL depths must not grow the
    /// stack. Terminates because each parent is strictly shorter and the
    /// root is a fixed point.
    fn backfill(&mut self, entry: &UrlEntry) {
        let mut cursor = entry.clone();
        while let Some(parent) = hierarchy::parent_entry(&cursor) {
            if self.contains_processed(&parent.url) {
                break;
            }
            self.inferred.insert(parent.url.clone(), parent.clone());
            cursor = parent;
        }
    }

    fn resolve_processed(&self, url: &str) -> String {
        if let Some(entry) = self.regular.get(url) {
            return entry.url.clone();
        }
        // Not a known raw key: normalize, falling back to the input
        // verbatim when the rule rejects it.
        match self.rule.process(url, types::MIME_UNKNOWN) {
            Ok(entry) => entry.url,
            Err(_) => url.to_string(),
        }
    }

    /// Strip the configured base from an absolute URL, leaving relative
    /// inputs untouched.
    fn to_relative<'a>(&self, url: &'a str) -> Result<Cow<'a, str>, CatalogError> {
        if !url.contains("://") {
            return Ok(Cow::Borrowed(url));
        }

        let out_of_scope = || CatalogError::OutOfScopeUrl {
            url: url.to_string(),
            base: self.base_url.to_string(),
        };

        let parsed = Url::parse(url).map_err(|_| out_of_scope())?;
        if parsed.scheme() != self.base_url.scheme()
            || parsed.host_str() != self.base_url.host_str()
            || parsed.port_or_known_default() != self.base_url.port_or_known_default()
        {
            return Err(out_of_scope());
        }

        let mut relative = parsed.path().to_string();
        let base_path = self.base_url.path();
        if base_path != "/" {
            relative = relative
                .strip_prefix(base_path)
                .map(str::to_string)
                .ok_or_else(out_of_scope)?;
            if !relative.starts_with('/') {
                relative.insert(0, '/');
            }
        }
        if let Some(query) = parsed.query() {
            relative.push('?');
            relative.push_str(query);
        }
        Ok(Cow::Owned(relative))
    }
}
