//! URL normalization pipeline.
//!
//! Normalization rules are pluggable strategies that turn a raw crawled URL
//! plus its MIME type into a processed [`UrlEntry`]. Rules are registered in
//! a [`RuleRegistry`] and looked up by a stable identifier, so the active
//! rule is a configuration value rather than a dynamically instantiated
//! class name.
//!
//! Rules compose: a platform-specific rule rewrites its own artifacts and
//! then delegates to the base rule, which guarantees the common
//! post-processing pass always runs last.

mod rules;

pub use rules::{ExtensionStripRule, PagesStripRule};

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::types::UrlEntry;

/// Error conditions for URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// Empty or blank input. Callers must not substitute a root default.
    #[error("empty URL")]
    EmptyUrl,

    /// A rule produced no result for a URL. Recovered locally: the caller
    /// logs and skips the URL, the crawl continues.
    #[error("rule '{rule}' produced no result for '{url}': {reason}")]
    RuleFailed {
        rule: &'static str,
        url: String,
        reason: String,
    },

    /// No rule registered under the requested identifier.
    #[error("unknown normalization rule '{0}'")]
    UnknownRule(String),
}

/// A named, stateless URL rewrite strategy.
///
/// `process` must be pure and deterministic for a given rule instance:
/// the catalog relies on this when it re-derives the whole hierarchy via
/// `reprocess_urls`.
pub trait NormalizationRule: Send + Sync + std::fmt::Debug {
    /// Stable identifier used for registry lookup and configuration.
    fn id(&self) -> &'static str;

    /// Normalize a raw URL and MIME pair into a processed entry.
    fn process(&self, raw: &str, mime: &str) -> Result<UrlEntry, NormalizeError>;
}

/// Registry of normalization rules keyed by stable identifier.
pub struct RuleRegistry {
    rules: HashMap<&'static str, Arc<dyn NormalizationRule>>,
}

impl RuleRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in rules.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ExtensionStripRule));
        registry.register(Arc::new(PagesStripRule::new()));
        registry
    }

    /// Register a rule under its own identifier, replacing any previous
    /// registration with the same id.
    pub fn register(&mut self, rule: Arc<dyn NormalizationRule>) {
        self.rules.insert(rule.id(), rule);
    }

    /// Look up a rule by identifier.
    pub fn get(&self, id: &str) -> Result<Arc<dyn NormalizationRule>, NormalizeError> {
        self.rules
            .get(id)
            .cloned()
            .ok_or_else(|| NormalizeError::UnknownRule(id.to_string()))
    }

    /// Identifiers of all registered rules, unordered.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.keys().copied().collect()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
