//! External crawler collaborator interface.
//!
//! The network fetch loop lives outside this crate. A [`PageFetcher`]
//! yields one [`DocumentEvent`] per fetched resource through a
//! [`DocumentSink`], supports pause/resume via an opaque [`SessionId`], and
//! accepts exclude patterns and extra seed URLs before running.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque resumable session identifier minted by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh locally generated identifier, for fetchers that have no native
    /// session concept.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fetched resource as reported by the fetcher.
#[derive(Debug, Clone)]
pub struct DocumentEvent {
    pub url: String,
    pub http_status: u16,
    pub mime: String,
}

impl DocumentEvent {
    #[must_use]
    pub fn new(url: impl Into<String>, http_status: u16, mime: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_status,
            mime: mime.into(),
        }
    }
}

/// The sink's verdict on a fetched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDirective {
    /// Keep the document and continue crawling.
    Continue,
    /// Drop the document; the fetcher should not follow its links.
    Skip,
}

/// Receiver for discovery events during a crawl run.
#[async_trait]
pub trait DocumentSink: Send {
    async fn on_document(&mut self, event: DocumentEvent) -> FetchDirective;
}

/// The external crawl loop.
///
/// Implementations own fetching, politeness and timeouts; the catalog side
/// only consumes the event stream.
#[async_trait]
pub trait PageFetcher: Send {
    /// Begin a fresh session at `seed_url` and return its id.
    async fn start(&mut self, seed_url: &str) -> Result<SessionId>;

    /// Pick up a previously interrupted session.
    async fn resume(&mut self, session: &SessionId) -> Result<()>;

    /// Patterns for URLs the fetcher should not visit at all.
    fn set_exclude_patterns(&mut self, patterns: &[String]);

    /// Additional entry points beyond the seed.
    fn add_seed_urls(&mut self, seeds: &[String]);

    /// Drive the crawl to completion, reporting every fetched resource to
    /// `sink`. Returns when the frontier is exhausted or fails with the
    /// underlying fetch error, leaving the session resumable.
    async fn run(&mut self, sink: &mut dyn DocumentSink) -> Result<()>;
}
