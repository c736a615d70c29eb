//! Crawl session control.
//!
//! The controller drives the external [`PageFetcher`] collaborator, decides
//! per discovery event whether the document is cataloged or discarded, and
//! persists the catalog after every successful cataloging step so an
//! interruption loses at most the in-flight fetch.
//!
//! Status is never stored: a session marker written before the first fetch
//! and deleted on graceful completion, combined with the presence of the
//! catalog file, derives `NotStarted`/`Partial`/`Complete`.

pub mod fetcher;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::catalog::UrlCatalog;
use crate::catalog::store::{CatalogStore, SessionMarker};
use crate::catalog::types::SpiderStatus;
use crate::config::CatalogConfig;
use crate::normalize::{NormalizationRule, RuleRegistry};
use self::fetcher::{DocumentEvent, DocumentSink, FetchDirective, PageFetcher};

/// Per-run discovery counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlStats {
    pub pages_seen: usize,
    pub pages_cataloged: usize,
    pub pages_skipped: usize,
}

/// Outcome of a completed session run.
pub struct CrawlReport {
    pub catalog: UrlCatalog,
    pub stats: CrawlStats,
}

/// Drives one catalog crawl against a [`PageFetcher`].
pub struct CrawlSessionController<F: PageFetcher> {
    config: CatalogConfig,
    store: CatalogStore,
    rule: Arc<dyn NormalizationRule>,
    fetcher: F,
}

impl<F: PageFetcher> CrawlSessionController<F> {
    /// Controller using the built-in rule registry.
    pub fn new(config: CatalogConfig, fetcher: F) -> Result<Self> {
        Self::with_registry(config, fetcher, &RuleRegistry::with_defaults())
    }

    /// Controller resolving the configured rule from a caller-supplied
    /// registry. An unknown rule id is a configuration-time error.
    pub fn with_registry(
        config: CatalogConfig,
        fetcher: F,
        registry: &RuleRegistry,
    ) -> Result<Self> {
        let rule = registry
            .get(config.rule_id())
            .context("failed to resolve the configured normalization rule")?;
        let store = CatalogStore::new(config.storage_dir());
        Ok(Self {
            config,
            store,
            rule,
            fetcher,
        })
    }

    /// Current derived crawl status.
    #[must_use]
    pub fn spider_status(&self) -> SpiderStatus {
        self.store.spider_status()
    }

    #[must_use]
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Start or resume the crawl, depending on whether a session marker is
    /// present, and run it to completion.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        let mut catalog;

        match self.store.load_marker().await {
            Some(marker) => {
                info!(
                    "resuming crawl session {} for {}",
                    marker.session_id, marker.seed_url
                );
                if marker.seed_url != self.config.seed_url() {
                    warn!(
                        "session marker was created for {}, config now seeds {}",
                        marker.seed_url,
                        self.config.seed_url()
                    );
                }
                let (regular, inferred) = self.store.load().await;
                catalog = UrlCatalog::from_parts(
                    self.config.base_url().clone(),
                    Arc::clone(&self.rule),
                    regular,
                    inferred,
                );
                self.fetcher
                    .resume(&marker.session_id)
                    .await
                    .context("crawler failed to resume session")?;
            }
            None => {
                catalog = UrlCatalog::new(self.config.base_url().clone(), Arc::clone(&self.rule));
                let seed = self.config.seed_url().to_string();
                let session_id = self
                    .fetcher
                    .start(&seed)
                    .await
                    .context("crawler failed to start session")?;
                info!("starting crawl session {session_id} for {seed}");
                // Marker goes down before the first fetch so even an
                // immediate interruption stays resumable.
                let marker = SessionMarker::new(session_id, seed);
                self.store.save_marker(&marker).await?;
            }
        }

        self.fetcher
            .set_exclude_patterns(self.config.exclude_patterns());
        self.fetcher.add_seed_urls(self.config.extra_seeds());

        let mut stats = CrawlStats::default();
        {
            let mut sink = CatalogSink {
                catalog: &mut catalog,
                store: &self.store,
                config: &self.config,
                stats: &mut stats,
            };
            self.fetcher
                .run(&mut sink)
                .await
                .context("crawl run failed; session marker left in place for resume")?;
        }

        // A run that discovered nothing still leaves a catalog file, so the
        // status flips to Complete rather than back to NotStarted.
        self.store.save(&catalog).await?;
        self.store.clear_marker().await?;
        info!(
            "crawl complete: {} cataloged, {} skipped of {} seen",
            stats.pages_cataloged, stats.pages_skipped, stats.pages_seen
        );

        Ok(CrawlReport { catalog, stats })
    }

    /// Discard all persisted state and crawl from scratch.
    pub async fn recrawl(&mut self) -> Result<CrawlReport> {
        self.store.discard().await?;
        self.run().await
    }
}

struct CatalogSink<'a> {
    catalog: &'a mut UrlCatalog,
    store: &'a CatalogStore,
    config: &'a CatalogConfig,
    stats: &'a mut CrawlStats,
}

#[async_trait::async_trait]
impl DocumentSink for CatalogSink<'_> {
    async fn on_document(&mut self, event: DocumentEvent) -> FetchDirective {
        self.stats.pages_seen += 1;

        if let Some(limit) = self.config.limit() {
            if self.stats.pages_cataloged >= limit {
                debug!("page limit of {limit} reached, skipping {}", event.url);
                self.stats.pages_skipped += 1;
                return FetchDirective::Skip;
            }
        }

        if self.config.is_excluded(&event.url) {
            debug!("excluded by pattern: {}", event.url);
            self.stats.pages_skipped += 1;
            return FetchDirective::Skip;
        }

        let ok_status = (200..=299).contains(&event.http_status);
        if !ok_status && !is_recoverable_url(&event.url) {
            info!(
                "discarding {} (status {})",
                event.url, event.http_status
            );
            self.stats.pages_skipped += 1;
            return FetchDirective::Skip;
        }

        if let Err(err) = self.catalog.add_url(&event.url, &event.mime) {
            warn!("skipping {}: {err}", event.url);
            self.stats.pages_skipped += 1;
            return FetchDirective::Skip;
        }

        // Crash-safety over throughput: persist after every cataloged
        // document. A failed write is loud but does not abort the crawl;
        // the next successful save covers it.
        if let Err(err) = self.store.save(self.catalog).await {
            error!("failed to persist catalog after {}: {err}", event.url);
        }

        self.stats.pages_cataloged += 1;
        FetchDirective::Continue
    }
}

/// Bad-status URLs containing literal or percent-encoded parentheses may
/// still resolve once normalized, so they are cataloged rather than
/// discarded.
fn is_recoverable_url(url: &str) -> bool {
    url.contains('(') || url.contains(')') || url.contains("%28") || url.contains("%29")
}
