//! Test utilities shared by the sitecatalog test suite.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use sitecatalog::{
    CatalogConfig, DocumentEvent, DocumentSink, FetchDirective, PageFetcher, SessionId,
};

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Config rooted at the given directory for the fixture site.
#[allow(dead_code)]
pub fn fluff_config(dir: &TempDir) -> CatalogConfig {
    CatalogConfig::builder()
        .storage_dir(dir.path())
        .base_url("http://fluff.com")
        .build()
        .unwrap()
}

/// What a [`ScriptedFetcher`] observed, shared with the test body.
#[derive(Debug, Default)]
pub struct FetcherLog {
    pub started: Vec<String>,
    pub resumed: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub extra_seeds: Vec<String>,
    pub directives: Vec<FetchDirective>,
}

/// In-memory fetcher that replays a fixed list of document events.
///
/// `fail_after` simulates an interrupted crawl: the run errors out once
/// that many events have been delivered.
pub struct ScriptedFetcher {
    pub events: Vec<DocumentEvent>,
    pub fail_after: Option<usize>,
    pub log: Arc<Mutex<FetcherLog>>,
}

impl ScriptedFetcher {
    #[allow(dead_code)]
    pub fn new(events: Vec<DocumentEvent>) -> (Self, Arc<Mutex<FetcherLog>>) {
        let log = Arc::new(Mutex::new(FetcherLog::default()));
        (
            Self {
                events,
                fail_after: None,
                log: Arc::clone(&log),
            },
            log,
        )
    }

    #[allow(dead_code)]
    pub fn failing_after(mut self, delivered: usize) -> Self {
        self.fail_after = Some(delivered);
        self
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn start(&mut self, seed_url: &str) -> Result<SessionId> {
        self.log.lock().unwrap().started.push(seed_url.to_string());
        Ok(SessionId::new("scripted-session"))
    }

    async fn resume(&mut self, session: &SessionId) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .resumed
            .push(session.as_str().to_string());
        Ok(())
    }

    fn set_exclude_patterns(&mut self, patterns: &[String]) {
        self.log.lock().unwrap().exclude_patterns = patterns.to_vec();
    }

    fn add_seed_urls(&mut self, seeds: &[String]) {
        self.log.lock().unwrap().extra_seeds = seeds.to_vec();
    }

    async fn run(&mut self, sink: &mut dyn DocumentSink) -> Result<()> {
        for (delivered, event) in self.events.iter().enumerate() {
            if let Some(limit) = self.fail_after {
                if delivered >= limit {
                    anyhow::bail!("simulated crawl interruption");
                }
            }
            let directive = sink.on_document(event.clone()).await;
            self.log.lock().unwrap().directives.push(directive);
        }
        Ok(())
    }
}
