//! Catalog and session-marker persistence.
//!
//! Both artifacts live in the configured storage directory: the catalog as
//! one JSON blob holding the `regular` and `inferred` maps, the session
//! marker as a small JSON token whose mere presence means an interrupted,
//! resumable crawl. Writes use the write-to-temp-then-rename pattern so a
//! crash never leaves a corrupt file under the final name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::CatalogError;
use super::UrlCatalog;
use super::types::{SpiderStatus, UrlEntry};
use crate::session::fetcher::SessionId;

const CATALOG_FILENAME: &str = "url_catalog.json";
const MARKER_FILENAME: &str = "crawl_session.json";

/// Serialized catalog shape. Older cache formats may lack these keys, in
/// which case loading resets to an empty catalog instead of failing.
#[derive(Serialize, Deserialize)]
struct CatalogFile {
    regular: BTreeMap<String, UrlEntry>,
    inferred: BTreeMap<String, UrlEntry>,
}

/// Borrowed view for serialization, to avoid cloning both maps on every
/// save.
#[derive(Serialize)]
struct CatalogFileRef<'a> {
    regular: &'a BTreeMap<String, UrlEntry>,
    inferred: &'a BTreeMap<String, UrlEntry>,
}

/// Persisted token marking an in-progress, resumable crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMarker {
    pub session_id: SessionId,
    pub seed_url: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,
}

impl SessionMarker {
    #[must_use]
    pub fn new(session_id: SessionId, seed_url: impl Into<String>) -> Self {
        Self {
            session_id,
            seed_url: seed_url.into(),
            started_at: Utc::now(),
        }
    }
}

/// File-backed storage for one catalog and its session marker.
pub struct CatalogStore {
    storage_dir: PathBuf,
}

impl CatalogStore {
    #[must_use]
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.storage_dir.join(CATALOG_FILENAME)
    }

    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.storage_dir.join(MARKER_FILENAME)
    }

    /// Persist both maps as one atomic unit.
    pub async fn save(&self, catalog: &UrlCatalog) -> Result<(), CatalogError> {
        let blob = CatalogFileRef {
            regular: catalog.regular_map(),
            inferred: catalog.inferred_map(),
        };
        let json = serde_json::to_string_pretty(&blob)
            .map_err(|e| CatalogError::Store(format!("failed to serialize catalog: {e}")))?;
        write_atomic(&self.catalog_path(), &json).await
    }

    /// Load the persisted maps.
    ///
    /// A missing file yields empty maps (status `NotStarted`); an
    /// unreadable or old-format file is logged and likewise reset to empty
    /// rather than crashing the caller.
    pub async fn load(&self) -> (BTreeMap<String, UrlEntry>, BTreeMap<String, UrlEntry>) {
        let path = self.catalog_path();
        if !path.exists() {
            return (BTreeMap::new(), BTreeMap::new());
        }

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!("failed to read catalog at {}: {e}", path.display());
                return (BTreeMap::new(), BTreeMap::new());
            }
        };

        match serde_json::from_str::<CatalogFile>(&contents) {
            Ok(file) => (file.regular, file.inferred),
            Err(e) => {
                warn!(
                    "catalog at {} is not in the expected format, starting empty: {e}",
                    path.display()
                );
                (BTreeMap::new(), BTreeMap::new())
            }
        }
    }

    /// Write the session marker. Must happen before the first fetch of a
    /// fresh session so an early interruption is still resumable.
    pub async fn save_marker(&self, marker: &SessionMarker) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(marker)
            .map_err(|e| CatalogError::Store(format!("failed to serialize marker: {e}")))?;
        write_atomic(&self.marker_path(), &json).await
    }

    /// Read the session marker, if any. An unreadable marker is treated as
    /// absent.
    pub async fn load_marker(&self) -> Option<SessionMarker> {
        let path = self.marker_path();
        if !path.exists() {
            return None;
        }
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!("failed to read session marker at {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(marker) => Some(marker),
            Err(e) => {
                warn!("ignoring malformed session marker at {}: {e}", path.display());
                None
            }
        }
    }

    /// Delete the session marker, signalling graceful completion.
    pub async fn clear_marker(&self) -> Result<(), CatalogError> {
        let path = self.marker_path();
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path)
            .await
            .map_err(|e| CatalogError::Store(format!("failed to remove session marker: {e}")))
    }

    /// Remove catalog and marker wholesale, ahead of an explicit re-crawl.
    pub async fn discard(&self) -> Result<(), CatalogError> {
        for path in [self.catalog_path(), self.marker_path()] {
            if path.exists() {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| CatalogError::Store(format!("failed to remove {}: {e}", path.display())))?;
            }
        }
        Ok(())
    }

    /// Derive the crawl status from what is on disk.
    #[must_use]
    pub fn spider_status(&self) -> SpiderStatus {
        if !self.catalog_path().exists() {
            return SpiderStatus::NotStarted;
        }
        if self.marker_path().exists() {
            SpiderStatus::Partial
        } else {
            SpiderStatus::Complete
        }
    }

    /// Whether a finished crawl exists for this storage location.
    #[must_use]
    pub fn has_crawled(&self) -> bool {
        self.spider_status() == SpiderStatus::Complete
    }
}

/// Atomic write: temp file in the same directory, sync, rename over the
/// final name.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| CatalogError::Store(format!("failed to create {}: {e}", parent.display())))?;
    }

    let temp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| CatalogError::Store(format!("failed to create {}: {e}", temp_path.display())))?;
    file.write_all(contents.as_bytes())
        .await
        .map_err(|e| CatalogError::Store(format!("failed to write {}: {e}", temp_path.display())))?;
    file.sync_all()
        .await
        .map_err(|e| CatalogError::Store(format!("failed to sync {}: {e}", temp_path.display())))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| CatalogError::Store(format!("failed to rename into {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ExtensionStripRule;
    use std::sync::Arc;
    use tempfile::TempDir;
    use url::Url;

    fn catalog_in(dir: &TempDir) -> (CatalogStore, UrlCatalog) {
        let store = CatalogStore::new(dir.path());
        let catalog = UrlCatalog::new(
            Url::parse("http://fluff.com").unwrap(),
            Arc::new(ExtensionStripRule),
        );
        (store, catalog)
    }

    #[tokio::test]
    async fn save_then_load_round_trips_both_maps() {
        let dir = TempDir::new().unwrap();
        let (store, mut catalog) = catalog_in(&dir);
        catalog.add_url("/a/b.html", "text/html").unwrap();
        store.save(&catalog).await.unwrap();

        let (regular, inferred) = store.load().await;
        assert_eq!(regular.len(), 1);
        assert_eq!(regular["/a/b.html"].url, "/a/b");
        assert!(inferred.contains_key("/a"));
        assert!(inferred.contains_key("/"));
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_not_started() {
        let dir = TempDir::new().unwrap();
        let (store, _) = catalog_in(&dir);

        let (regular, inferred) = store.load().await;
        assert!(regular.is_empty());
        assert!(inferred.is_empty());
        assert_eq!(store.spider_status(), SpiderStatus::NotStarted);
    }

    #[tokio::test]
    async fn old_format_file_resets_to_empty() {
        let dir = TempDir::new().unwrap();
        let (store, _) = catalog_in(&dir);
        tokio::fs::write(store.catalog_path(), r#"{"urls": {}}"#)
            .await
            .unwrap();

        let (regular, inferred) = store.load().await;
        assert!(regular.is_empty());
        assert!(inferred.is_empty());
    }

    #[tokio::test]
    async fn status_follows_catalog_and_marker_presence() {
        let dir = TempDir::new().unwrap();
        let (store, catalog) = catalog_in(&dir);
        assert_eq!(store.spider_status(), SpiderStatus::NotStarted);

        store.save(&catalog).await.unwrap();
        let marker = SessionMarker::new(SessionId::new("abc"), "http://fluff.com");
        store.save_marker(&marker).await.unwrap();
        assert_eq!(store.spider_status(), SpiderStatus::Partial);
        assert!(!store.has_crawled());

        store.clear_marker().await.unwrap();
        assert_eq!(store.spider_status(), SpiderStatus::Complete);
        assert!(store.has_crawled());
    }

    #[tokio::test]
    async fn atomic_save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let (store, catalog) = catalog_in(&dir);
        store.save(&catalog).await.unwrap();

        assert!(store.catalog_path().exists());
        assert!(!store.catalog_path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn discard_removes_everything() {
        let dir = TempDir::new().unwrap();
        let (store, catalog) = catalog_in(&dir);
        store.save(&catalog).await.unwrap();
        let marker = SessionMarker::new(SessionId::new("abc"), "http://fluff.com");
        store.save_marker(&marker).await.unwrap();

        store.discard().await.unwrap();
        assert_eq!(store.spider_status(), SpiderStatus::NotStarted);
        assert!(store.load_marker().await.is_none());
    }

    #[tokio::test]
    async fn marker_round_trips_session_id_and_seed() {
        let dir = TempDir::new().unwrap();
        let (store, _) = catalog_in(&dir);
        let marker = SessionMarker::new(SessionId::new("session-7"), "http://fluff.com");
        store.save_marker(&marker).await.unwrap();

        let loaded = store.load_marker().await.unwrap();
        assert_eq!(loaded.session_id.as_str(), "session-7");
        assert_eq!(loaded.seed_url, "http://fluff.com");
    }
}
