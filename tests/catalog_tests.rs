//! Catalog-level properties: parent closure, idempotence, children queries.

use std::sync::Arc;

use tempfile::TempDir;
use url::Url;

use sitecatalog::catalog::hierarchy;
use sitecatalog::{CatalogStore, ExtensionStripRule, MIME_UNKNOWN, PagesStripRule, UrlCatalog};

fn fluff_catalog() -> UrlCatalog {
    UrlCatalog::new(
        Url::parse("http://fluff.com").unwrap(),
        Arc::new(ExtensionStripRule),
    )
}

fn assert_parent_closed(catalog: &UrlCatalog) {
    for entry in catalog.entries() {
        let mut cursor = entry.url.clone();
        while let Some(parent) = hierarchy::parent_url(&cursor) {
            assert!(
                catalog.has_processed_url(&parent),
                "parent '{parent}' of '{cursor}' is missing"
            );
            cursor = parent;
        }
    }
}

#[test]
fn catalog_is_parent_closed_after_arbitrary_adds() {
    let mut catalog = fluff_catalog();
    catalog.add_url("/deep/nested/page/leaf.html", "text/html").unwrap();
    catalog.add_url("/images/photo.png", "image/png").unwrap();
    catalog.add_url("/a", "text/html").unwrap();
    catalog.add_url("/search?page=2", "text/html").unwrap();

    assert_parent_closed(&catalog);
}

#[test]
fn children_are_correct_regardless_of_insertion_order() {
    let orders: [[&str; 3]; 3] = [
        ["/a", "/a/b", "/a/b/c"],
        ["/a/b/c", "/a/b", "/a"],
        ["/a/b", "/a/b/c", "/a"],
    ];

    for order in orders {
        let mut catalog = fluff_catalog();
        for raw in order {
            catalog.add_url(raw, "text/html").unwrap();
        }
        assert_eq!(
            catalog.children_of("/a"),
            vec!["/a/b".to_string()],
            "insertion order {order:?}"
        );
        assert_eq!(
            catalog.children_of("/a/b"),
            vec!["/a/b/c".to_string()],
            "insertion order {order:?}"
        );
    }
}

#[test]
fn re_adding_a_raw_url_is_idempotent() {
    let mut catalog = fluff_catalog();
    catalog.add_url("/a/b.html", "text/html").unwrap();
    let before: Vec<_> = catalog.entries().cloned().collect();

    catalog.add_url("/a/b.html", "text/html").unwrap();
    let after: Vec<_> = catalog.entries().cloned().collect();

    assert_eq!(before, after);
    assert_eq!(catalog.len(), 1);
}

#[test]
fn inferred_parent_of_image_carries_unknown_mime() {
    let mut catalog = fluff_catalog();
    catalog.add_url("/images/test.png", "image/png").unwrap();

    let parent = catalog.processed_url("/images").unwrap();
    assert_eq!(parent.mime, MIME_UNKNOWN);
}

#[test]
fn inferred_parent_of_page_inherits_html_mime() {
    let mut catalog = fluff_catalog();
    catalog.add_url("/docs/guide.html", "text/html").unwrap();

    let parent = catalog.processed_url("/docs").unwrap();
    assert_eq!(parent.mime, "text/html");
}

#[tokio::test]
async fn double_reprocess_persists_byte_identical_state() {
    let dir = TempDir::new().unwrap();
    let store = CatalogStore::new(dir.path());

    let mut catalog = UrlCatalog::new(
        Url::parse("http://fluff.com").unwrap(),
        Arc::new(PagesStripRule::new()),
    );
    catalog.add_url("/Pages/test(1).aspx", "text/html").unwrap();
    catalog.add_url("/Pages/sub/other.aspx", "text/html").unwrap();
    catalog.add_url("/files/report.pdf", "application/pdf").unwrap();

    catalog.reprocess_urls();
    store.save(&catalog).await.unwrap();
    let first = tokio::fs::read_to_string(store.catalog_path()).await.unwrap();

    catalog.reprocess_urls();
    store.save(&catalog).await.unwrap();
    let second = tokio::fs::read_to_string(store.catalog_path()).await.unwrap();

    assert_eq!(first, second);
    assert_parent_closed(&catalog);
}

#[test]
fn reprocess_discards_stale_inferred_entries() {
    let mut catalog = fluff_catalog();
    catalog.add_url("/a/b/c.html", "text/html").unwrap();
    catalog.add_inferred(sitecatalog::UrlEntry::with_unknown_mime("/orphaned/branch"));
    assert!(catalog.has_processed_url("/orphaned/branch"));

    catalog.reprocess_urls();

    // Only ancestors of regular entries survive a reprocess.
    assert!(!catalog.has_processed_url("/orphaned/branch"));
    assert!(catalog.has_processed_url("/a/b"));
    assert_parent_closed(&catalog);
}

#[test]
fn add_inferred_never_shadows_an_existing_entry() {
    let mut catalog = fluff_catalog();
    catalog.add_url("/a.html", "text/html").unwrap();

    catalog.add_inferred(sitecatalog::UrlEntry::with_unknown_mime("/a"));
    let entry = catalog.processed_url("/a.html").unwrap();
    assert_eq!(entry.mime, "text/html");
    assert_eq!(catalog.inferred_len(), 1); // just the root
}
