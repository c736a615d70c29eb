//! Parent computation for processed URLs.
//!
//! Every processed URL in the catalog must have a path to the root. The
//! functions here compute the immediate parent of a processed URL and the
//! entry an inferred ancestor should carry; the catalog performs the actual
//! backfill iteratively on every insertion.

use super::types::{MIME_UNKNOWN, UrlEntry};

/// The hierarchy root. Its own parent is a synthetic sentinel that is never
/// stored.
pub const ROOT_URL: &str = "/";

/// HTML-family MIME types propagate from a child to its inferred parent;
/// anything else assigns the parent the `unknown` sentinel.
#[must_use]
pub fn is_html_mime(mime: &str) -> bool {
    mime.starts_with("text/html") || mime.starts_with("application/xhtml")
}

/// Compute the parent of a processed URL.
///
/// Returns `None` for the root. Otherwise the breakpoint is the rightmost
/// `?` or `/`: at position zero the parent is the root, anywhere else the
/// parent is the prefix before it. Each parent is strictly shorter than its
/// child and the root is a fixed point, so walking parents terminates.
#[must_use]
pub fn parent_url(processed: &str) -> Option<String> {
    if processed == ROOT_URL {
        return None;
    }
    let breakpoint = processed.rfind(['?', '/'])?;
    if breakpoint == 0 {
        Some(ROOT_URL.to_string())
    } else {
        Some(processed[..breakpoint].to_string())
    }
}

/// The entry an inferred parent of `child` should carry.
#[must_use]
pub fn parent_entry(child: &UrlEntry) -> Option<UrlEntry> {
    let url = parent_url(&child.url)?;
    if is_html_mime(&child.mime) {
        Some(UrlEntry::new(url, child.mime.clone()))
    } else {
        Some(UrlEntry::new(url, MIME_UNKNOWN))
    }
}

/// True when `candidate` sits exactly one path/query segment below `parent`.
///
/// When the parent already ends in a separator the candidate's remainder
/// must be a single non-separator run; otherwise the remainder must start
/// with a separator followed by one.
#[must_use]
pub fn is_direct_child(parent: &str, candidate: &str) -> bool {
    if candidate == parent {
        return false;
    }
    let Some(rest) = candidate.strip_prefix(parent) else {
        return false;
    };

    let tail = if parent.ends_with('/') || parent.ends_with('?') {
        rest
    } else {
        let mut chars = rest.chars();
        match chars.next() {
            Some('/' | '?') => chars.as_str(),
            _ => return false,
        }
    };

    !tail.is_empty() && !tail.contains(['/', '?'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_stored_parent() {
        assert_eq!(parent_url(ROOT_URL), None);
    }

    #[test]
    fn top_level_urls_parent_to_root() {
        assert_eq!(parent_url("/a").as_deref(), Some(ROOT_URL));
    }

    #[test]
    fn breakpoint_is_rightmost_separator() {
        assert_eq!(parent_url("/a/b/c").as_deref(), Some("/a/b"));
        assert_eq!(parent_url("/a/b?x=1").as_deref(), Some("/a/b"));
        assert_eq!(parent_url("/a?x/y").as_deref(), Some("/a?x"));
    }

    #[test]
    fn html_mime_propagates_to_parent() {
        let child = UrlEntry::new("/a/b", "text/html; charset=utf-8");
        let parent = parent_entry(&child).unwrap();
        assert_eq!(parent.url, "/a");
        assert_eq!(parent.mime, "text/html; charset=utf-8");
    }

    #[test]
    fn non_html_mime_does_not_poison_parent() {
        let child = UrlEntry::new("/images/test", "image/png");
        let parent = parent_entry(&child).unwrap();
        assert_eq!(parent.mime, MIME_UNKNOWN);
    }

    #[test]
    fn direct_child_matching_respects_separators() {
        assert!(is_direct_child("/a", "/a/b"));
        assert!(is_direct_child("/a", "/a?page=2"));
        assert!(is_direct_child("/", "/a"));
        assert!(!is_direct_child("/a", "/a/b/c"));
        assert!(!is_direct_child("/a", "/ab"));
        assert!(!is_direct_child("/a", "/a"));
        assert!(!is_direct_child("/", "/a/b"));
    }
}
