//! Built-in normalization rules.

use super::{NormalizationRule, NormalizeError};
use crate::catalog::types::UrlEntry;

/// Base rule: strips the final extension from the path portion of a URL and
/// applies the common post-processing pass.
///
/// The query string, when present, is preserved untouched; only the path in
/// front of the `?` is extension-stripped. The strip targets the rightmost
/// dot inside the final path segment, so a multi-dot filename loses only its
/// last suffix (`test.tar.gz` becomes `test.tar`).
#[derive(Debug)]
pub struct ExtensionStripRule;

impl ExtensionStripRule {
    pub const ID: &'static str = "extension-strip";
}

impl NormalizationRule for ExtensionStripRule {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn process(&self, raw: &str, mime: &str) -> Result<UrlEntry, NormalizeError> {
        if raw.trim().is_empty() {
            return Err(NormalizeError::EmptyUrl);
        }

        let stripped = match raw.split_once('?') {
            Some((path, query)) => format!("{}?{}", strip_extension(path), query),
            None => strip_extension(raw).to_string(),
        };

        Ok(UrlEntry::new(post_process(&stripped), mime))
    }
}

/// CMS rule: removes literal `/Pages/` path segments left behind by the
/// source platform, then delegates to [`ExtensionStripRule`].
///
/// Delegation happens after the segment rewrite so the base rule's
/// post-processing is always the last step.
#[derive(Debug)]
pub struct PagesStripRule {
    base: ExtensionStripRule,
}

impl PagesStripRule {
    pub const ID: &'static str = "pages-strip";

    const SEGMENT: &'static str = "/Pages/";

    #[must_use]
    pub fn new() -> Self {
        Self {
            base: ExtensionStripRule,
        }
    }
}

impl Default for PagesStripRule {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizationRule for PagesStripRule {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn process(&self, raw: &str, mime: &str) -> Result<UrlEntry, NormalizeError> {
        let rewritten = raw.replace(Self::SEGMENT, "/");
        self.base.process(&rewritten, mime)
    }
}

/// Remove the single final suffix segment from a path.
///
/// Only the rightmost dot after the last path separator counts, so dots in
/// directory names never trigger a strip.
fn strip_extension(path: &str) -> &str {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].rfind('.') {
        Some(dot) => &path[..segment_start + dot],
        None => path,
    }
}

/// Common post-processing applied after every rule.
///
/// Order matters: `%2F` decodes to a separator before slash runs are
/// collapsed, and bracket characters are dropped in between.
fn post_process(url: &str) -> String {
    let mut out = url.replace("%2F", "/").replace("%2f", "/");
    for token in ["(", ")", "%28"] {
        out = out.replace(token, "");
    }
    collapse_slashes(&out)
}

/// Collapse any run of two or more slashes into one, keeping the scheme
/// delimiter intact.
fn collapse_slashes(url: &str) -> String {
    let (head, tail) = match url.find("://") {
        Some(i) => url.split_at(i + 3),
        None => ("", url),
    };

    let mut out = String::with_capacity(url.len());
    out.push_str(head);
    let mut previous_was_slash = false;
    for c in tail.chars() {
        if c == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        out.push(c);
    }
    out
}
