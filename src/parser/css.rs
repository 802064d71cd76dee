//! CSS `url(...)` reference extraction for inline styles and `<style>` blocks.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// Matches `url(x)`, `url('x')` and `url("x")`, case-insensitively.
#[allow(clippy::expect_used)]
static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]*))\s*\)"#)
        .expect("CSS url regex is valid") // Static pattern, safe to panic
});

/// Returns every non-empty `url(...)` reference in `css`, in source order.
#[must_use]
pub(crate) fn css_urls(css: &str) -> Vec<String> {
    let urls: Vec<String> = CSS_URL_PATTERN
        .captures_iter(css)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    trace!(count = urls.len(), "css url references");
    urls
}
