//! Image reference extraction from a single HTML page.
//!
//! [`extract_candidates`] parses the page once and returns a lazy iterator of
//! [`ImageCandidate`]s in document order. Each reference is resolved against
//! the page URL (or the document's `<base href>`), and duplicates by absolute
//! URL are dropped as the iterator advances.
//!
//! # Sources
//!
//! - `<img src>` and lazy-loading attributes (`data-src`, `data-original`, ...)
//! - `srcset` / `data-srcset` on `<img>`, and `<source srcset>` inside `<picture>`
//! - `og:image` / `twitter:image` `<meta>` tags
//! - CSS `url(...)` in `style` attributes and `<style>` blocks
//!
//! # Example
//!
//! ```
//! use imgfetch_core::parser::extract_candidates;
//! use url::Url;
//!
//! let base = Url::parse("https://example.com/page").unwrap();
//! let html = r#"<img src="/img/a.png"><img src="/img/a.png"><img src="b.png">"#;
//! let urls: Vec<String> = extract_candidates(html, &base)
//!     .map(|c| c.url.to_string())
//!     .collect();
//! assert_eq!(urls, ["https://example.com/img/a.png", "https://example.com/b.png"]);
//! ```

mod css;
mod html;
mod srcset;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::trace;
use url::Url;

use crate::download::filename::extension_from_url;
use html::{RawReference, collect_references};

/// Where in the document a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// `<img src>`
    ImgSrc,
    /// `<img data-src>` and similar lazy-loading attributes
    ImgLazy,
    /// `<img srcset>` / `<img data-srcset>`
    Srcset,
    /// `<picture><source srcset>`
    PictureSource,
    /// `og:image` / `twitter:image` meta tags
    MetaTag,
    /// `url(...)` in a `style` attribute
    InlineStyle,
    /// `url(...)` in a `<style>` block
    StyleBlock,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ImgSrc => "img[src]",
            Self::ImgLazy => "img[data-src]",
            Self::Srcset => "img[srcset]",
            Self::PictureSource => "picture>source",
            Self::MetaTag => "meta",
            Self::InlineStyle => "style attribute",
            Self::StyleBlock => "style block",
        };
        f.write_str(label)
    }
}

/// A discovered image URL, before filtering and downloading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageCandidate {
    /// Absolute URL, fragment stripped.
    pub url: Url,
    /// Tag/attribute the reference came from.
    pub source: CandidateSource,
    /// Extension inferred from the URL path, with leading dot.
    pub extension: Option<String>,
}

impl ImageCandidate {
    /// Creates a candidate, inferring the extension from the URL.
    #[must_use]
    pub fn new(url: Url, source: CandidateSource) -> Self {
        let extension = extension_from_url(&url);
        Self {
            url,
            source,
            extension,
        }
    }

    /// Host of the candidate URL.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }
}

/// Lazy, deduplicating iterator over a page's image candidates.
#[derive(Debug)]
pub struct Candidates {
    base: Url,
    references: std::vec::IntoIter<RawReference>,
    seen: HashSet<String>,
}

impl Iterator for Candidates {
    type Item = ImageCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        for raw in self.references.by_ref() {
            let Some(url) = resolve_reference(&self.base, &raw.value) else {
                trace!(value = %raw.value, "skipping unresolvable reference");
                continue;
            };
            if !self.seen.insert(url.as_str().to_string()) {
                trace!(url = %url, "skipping duplicate reference");
                continue;
            }
            return Some(ImageCandidate::new(url, raw.source));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.references.len()))
    }
}

/// Extracts image candidates from `html` served at `page_url`.
#[must_use]
pub fn extract_candidates(html: &str, page_url: &Url) -> Candidates {
    let document = collect_references(html);
    let base = document
        .base_href
        .as_deref()
        .and_then(|href| page_url.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or_else(|| page_url.clone());

    Candidates {
        base,
        references: document.references.into_iter(),
        seen: HashSet::new(),
    }
}

/// Resolves one raw reference against `base`.
///
/// Returns `None` for empty values, fragment-only references, data URIs, and
/// anything that does not resolve to an `http`/`https` URL.
#[must_use]
pub fn resolve_reference(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    if raw
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
    {
        return None;
    }

    let mut url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
