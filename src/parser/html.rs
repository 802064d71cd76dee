//! HTML walk collecting raw image references in document order.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::css::css_urls;
use super::srcset::parse_srcset;
use super::CandidateSource;

/// Lazy-loading attributes carrying a single image URL.
const LAZY_SRC_ATTRS: [&str; 4] = ["data-src", "data-original", "data-lazy", "data-original-src"];

/// Attributes carrying a `srcset`-style list.
const SRCSET_ATTRS: [&str; 2] = ["srcset", "data-srcset"];

/// `<meta>` property/name values pointing at a preview image.
const META_IMAGE_KEYS: [&str; 5] = [
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];

#[allow(clippy::expect_used)]
static ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("base[href], img, source, meta[content], style, [style]")
        .expect("element selector is valid") // Static selector, safe to panic
});

/// An unresolved reference as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawReference {
    pub value: String,
    pub source: CandidateSource,
}

/// References found in one document plus its first `<base href>`.
#[derive(Debug, Default)]
pub(crate) struct DocumentReferences {
    pub base_href: Option<String>,
    pub references: Vec<RawReference>,
}

/// Parses `html` and collects image references in document order.
pub(crate) fn collect_references(html: &str) -> DocumentReferences {
    let document = Html::parse_document(html);
    let mut base_href = None;
    let mut references = Vec::new();

    for element in document.select(&ELEMENTS) {
        let mut push = |value: &str, source: CandidateSource| {
            references.push(RawReference {
                value: value.to_string(),
                source,
            });
        };

        match element.value().name() {
            "base" => {
                if base_href.is_none() {
                    base_href = element.value().attr("href").map(str::to_string);
                }
            }
            "img" => {
                if let Some(src) = element.value().attr("src") {
                    push(src, CandidateSource::ImgSrc);
                }
                for attr in LAZY_SRC_ATTRS {
                    if let Some(value) = element.value().attr(attr) {
                        push(value, CandidateSource::ImgLazy);
                    }
                }
                for attr in SRCSET_ATTRS {
                    if let Some(value) = element.value().attr(attr) {
                        for url in parse_srcset(value) {
                            push(&url, CandidateSource::Srcset);
                        }
                    }
                }
            }
            "source" if inside_picture(element) => {
                for attr in SRCSET_ATTRS {
                    if let Some(value) = element.value().attr(attr) {
                        for url in parse_srcset(value) {
                            push(&url, CandidateSource::PictureSource);
                        }
                    }
                }
            }
            "meta" => {
                let key = element
                    .value()
                    .attr("property")
                    .or_else(|| element.value().attr("name"))
                    .map(str::to_ascii_lowercase);
                if key.is_some_and(|k| META_IMAGE_KEYS.contains(&k.as_str()))
                    && let Some(content) = element.value().attr("content")
                {
                    push(content, CandidateSource::MetaTag);
                }
            }
            "style" => {
                let css: String = element.text().collect();
                for url in css_urls(&css) {
                    push(&url, CandidateSource::StyleBlock);
                }
            }
            _ => {}
        }

        if let Some(style) = element.value().attr("style") {
            for url in css_urls(style) {
                push(&url, CandidateSource::InlineStyle);
            }
        }
    }

    debug!(
        references = references.len(),
        base_href = ?base_href,
        "collected image references"
    );
    DocumentReferences {
        base_href,
        references,
    }
}

fn inside_picture(element: ElementRef<'_>) -> bool {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|parent| parent.value().name() == "picture")
}
