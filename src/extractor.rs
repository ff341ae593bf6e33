//! Field extraction from a fetched article page.
//!
//! Every field is read through an ordered chain of [`Probe`]s, most specific
//! first, and the first probe yielding non-empty text wins. The order matters:
//! site templates differ, and a specific selector must beat a generic
//! catch-all that happens to match too.
//!
//! | Field | Chain |
//! |-------|-------|
//! | title | `h1`, `.topic-title`, `.article-title`, `og:title`, `<title>` |
//! | author | `a[rel=author]`, `.author`, `.byline`, `meta[name=author]` |
//! | date | `time` text, `time[datetime]`, `article:published_time`, `.post-date`, `.date` |
//! | body | `article`, `[itemprop=articleBody]`, `.topic-body`, `.post`, `.cooked`, `.article__content`, `.entry-content` |
//!
//! Author and date are optional. The body is required: the first container
//! whose cleaned text reaches the minimum length is used, and if none does the
//! whole extraction fails.

use crate::models::ExtractedFields;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// Where a probe reads its value from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Whitespace-collapsed text content.
    Text,
    /// Value of the named attribute.
    Attr(&'static str),
}

/// One step of a fallback chain: the first element matching `selector` with a
/// non-empty value.
#[derive(Debug)]
pub struct Probe {
    pub selector: Selector,
    pub source: Source,
}

impl Probe {
    fn new(selector: &str, source: Source) -> Self {
        Self {
            selector: Selector::parse(selector).unwrap(),
            source,
        }
    }

    pub fn apply(&self, document: &Html) -> Option<String> {
        document.select(&self.selector).find_map(|el| {
            let value = match self.source {
                Source::Text => collapse_whitespace(el.text()),
                Source::Attr(name) => collapse_whitespace(el.value().attr(name)),
            };
            (!value.is_empty()).then_some(value)
        })
    }
}

pub static TITLE_CHAIN: Lazy<Vec<Probe>> = Lazy::new(|| {
    vec![
        Probe::new("h1", Source::Text),
        Probe::new(".topic-title", Source::Text),
        Probe::new(".article-title", Source::Text),
        Probe::new("meta[property='og:title']", Source::Attr("content")),
        Probe::new("title", Source::Text),
    ]
});

pub static AUTHOR_CHAIN: Lazy<Vec<Probe>> = Lazy::new(|| {
    vec![
        Probe::new("a[rel='author']", Source::Text),
        Probe::new(".author", Source::Text),
        Probe::new(".byline", Source::Text),
        Probe::new("meta[name='author']", Source::Attr("content")),
    ]
});

pub static DATE_CHAIN: Lazy<Vec<Probe>> = Lazy::new(|| {
    vec![
        Probe::new("time", Source::Text),
        Probe::new("time[datetime]", Source::Attr("datetime")),
        Probe::new(
            "meta[property='article:published_time']",
            Source::Attr("content"),
        ),
        Probe::new(".post-date", Source::Text),
        Probe::new(".date", Source::Text),
    ]
});

pub static CONTENT_CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "[itemprop='articleBody']",
        ".topic-body",
        ".post",
        ".cooked",
        ".article__content",
        ".entry-content",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static BLOCKS: Lazy<Selector> = Lazy::new(|| Selector::parse("p, h2, h3").unwrap());

/// Elements whose text never counts as article content.
const STRIPPED_TAGS: &[&str] = &["script", "style", "aside", "noscript"];

/// First non-empty value of a chain.
pub fn first_match(chain: &[Probe], document: &Html) -> Option<String> {
    chain.iter().find_map(|probe| probe.apply(document))
}

/// Extracts [`ExtractedFields`] with a minimum body length gate.
#[derive(Debug, Clone, Copy)]
pub struct ContentExtractor {
    min_content_length: usize,
}

impl ContentExtractor {
    /// Extractor that accepts a body container of at least
    /// `min_content_length` characters.
    pub fn new(min_content_length: usize) -> Self {
        Self { min_content_length }
    }

    /// `None` when no content container meets the minimum length.
    ///
    /// A missing title does not fail extraction; it comes back empty and the
    /// assembler rejects the record.
    pub fn extract(&self, html: &str) -> Option<ExtractedFields> {
        let document = Html::parse_document(html);
        let content = self.extract_body(&document)?;

        Some(ExtractedFields {
            title: first_match(&TITLE_CHAIN, &document).unwrap_or_default(),
            author: first_match(&AUTHOR_CHAIN, &document),
            date_published: first_match(&DATE_CHAIN, &document),
            content,
        })
    }

    /// Text of the first container that reaches the minimum length. Only the
    /// first element matched by each container selector is considered.
    pub fn extract_body(&self, document: &Html) -> Option<String> {
        for (rank, selector) in CONTENT_CONTAINERS.iter().enumerate() {
            let Some(container) = document.select(selector).next() else {
                continue;
            };
            let text = container_text(container);
            let chars = text.chars().count();
            if chars >= self.min_content_length {
                debug!(rank, chars, "Content container accepted");
                return Some(text);
            }
            debug!(rank, chars, min = self.min_content_length, "Content container too short");
        }
        None
    }
}

/// Paragraphs and sub-headings of `container`, blank-line separated, with
/// script, style and aside content removed.
pub fn container_text(container: ElementRef<'_>) -> String {
    container
        .select(&BLOCKS)
        .filter(|block| {
            !block
                .ancestors()
                .take_while(|a| a.id() != container.id())
                .any(|a| is_stripped(a.value()))
        })
        .map(block_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn block_text(block: ElementRef<'_>) -> String {
    let words: Vec<&str> = block
        .descendants()
        .filter(|n| {
            !n.ancestors()
                .take_while(|a| a.id() != block.id())
                .any(|a| is_stripped(a.value()))
        })
        .filter_map(|n| n.value().as_text())
        .flat_map(|t| t.split_whitespace())
        .collect();
    words.join(" ")
}

fn is_stripped(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| STRIPPED_TAGS.contains(&e.name()))
}

fn collapse_whitespace<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
