//! HTML extraction for catalog and detail pages
//!
//! This module turns raw markup into structured data:
//! - Item links from a catalog page (absolute URLs, in page order)
//! - A [`BookRecord`] from a book detail page

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Metadata of one book, as shown on its detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    /// Absolute URL of the cover image
    pub image_url: Url,
    pub comments: Vec<String>,
    pub genres: Vec<String>,
}

/// The detail page did not have the expected structure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable page: {0}")]
pub struct Unparseable(pub String);

/// Turns a detail page into a [`BookRecord`]
pub trait DetailExtractor: Send + Sync {
    /// `page_url` is the base against which relative image sources resolve
    fn extract(&self, markup: &str, page_url: &Url) -> Result<BookRecord, Unparseable>;
}

/// Lists the item links of a catalog page
pub trait CatalogLinkExtractor: Send + Sync {
    fn extract_links(&self, markup: &str, page_url: &Url) -> Vec<Url>;
}

/// Extractor for tululu.org page layouts
///
/// # Detail page
///
/// | Field | Source |
/// |-------|--------|
/// | title, author | `h1` text, split on `::` |
/// | image | `.bookimage img[src]` |
/// | comments | `.texts span.black` |
/// | genres | `span.d_book a` |
///
/// # Catalog page
///
/// The first `a[href]` inside each `table.d_book`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TululuExtractor;

impl DetailExtractor for TululuExtractor {
    fn extract(&self, markup: &str, page_url: &Url) -> Result<BookRecord, Unparseable> {
        let document = Html::parse_document(markup);

        let heading = document
            .select(&selector("h1")?)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Unparseable("no h1 heading".to_string()))?;

        let (title, author) = heading
            .split_once("::")
            .map(|(t, a)| (clean(t), clean(a)))
            .ok_or_else(|| Unparseable(format!("heading '{}' has no '::'", heading)))?;

        if title.is_empty() {
            return Err(Unparseable("empty title".to_string()));
        }

        let image_src = document
            .select(&selector(".bookimage img[src]")?)
            .next()
            .and_then(|img| img.value().attr("src"))
            .ok_or_else(|| Unparseable("no cover image".to_string()))?;

        let image_url = page_url
            .join(image_src.trim())
            .map_err(|e| Unparseable(format!("bad image src '{}': {}", image_src, e)))?;

        let comments = document
            .select(&selector(".texts span.black")?)
            .map(element_text)
            .collect();

        let genres = document
            .select(&selector("span.d_book a")?)
            .map(element_text)
            .filter(|s| !s.is_empty())
            .collect();

        Ok(BookRecord {
            title,
            author,
            image_url,
            comments,
            genres,
        })
    }
}

impl CatalogLinkExtractor for TululuExtractor {
    fn extract_links(&self, markup: &str, page_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(markup);
        let (Ok(table_selector), Ok(a_selector)) =
            (Selector::parse("table.d_book"), Selector::parse("a[href]"))
        else {
            return Vec::new();
        };

        document
            .select(&table_selector)
            .filter_map(|table| table.select(&a_selector).next())
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_link(href, page_url))
            .collect()
    }
}

fn selector(css: &str) -> Result<Selector, Unparseable> {
    Selector::parse(css).map_err(|e| Unparseable(format!("selector '{}': {:?}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    clean(&element.text().collect::<String>())
}

/// Trims and collapses whitespace, including the non-breaking spaces the origin pads with
fn clean(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragments, `javascript:`/`mailto:` links
/// and anything that does not resolve to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
