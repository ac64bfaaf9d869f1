//! Catalog pagination
//!
//! Walks catalog pages in increasing order and hands out the item links of
//! each page. The origin has no "last page" marker: the walk ends when a page
//! no longer exists (redirect), cannot be fetched, or the configured end
//! page has been passed. A page that exists but lists nothing is yielded
//! with no links and the walk moves on.

use crate::crawler::parser::CatalogLinkExtractor;
use crate::crawler::retry::{FetchFailure, ResilientFetcher};
use std::sync::Arc;
use url::Url;

/// Position of the walk
///
/// Advances monotonically and is only mutated by [`CatalogWalker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCursor {
    pub current_page: u32,
    pub end_page: Option<u32>,
}

impl CatalogCursor {
    pub fn new(start_page: u32, end_page: Option<u32>) -> Self {
        Self {
            current_page: start_page,
            end_page,
        }
    }

    /// Returns true once the cursor has moved beyond the end page
    pub fn is_past_end(&self) -> bool {
        self.end_page.is_some_and(|end| self.current_page > end)
    }

    fn advance(&mut self) {
        self.current_page += 1;
    }
}

/// One catalog page and the items it lists
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub number: u32,
    pub url: Url,
    pub links: Vec<Url>,
}

/// Why the walk ended
#[derive(Debug, Clone)]
pub enum WalkEnd {
    /// The page after the last one requested was reached
    EndPage,
    /// The origin reported the page does not exist
    NotFound { page: u32 },
    /// The page could not be fetched (permanent status or exhausted retries)
    FetchFailed { page: u32, failure: FetchFailure },
    /// The page URL could not be built
    InvalidUrl { page: u32, error: String },
}

/// Lazy walker over catalog pages
///
/// Not restartable: walking again re-issues every request.
pub struct CatalogWalker {
    fetcher: Arc<ResilientFetcher>,
    extractor: Arc<dyn CatalogLinkExtractor>,
    base_url: Url,
    category: String,
    cursor: CatalogCursor,
    end: Option<WalkEnd>,
}

impl CatalogWalker {
    pub fn new(
        fetcher: Arc<ResilientFetcher>,
        extractor: Arc<dyn CatalogLinkExtractor>,
        base_url: Url,
        category: &str,
        start_page: u32,
        end_page: Option<u32>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            base_url,
            category: category.trim_matches('/').to_string(),
            cursor: CatalogCursor::new(start_page, end_page),
            end: None,
        }
    }

    pub fn cursor(&self) -> CatalogCursor {
        self.cursor
    }

    /// Why the walk ended, once it has
    pub fn end_reason(&self) -> Option<&WalkEnd> {
        self.end.as_ref()
    }

    /// URL of the given catalog page: `{base}/{category}/{page}/`
    pub fn page_url(&self, page: u32) -> Result<Url, url::ParseError> {
        self.base_url
            .join(&format!("{}/{}/", self.category, page))
    }

    /// Fetches the next page, or returns None once the walk has ended
    pub async fn next_page(&mut self) -> Option<CatalogPage> {
        if self.end.is_some() {
            return None;
        }

        if self.cursor.is_past_end() {
            tracing::info!("Reached end page {:?}", self.cursor.end_page);
            return self.finish(WalkEnd::EndPage);
        }

        let number = self.cursor.current_page;
        let url = match self.page_url(number) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build URL for catalog page {}: {}", number, e);
                return self.finish(WalkEnd::InvalidUrl {
                    page: number,
                    error: e.to_string(),
                });
            }
        };

        tracing::debug!("Fetching catalog page {}: {}", number, url);

        let page = match self.fetcher.get(&url, &[]).await {
            Ok(page) => page,
            Err(FetchFailure::NotFound { .. }) => {
                tracing::info!("Catalog ends before page {}", number);
                return self.finish(WalkEnd::NotFound { page: number });
            }
            Err(failure) => {
                tracing::warn!("Stopping catalog walk at page {}: {}", number, failure);
                return self.finish(WalkEnd::FetchFailed {
                    page: number,
                    failure,
                });
            }
        };

        let links = self.extractor.extract_links(&page.text(), &url);
        if links.is_empty() {
            tracing::warn!("Catalog page {} lists no items", number);
        } else {
            tracing::info!("Catalog page {}: {} items", number, links.len());
        }
        self.cursor.advance();

        Some(CatalogPage { number, url, links })
    }

    /// Walks every remaining page and returns all item links in order
    pub async fn collect_links(&mut self) -> Vec<Url> {
        let mut all_links = Vec::new();
        while let Some(page) = self.next_page().await {
            all_links.extend(page.links);
        }
        all_links
    }

    fn finish(&mut self, reason: WalkEnd) -> Option<CatalogPage> {
        self.end = Some(reason);
        None
    }
}
