//! Harvest coordinator - main run orchestration logic
//!
//! This module ties the pieces together:
//! - Building the fetch stack and pipeline from configuration
//! - Walking the catalog page by page
//! - Feeding each item through the pipeline without letting one item's
//!   failure affect the next
//! - Handing the final result set to the JSON writer

use crate::config::Config;
use crate::crawler::downloader::AssetDownloader;
use crate::crawler::fetcher::{Fetch, HttpFetcher};
use crate::crawler::guard::{ExistenceGuard, RedirectAsNotFound};
use crate::crawler::parser::{CatalogLinkExtractor, DetailExtractor, TululuExtractor};
use crate::crawler::pipeline::{HarvestedBook, ItemPipeline, PipelineOptions, SkipReason};
use crate::crawler::retry::{ResilientFetcher, RetryPolicy};
use crate::crawler::walker::{CatalogWalker, WalkEnd};
use crate::output::write_results;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// An item left out of the result set, and why
#[derive(Debug)]
pub struct SkippedItem {
    pub item_url: Url,
    pub reason: SkipReason,
}

/// Runs items through the pipeline and collects the outcome
///
/// Successes are kept in discovery order; every failure becomes a
/// [`SkippedItem`]. Each URL is processed at most once.
pub struct ResultAggregator<'a> {
    pipeline: &'a ItemPipeline,
    books: Vec<HarvestedBook>,
    skipped: Vec<SkippedItem>,
    seen: HashSet<Url>,
}

impl<'a> ResultAggregator<'a> {
    pub fn new(pipeline: &'a ItemPipeline) -> Self {
        Self {
            pipeline,
            books: Vec::new(),
            skipped: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Processes a single item and records the outcome
    pub async fn push(&mut self, item_url: Url) {
        if !self.seen.insert(item_url.clone()) {
            tracing::debug!("Skipping duplicate item {}", item_url);
            self.skipped.push(SkippedItem {
                item_url,
                reason: SkipReason::Duplicate,
            });
            return;
        }

        match self.pipeline.process(&item_url).await {
            Ok(book) => {
                tracing::info!(
                    "Saved book {}: {} ({})",
                    book.item_id,
                    book.record.title,
                    book.record.author
                );
                self.books.push(book);
            }
            Err(reason) => {
                if reason.is_quiet() {
                    tracing::info!("Skipping {}: {}", item_url, reason);
                } else {
                    tracing::warn!("Skipping {}: {}", item_url, reason);
                }
                self.skipped.push(SkippedItem { item_url, reason });
            }
        }
    }

    /// Processes every URL in order
    pub async fn run(mut self, item_urls: impl IntoIterator<Item = Url>) -> AggregatedResults {
        for url in item_urls {
            self.push(url).await;
        }
        self.finish()
    }

    pub fn processed(&self) -> usize {
        self.books.len() + self.skipped.len()
    }

    pub fn finish(self) -> AggregatedResults {
        AggregatedResults {
            books: self.books,
            skipped: self.skipped,
        }
    }
}

/// Result set plus the skip listing
#[derive(Debug, Default)]
pub struct AggregatedResults {
    pub books: Vec<HarvestedBook>,
    pub skipped: Vec<SkippedItem>,
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct HarvestReport {
    pub books: Vec<HarvestedBook>,
    pub skipped: Vec<SkippedItem>,
    pub pages_walked: u32,
    pub walk_end: Option<WalkEnd>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Main harvester structure
pub struct Harvester {
    config: Arc<Config>,
    fetcher: Arc<ResilientFetcher>,
    links: Arc<dyn CatalogLinkExtractor>,
    pipeline: ItemPipeline,
    base_url: Url,
}

impl Harvester {
    /// Creates a harvester talking to the configured origin over HTTP
    pub fn new(config: Config) -> Result<Self> {
        let fetch = HttpFetcher::from_config(&config.http)?;
        Self::with_fetcher(config, Arc::new(fetch))
    }

    /// Creates a harvester over any transport, with the origin's default
    /// existence convention and page layout
    pub fn with_fetcher(config: Config, fetch: Arc<dyn Fetch>) -> Result<Self> {
        let extractor = Arc::new(TululuExtractor);
        Self::with_components(
            config,
            fetch,
            Arc::new(RedirectAsNotFound),
            extractor.clone(),
            extractor,
        )
    }

    /// Creates a harvester from explicit collaborators
    pub fn with_components(
        config: Config,
        fetch: Arc<dyn Fetch>,
        guard: Arc<dyn ExistenceGuard>,
        links: Arc<dyn CatalogLinkExtractor>,
        details: Arc<dyn DetailExtractor>,
    ) -> Result<Self> {
        let base_url = config.site.base()?;
        let text_url = base_url.join(config.site.text_endpoint.trim_start_matches('/'))?;

        let fetcher = Arc::new(ResilientFetcher::new(
            fetch,
            guard,
            RetryPolicy::from(&config.retry),
        ));

        let downloader = AssetDownloader::new(
            fetcher.clone(),
            config.output.books_path(),
            config.output.images_path(),
        );

        let options = PipelineOptions {
            skip_text: config.download.skip_text,
            skip_images: config.download.skip_images,
            image_failure: config.download.image_failure,
        };

        let pipeline = ItemPipeline::new(fetcher.clone(), details, downloader, text_url, options);

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            links,
            pipeline,
            base_url,
        })
    }

    /// Runs the whole harvest
    ///
    /// 1. Walk catalog pages from the start page until the catalog ends
    /// 2. Run every discovered item through the pipeline
    /// 3. Write the result set to the results file
    ///
    /// Only failing to write the results file is an error; every per-page
    /// and per-item failure is reflected in the report instead.
    pub async fn run(&self) -> Result<HarvestReport> {
        let started_at = Utc::now();
        tracing::info!(
            "Harvesting {} category {} from page {}{}",
            self.base_url,
            self.config.site.category,
            self.config.pages.start,
            self.config
                .pages
                .end
                .map(|end| format!(" to {}", end))
                .unwrap_or_default()
        );

        let mut walker = CatalogWalker::new(
            self.fetcher.clone(),
            self.links.clone(),
            self.base_url.clone(),
            &self.config.site.category,
            self.config.pages.start,
            self.config.pages.end,
        );

        let mut aggregator = ResultAggregator::new(&self.pipeline);
        let mut pages_walked = 0;

        while let Some(page) = walker.next_page().await {
            pages_walked += 1;
            for link in page.links {
                aggregator.push(link).await;
            }
            tracing::info!(
                "Progress: {} pages walked, {} items processed",
                pages_walked,
                aggregator.processed()
            );
        }

        let results = aggregator.finish();

        let results_path = self.config.output.results_path();
        write_results(&results.books, &results_path)?;
        tracing::info!(
            "Wrote {} books to {}",
            results.books.len(),
            results_path.display()
        );

        Ok(HarvestReport {
            books: results.books,
            skipped: results.skipped,
            pages_walked,
            walk_end: walker.end_reason().cloned(),
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Runs a complete harvest over HTTP
///
/// # Example
///
/// ```no_run
/// use tululu_harvest::config::load_config;
/// use tululu_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(config).await?;
/// println!("{} books saved", report.books.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<HarvestReport> {
    Harvester::new(config)?.run().await
}
