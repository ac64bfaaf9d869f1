//! Harvest engine
//!
//! This module contains the resilient fetch pipeline, including:
//! - HTTP fetching with redirect reporting
//! - Existence detection and bounded retry for transient failures
//! - Catalog pagination and HTML extraction
//! - Asset downloads and per-item processing
//! - Overall run coordination

mod coordinator;
mod downloader;
mod fetcher;
mod guard;
mod naming;
mod parser;
mod pipeline;
mod retry;
#[cfg(test)]
pub(crate) mod testing;
mod walker;

pub use coordinator::{
    run_harvest, AggregatedResults, HarvestReport, Harvester, ResultAggregator, SkippedItem,
};
pub use downloader::{AssetDownloader, AssetError, AssetKind, DownloadedAsset};
pub use fetcher::{build_http_client, Fetch, FetchOutcome, HttpFetcher};
pub use guard::{Existence, ExistenceGuard, RedirectAsNotFound};
pub use naming::{
    image_filename, item_id_from_url, sanitize_filename, text_filename, PLACEHOLDER_IMAGE,
};
pub use parser::{BookRecord, CatalogLinkExtractor, DetailExtractor, TululuExtractor, Unparseable};
pub use pipeline::{HarvestedBook, ItemPipeline, PipelineOptions, SkipReason};
pub use retry::{
    AttemptPhase, AttemptState, FetchFailure, FetchedPage, ResilientFetcher, RetryDecision,
    RetryPolicy, StopReason,
};
pub use walker::{CatalogCursor, CatalogPage, CatalogWalker, WalkEnd};
