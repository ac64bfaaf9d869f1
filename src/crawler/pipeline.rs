//! Per-item pipeline
//!
//! Takes one catalog item from detail page to saved assets. Every way the
//! item can fail ends up as a [`SkipReason`]; nothing escapes as an error.

use crate::config::ImageFailurePolicy;
use crate::crawler::downloader::{AssetDownloader, AssetError, DownloadedAsset};
use crate::crawler::naming::item_id_from_url;
use crate::crawler::parser::{BookRecord, DetailExtractor};
use crate::crawler::retry::{FetchFailure, ResilientFetcher};
use std::fmt;
use std::fs;
use std::sync::Arc;
use url::Url;

/// A book whose detail page was parsed, with whatever assets were saved
#[derive(Debug, Clone)]
pub struct HarvestedBook {
    pub item_url: Url,
    pub item_id: String,
    pub record: BookRecord,
    pub text: Option<DownloadedAsset>,
    pub image: Option<DownloadedAsset>,
}

/// Why an item was left out of the result set
#[derive(Debug)]
pub enum SkipReason {
    /// The item URL carries no book id
    UnrecognizedUrl,
    /// The item was already processed earlier in the run
    Duplicate,
    /// The origin redirected the detail page: the book does not exist
    NotFound,
    /// The detail page answered with a fixed error status
    PermanentHttp { status: u16 },
    /// The detail page kept failing with connection problems
    Exhausted { attempts: u32, cause: String },
    /// The detail page did not have the expected structure
    Unparseable { reason: String },
    /// The book text could not be downloaded or saved
    TextUnavailable(AssetError),
    /// The cover image failed and images are configured as mandatory
    ImageUnavailable(AssetError),
}

impl SkipReason {
    /// Stable label for counting skips by kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnrecognizedUrl => "unrecognized_url",
            Self::Duplicate => "duplicate",
            Self::NotFound => "not_found",
            Self::PermanentHttp { .. } => "permanent_http",
            Self::Exhausted { .. } => "exhausted",
            Self::Unparseable { .. } => "unparseable",
            Self::TextUnavailable(_) => "text_unavailable",
            Self::ImageUnavailable(_) => "image_unavailable",
        }
    }

    /// Expected end states that do not deserve a warning
    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::NotFound | Self::Duplicate)
    }
}

impl From<FetchFailure> for SkipReason {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::NotFound { .. } => Self::NotFound,
            FetchFailure::Permanent { status, .. } => Self::PermanentHttp { status },
            FetchFailure::Exhausted { attempts, cause, .. } => Self::Exhausted { attempts, cause },
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedUrl => write!(f, "item URL has no book id"),
            Self::Duplicate => write!(f, "already processed"),
            Self::NotFound => write!(f, "book does not exist (redirected)"),
            Self::PermanentHttp { status } => write!(f, "HTTP {}", status),
            Self::Exhausted { attempts, cause } => {
                write!(f, "gave up after {} attempts: {}", attempts, cause)
            }
            Self::Unparseable { reason } => write!(f, "{}", reason),
            Self::TextUnavailable(e) => write!(f, "text unavailable: {}", e),
            Self::ImageUnavailable(e) => write!(f, "image unavailable: {}", e),
        }
    }
}

/// Which assets to fetch and how strict to be about images
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub skip_text: bool,
    pub skip_images: bool,
    pub image_failure: ImageFailurePolicy,
}

/// Detail page -> record -> text -> image, for one item
pub struct ItemPipeline {
    fetcher: Arc<ResilientFetcher>,
    extractor: Arc<dyn DetailExtractor>,
    downloader: AssetDownloader,
    text_url: Url,
    options: PipelineOptions,
}

impl ItemPipeline {
    pub fn new(
        fetcher: Arc<ResilientFetcher>,
        extractor: Arc<dyn DetailExtractor>,
        downloader: AssetDownloader,
        text_url: Url,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            downloader,
            text_url,
            options,
        }
    }

    /// Processes one catalog item
    ///
    /// # Flow
    ///
    /// 1. Derive the book id from the item URL
    /// 2. Fetch the detail page (retried); redirect / fixed status / exhaustion skip the item
    /// 3. Extract the record; an unparseable page skips the item
    /// 4. Download the text; failure skips the item
    /// 5. Download the image; failure is tolerated unless configured otherwise
    pub async fn process(&self, item_url: &Url) -> Result<HarvestedBook, SkipReason> {
        let item_id = item_id_from_url(item_url).ok_or(SkipReason::UnrecognizedUrl)?;

        let page = self.fetcher.get(item_url, &[]).await?;

        let record = self
            .extractor
            .extract(&page.text(), item_url)
            .map_err(|e| SkipReason::Unparseable { reason: e.0 })?;

        let text = if self.options.skip_text {
            None
        } else {
            let params = vec![("id".to_string(), item_id.clone())];
            let asset = self
                .downloader
                .download_text(&self.text_url, &params, &item_id, &record.title)
                .await
                .map_err(SkipReason::TextUnavailable)?;
            Some(asset)
        };

        let image = if self.options.skip_images {
            None
        } else {
            match self
                .downloader
                .download_image(&record.image_url, &item_id)
                .await
            {
                Ok(asset) => Some(asset),
                Err(e) if self.options.image_failure == ImageFailurePolicy::Tolerate => {
                    tracing::warn!("Book {}: keeping record without image: {}", item_id, e);
                    None
                }
                Err(e) => {
                    if let Some(text) = &text {
                        discard_asset(text);
                    }
                    return Err(SkipReason::ImageUnavailable(e));
                }
            }
        };

        Ok(HarvestedBook {
            item_url: item_url.clone(),
            item_id,
            record,
            text,
            image,
        })
    }
}

/// Removes an asset saved for an item that ends up skipped
fn discard_asset(asset: &DownloadedAsset) {
    if let Err(e) = fs::remove_file(&asset.local_path) {
        tracing::warn!(
            "Failed to remove {} of skipped item: {}",
            asset.local_path.display(),
            e
        );
    }
}
