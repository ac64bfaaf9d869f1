//! Asset downloads
//!
//! Saves book texts and cover images through the same retried fetch used for
//! catalog pages. Files are written to a temporary file in the target folder
//! and renamed into place, so a failed download never leaves a truncated file
//! under the final name.

use crate::crawler::naming::{image_filename, text_filename};
use crate::crawler::retry::{FetchFailure, ResilientFetcher};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

/// Kind of downloaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Text,
    Image,
}

/// A completed file write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub kind: AssetKind,
    pub local_path: PathBuf,
    pub source_url: Url,
}

/// Asset download errors
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("download failed: {0}")]
    Fetch(#[from] FetchFailure),

    #[error("failed to write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Downloads texts and images into their output folders
pub struct AssetDownloader {
    fetcher: Arc<ResilientFetcher>,
    books_dir: PathBuf,
    images_dir: PathBuf,
}

impl AssetDownloader {
    pub fn new(fetcher: Arc<ResilientFetcher>, books_dir: PathBuf, images_dir: PathBuf) -> Self {
        Self {
            fetcher,
            books_dir,
            images_dir,
        }
    }

    /// Downloads a book text and saves it as `{id}.{title}.txt`
    ///
    /// # Arguments
    ///
    /// * `url` - Text endpoint
    /// * `params` - Query parameters identifying the book
    /// * `item_id` - Book id, used in the filename
    /// * `title` - Book title, sanitized into the filename
    pub async fn download_text(
        &self,
        url: &Url,
        params: &[(String, String)],
        item_id: &str,
        title: &str,
    ) -> Result<DownloadedAsset, AssetError> {
        let page = self.fetcher.get(url, params).await?;
        let filename = text_filename(item_id, title);
        let local_path = write_atomically(&self.books_dir, &filename, &page.body)?;

        tracing::debug!("Saved text for book {} to {}", item_id, local_path.display());

        Ok(DownloadedAsset {
            kind: AssetKind::Text,
            local_path,
            source_url: url.clone(),
        })
    }

    /// Downloads a cover image and saves it under a name derived from the item id
    pub async fn download_image(
        &self,
        url: &Url,
        item_id: &str,
    ) -> Result<DownloadedAsset, AssetError> {
        let page = self.fetcher.get(url, &[]).await?;
        let filename = image_filename(url, item_id);
        let local_path = write_atomically(&self.images_dir, &filename, &page.body)?;

        tracing::debug!("Saved image for book {} to {}", item_id, local_path.display());

        Ok(DownloadedAsset {
            kind: AssetKind::Image,
            local_path,
            source_url: url.clone(),
        })
    }
}

/// Writes `body` to `dir/filename` via a temporary file and rename
///
/// The temporary file is removed on any failure before the rename.
pub(crate) fn write_atomically(
    dir: &Path,
    filename: &str,
    body: &[u8],
) -> Result<PathBuf, AssetError> {
    let final_path = dir.join(filename);
    let write_err = |source| AssetError::Write {
        path: final_path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(body).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&final_path).map_err(|e| write_err(e.error))?;

    Ok(final_path)
}
