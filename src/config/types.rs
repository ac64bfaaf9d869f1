use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure for Tululu-Harvest
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults for the tululu.org science-fiction category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub pages: PagesConfig,
    pub output: OutputConfig,
    pub download: DownloadConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

/// Remote origin description
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL of the origin (e.g., "https://tululu.org")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Catalog category path segment (e.g., "l55")
    pub category: String,

    /// Endpoint serving book text, joined to the base URL and queried with `?id=`
    #[serde(rename = "text-endpoint")]
    pub text_endpoint: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tululu.org".to_string(),
            category: "l55".to_string(),
            text_endpoint: "txt.php".to_string(),
        }
    }
}

impl SiteConfig {
    /// Parsed base URL, with its path ending in `/`
    ///
    /// Catalog and text URLs are joined onto this, and a path segment
    /// without a trailing slash would be replaced by the join.
    pub fn base(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

/// Catalog page bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// First catalog page to walk
    pub start: u32,

    /// Last catalog page to walk (inclusive); unbounded when absent
    pub end: Option<u32>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            start: 1,
            end: None,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root folder for everything the harvester writes
    #[serde(rename = "dest-folder")]
    pub dest_folder: PathBuf,

    /// Book text folder, relative to `dest_folder` unless absolute
    #[serde(rename = "books-dir")]
    pub books_dir: PathBuf,

    /// Cover image folder, relative to `dest_folder` unless absolute
    #[serde(rename = "images-dir")]
    pub images_dir: PathBuf,

    /// JSON result file, relative to `dest_folder` unless absolute
    #[serde(rename = "results-file")]
    pub results_file: PathBuf,
}

impl OutputConfig {
    pub fn books_path(&self) -> PathBuf {
        self.dest_folder.join(&self.books_dir)
    }

    pub fn images_path(&self) -> PathBuf {
        self.dest_folder.join(&self.images_dir)
    }

    pub fn results_path(&self) -> PathBuf {
        self.dest_folder.join(&self.results_file)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_folder: PathBuf::from("."),
            books_dir: PathBuf::from("books"),
            images_dir: PathBuf::from("images"),
            results_file: PathBuf::from("books_data.json"),
        }
    }
}

/// What happens to an item whose cover image cannot be downloaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFailurePolicy {
    /// Keep the record with no image path
    #[default]
    Tolerate,
    /// Skip the whole item
    SkipItem,
}

/// Asset download switches
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Do not download book texts
    #[serde(rename = "skip-text")]
    pub skip_text: bool,

    /// Do not download cover images
    #[serde(rename = "skip-images")]
    pub skip_images: bool,

    #[serde(rename = "image-failure")]
    pub image_failure: ImageFailurePolicy,
}

/// Retry behaviour for transient connection failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum fetch attempts per logical operation
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "first-delay-ms")]
    pub first_delay_ms: u64,

    /// Delay before every later retry (milliseconds)
    #[serde(rename = "later-delay-ms")]
    pub later_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            first_delay_ms: 1000,
            later_delay_ms: 2000,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("tululu-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
