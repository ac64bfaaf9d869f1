//! HTTP fetcher implementation
//!
//! This module issues single HTTP GET requests and classifies what came back:
//! - Building the HTTP client with user agent, timeouts and no redirect following
//! - Reporting redirects instead of following them silently
//! - Mapping transport errors to connection failures

use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Result of a single fetch
///
/// Produced per call and consumed immediately by the existence guard.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx response with no redirect in its history
    Success {
        /// Raw response body
        body: Vec<u8>,
        /// URL the body was served from
        final_url: Url,
    },

    /// The origin answered with a redirect
    Redirected {
        /// Where the redirect pointed
        final_url: Url,
    },

    /// Non-2xx, non-redirect status
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Timeout, refused connection, reset, or a body that could not be read
    ConnectionFailure {
        /// Error description
        cause: String,
    },
}

/// One HTTP GET with a fixed timeout
///
/// Implementations must never follow a redirect without reporting it.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &Url, params: &[(String, String)]) -> FetchOutcome;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are not followed: a 3xx response is itself the evidence that
/// the origin redirected, which is how it reports a missing book.
///
/// # Example
///
/// ```no_run
/// use tululu_harvest::config::HttpConfig;
/// use tululu_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetch`] implementation backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps a client built by [`build_http_client`]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url, params: &[(String, String)]) -> FetchOutcome {
        tracing::debug!("GET {} {:?}", url, params);

        let response = match self.client.get(url.clone()).query(params).send().await {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status();

        if status.is_redirection() {
            let final_url = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| response.url().join(location).ok())
                .unwrap_or_else(|| response.url().clone());
            tracing::debug!("{} redirected ({}) to {}", url, status, final_url);
            return FetchOutcome::Redirected { final_url };
        }

        if !status.is_success() {
            return FetchOutcome::HttpError {
                status: status.as_u16(),
            };
        }

        let final_url = response.url().clone();
        match response.bytes().await {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
                final_url,
            },
            Err(e) => classify_transport_error(&e),
        }
    }
}

/// Classifies a reqwest error as a connection failure with a readable cause
fn classify_transport_error(e: &reqwest::Error) -> FetchOutcome {
    let cause = if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };
    FetchOutcome::ConnectionFailure { cause }
}
