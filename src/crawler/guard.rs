//! Existence detection
//!
//! Decides what a fetch outcome means for the resource that was requested.
//! The origin reports unknown book ids by redirecting to its home page, so a
//! redirect means "does not exist" rather than "request failed". The
//! convention lives behind [`ExistenceGuard`] so another origin can swap it
//! without touching the retry policy or the item pipeline.

use crate::crawler::fetcher::FetchOutcome;
use url::Url;

/// Classified fetch outcome
#[derive(Debug, Clone)]
pub enum Existence {
    /// The resource exists and its body was retrieved
    Exists { body: Vec<u8>, final_url: Url },

    /// The origin confirmed the resource does not exist (terminal)
    NotFound { redirected_to: Option<Url> },

    /// A failure that may succeed on retry
    Transient { cause: String },

    /// A fixed error status that retrying will not change (terminal)
    Permanent { status: u16 },
}

impl Existence {
    /// Returns true if this classification may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exists { .. } => "exists",
            Self::NotFound { .. } => "not_found",
            Self::Transient { .. } => "transient",
            Self::Permanent { .. } => "permanent",
        }
    }
}

/// Maps a raw fetch outcome to an existence classification
pub trait ExistenceGuard: Send + Sync {
    fn classify(&self, outcome: FetchOutcome) -> Existence;
}

/// Guard for origins that redirect unknown resources instead of returning 404
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectAsNotFound;

impl ExistenceGuard for RedirectAsNotFound {
    fn classify(&self, outcome: FetchOutcome) -> Existence {
        match outcome {
            FetchOutcome::Success { body, final_url } => Existence::Exists { body, final_url },
            FetchOutcome::Redirected { final_url } => Existence::NotFound {
                redirected_to: Some(final_url),
            },
            FetchOutcome::HttpError { status } => Existence::Permanent { status },
            FetchOutcome::ConnectionFailure { cause } => Existence::Transient { cause },
        }
    }
}
