//! Bounded retry for transient failures
//!
//! Every logical operation (one catalog page, one detail page, one asset)
//! runs the same state machine:
//!
//! ```text
//! INIT -> FETCHING -> SUCCESS
//!                  -> NOT_FOUND        (terminal)
//!                  -> PERMANENT_FAIL   (terminal)
//!                  -> RETRY_WAIT -> FETCHING
//!                  -> EXHAUSTED        (terminal)
//! ```
//!
//! Retries use a two-tier delay: a short one before the first retry and a
//! longer fixed one before every later retry, so the worst-case wall-clock
//! cost per operation is bounded by `max_attempts`.

use crate::config::RetryConfig;
use crate::crawler::fetcher::Fetch;
use crate::crawler::guard::{Existence, ExistenceGuard};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Phase of a single retried operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptPhase {
    Init,
    Fetching,
    RetryWait,
    Success,
    NotFound,
    PermanentFail,
    Exhausted,
}

impl AttemptPhase {
    /// Returns true if no further attempt may be made
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::NotFound | Self::PermanentFail | Self::Exhausted
        )
    }
}

/// Per-operation attempt bookkeeping
///
/// Owned by the operation that invokes the policy and dropped when it ends;
/// never shared between operations.
#[derive(Debug, Clone)]
pub struct AttemptState {
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub last_delay: Duration,
    pub phase: AttemptPhase,
}

impl AttemptState {
    /// Records that a fetch is about to be issued
    pub fn begin_attempt(&mut self) {
        debug_assert!(!self.phase.is_terminal(), "attempt after terminal phase");
        self.attempt_count += 1;
        self.phase = AttemptPhase::Fetching;
    }
}

/// Why an operation stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Success,
    NotFound,
    Permanent { status: u16 },
    Exhausted { attempts: u32 },
}

/// What the caller should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    Stop(StopReason),
}

/// Retry policy shared by catalog pages, detail pages and asset downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub first_delay: Duration,
    pub later_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, first_delay: Duration, later_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            first_delay,
            later_delay,
        }
    }

    /// Fresh state for a new logical operation
    pub fn start(&self) -> AttemptState {
        AttemptState {
            attempt_count: 0,
            max_attempts: self.max_attempts,
            last_delay: Duration::ZERO,
            phase: AttemptPhase::Init,
        }
    }

    /// Decides what follows the classification of the latest attempt
    ///
    /// # Rules
    ///
    /// | Classification | Condition | Decision |
    /// |----------------|-----------|----------|
    /// | Exists | - | Stop(Success) |
    /// | NotFound | any attempt count | Stop(NotFound) |
    /// | Permanent | any attempt count | Stop(Permanent) |
    /// | Transient | attempts < max | Retry(first or later delay) |
    /// | Transient | attempts == max | Stop(Exhausted) |
    pub fn next(&self, state: &mut AttemptState, existence: &Existence) -> RetryDecision {
        match existence {
            Existence::Exists { .. } => {
                state.phase = AttemptPhase::Success;
                RetryDecision::Stop(StopReason::Success)
            }
            Existence::NotFound { .. } => {
                state.phase = AttemptPhase::NotFound;
                RetryDecision::Stop(StopReason::NotFound)
            }
            Existence::Permanent { status } => {
                state.phase = AttemptPhase::PermanentFail;
                RetryDecision::Stop(StopReason::Permanent { status: *status })
            }
            Existence::Transient { .. } if state.attempt_count < state.max_attempts => {
                let delay = self.delay_after(state.attempt_count);
                state.last_delay = delay;
                state.phase = AttemptPhase::RetryWait;
                RetryDecision::Retry(delay)
            }
            Existence::Transient { .. } => {
                state.phase = AttemptPhase::Exhausted;
                RetryDecision::Stop(StopReason::Exhausted {
                    attempts: state.attempt_count,
                })
            }
        }
    }

    /// Delay to wait after the given number of failed attempts
    pub fn delay_after(&self, attempts: u32) -> Duration {
        if attempts <= 1 {
            self.first_delay
        } else {
            self.later_delay
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.first_delay_ms),
            Duration::from_millis(config.later_delay_ms),
        )
    }
}

/// Terminal failure of a retried fetch
#[derive(Debug, Clone, Error)]
pub enum FetchFailure {
    #[error("{url} does not exist (origin redirected)")]
    NotFound {
        url: Url,
        redirected_to: Option<Url>,
    },

    #[error("HTTP {status} for {url}")]
    Permanent { url: Url, status: u16 },

    #[error("{url} failed after {attempts} attempts: {cause}")]
    Exhausted {
        url: Url,
        attempts: u32,
        cause: String,
    },
}

/// Body of a resource that exists
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: Vec<u8>,
    pub final_url: Url,
    pub attempts: u32,
}

impl FetchedPage {
    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Fetcher + existence guard + retry policy
///
/// The single entry point every component uses to talk to the origin.
#[derive(Clone)]
pub struct ResilientFetcher {
    fetcher: Arc<dyn Fetch>,
    guard: Arc<dyn ExistenceGuard>,
    policy: RetryPolicy,
}

impl ResilientFetcher {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        guard: Arc<dyn ExistenceGuard>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            guard,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url` until it exists, is confirmed missing, fails
    /// permanently, or the attempt bound is used up
    pub async fn get(
        &self,
        url: &Url,
        params: &[(String, String)],
    ) -> Result<FetchedPage, FetchFailure> {
        let mut state = self.policy.start();

        loop {
            state.begin_attempt();
            let outcome = self.fetcher.fetch(url, params).await;
            let existence = self.guard.classify(outcome);

            match self.policy.next(&mut state, &existence) {
                RetryDecision::Retry(delay) => {
                    if let Existence::Transient { cause } = &existence {
                        tracing::warn!(
                            url = %url,
                            attempt = state.attempt_count,
                            max_attempts = state.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Connection problem, retrying: {}",
                            cause
                        );
                    }
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Stop(_) => {
                    return match existence {
                        Existence::Exists { body, final_url } => {
                            if state.attempt_count > 1 {
                                tracing::info!(
                                    url = %url,
                                    attempts = state.attempt_count,
                                    "Fetch succeeded after retry"
                                );
                            }
                            Ok(FetchedPage {
                                body,
                                final_url,
                                attempts: state.attempt_count,
                            })
                        }
                        Existence::NotFound { redirected_to } => Err(FetchFailure::NotFound {
                            url: url.clone(),
                            redirected_to,
                        }),
                        Existence::Permanent { status } => Err(FetchFailure::Permanent {
                            url: url.clone(),
                            status,
                        }),
                        Existence::Transient { cause } => Err(FetchFailure::Exhausted {
                            url: url.clone(),
                            attempts: state.attempt_count,
                            cause,
                        }),
                    };
                }
            }
        }
    }
}
