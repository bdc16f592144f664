//! Import session state, options and results.

use thiserror::Error;

use super::backoff::BackoffPolicy;
use crate::directory::DirectoryError;

/// Progress through the directory.
///
/// Only the session mutates this; it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportState {
    /// Token of the page being fetched (or just fetched). `None` is the first page.
    pub current_token: Option<String>,
    /// Logical page index, 1-based. Advances only when a fetch succeeds.
    pub request_number: u32,
    /// Attempt at the current page, 1-based. Advances only when a fetch fails.
    pub attempt_number: u32,
    /// Consecutive fetch failures.
    pub backoff_level: u32,
}

impl Default for ImportState {
    fn default() -> Self {
        Self {
            current_token: None,
            request_number: 1,
            attempt_number: 1,
            backoff_level: 0,
        }
    }
}

impl ImportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page was fetched: reset the retry counters and move to the next request.
    pub fn record_fetch_success(&mut self) {
        self.request_number = self.request_number.saturating_add(1);
        self.attempt_number = 1;
        self.backoff_level = 0;
    }

    /// A fetch failed: stay on the same token and escalate.
    pub fn record_fetch_failure(&mut self) {
        self.attempt_number = self.attempt_number.saturating_add(1);
        self.backoff_level = self.backoff_level.saturating_add(1);
    }

    /// Move to the page identified by `token`.
    pub fn advance(&mut self, token: String) {
        self.current_token = Some(token);
    }
}

/// Options controlling an import session.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Delay policy for failed page fetches.
    pub backoff: BackoffPolicy,
    /// Give up after this many consecutive failed attempts at one page.
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl ImportOptions {
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The directory was exhausted.
    #[default]
    Completed,
    /// Cancellation was requested before the directory was exhausted.
    Cancelled,
}

/// Counters for a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Pages fetched successfully.
    pub pages: u32,
    /// Records seen, including skipped ones.
    pub processed: usize,
    /// Contacts added to the destination.
    pub succeeded: usize,
    /// Contacts the destination did not accept.
    pub failed: usize,
    /// Records without an email address.
    pub skipped: usize,
    /// Failed page fetch attempts.
    pub fetch_failures: u32,
    pub outcome: ImportOutcome,
}

/// Fatal import errors.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Every allowed attempt at a page failed.
    #[error("Request #{request} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        request: u32,
        attempts: u32,
        source: DirectoryError,
    },
}
