//! Progress events emitted by an import session.
//!
//! Every processed record produces exactly one of `ContactAdded`,
//! `ContactFailed` or `RecordSkipped`. Every failed page fetch produces one
//! `PageFetchFailed`.

/// Progress events emitted during an import.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImportProgress {
    /// About to request a page from the directory.
    FetchingPage {
        /// Logical page number (1-indexed).
        request: u32,
        /// Attempt at this page (1-indexed).
        attempt: u32,
    },

    /// A page arrived.
    FetchedPage {
        request: u32,
        /// Records on the page.
        count: usize,
        /// Whether another page follows.
        has_more: bool,
    },

    /// A contact was added to the destination.
    ContactAdded { email: String },

    /// The destination did not accept a contact.
    ContactFailed { email: String, reason: String },

    /// A record could not be turned into a contact.
    RecordSkipped {
        username: Option<String>,
        reason: String,
    },

    /// A page fetch failed.
    PageFetchFailed {
        request: u32,
        attempt: u32,
        /// Provider error code.
        code: String,
        message: String,
    },

    /// Waiting before retrying the same page.
    BackingOff {
        request: u32,
        /// The attempt that will follow the wait.
        next_attempt: u32,
        retry_after_ms: u64,
    },

    /// The directory is exhausted.
    ImportComplete {
        pages: u32,
        succeeded: usize,
        failed: usize,
        skipped: usize,
    },

    /// The session stopped early on request.
    ImportCancelled { request: u32 },
}

/// Callback for progress updates during an import.
pub type ProgressCallback = Box<dyn Fn(ImportProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: ImportProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
