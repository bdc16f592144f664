use poolsync::ImportProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: ImportProgress) {
        match event {
            ImportProgress::FetchingPage { request, attempt } => {
                tracing::debug!(request, attempt, "Fetching page");
            }

            ImportProgress::FetchedPage {
                request,
                count,
                has_more,
            } => {
                tracing::info!(request, count, has_more, "Fetched page");
            }

            ImportProgress::ContactAdded { email } => {
                tracing::info!(email = %email, "Contact added");
            }

            ImportProgress::ContactFailed { email, reason } => {
                tracing::warn!(email = %email, reason = %reason, "Contact failed");
            }

            ImportProgress::RecordSkipped { username, reason } => {
                tracing::warn!(username = ?username, reason = %reason, "Record skipped");
            }

            ImportProgress::PageFetchFailed {
                request,
                attempt,
                code,
                message,
            } => {
                tracing::warn!(
                    request,
                    attempt,
                    code = %code,
                    message = %message,
                    "Page fetch failed"
                );
            }

            ImportProgress::BackingOff {
                request,
                next_attempt,
                retry_after_ms,
            } => {
                tracing::info!(request, next_attempt, retry_after_ms, "Backing off");
            }

            ImportProgress::ImportComplete {
                pages,
                succeeded,
                failed,
                skipped,
            } => {
                tracing::info!(pages, succeeded, failed, skipped, "Import complete");
            }

            ImportProgress::ImportCancelled { request } => {
                tracing::warn!(request, "Import cancelled");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
