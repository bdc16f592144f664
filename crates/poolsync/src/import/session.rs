//! The import session state machine.
//!
//! ```text
//! Fetching(token) --ok--> Processing(page) --next token--> Fetching(next)
//!        ^                       |
//!        |                       +--no token--> Complete
//!        |
//!        +--- BackingOff <--err--+ (same token)
//! ```
//!
//! Exactly one page fetch or one contact sync is outstanding at any time.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::progress::{ImportProgress, ProgressCallback, emit};
use super::types::{ImportError, ImportOptions, ImportOutcome, ImportState, ImportSummary};
use crate::destination::{Contact, ContactSync, SyncOutcome};
use crate::directory::{PageSource, UserRecord};

/// Drives a [`PageSource`] into a [`ContactSync`], one page and one contact at a time.
pub struct ImportSession<S, C> {
    source: S,
    sync: C,
    options: ImportOptions,
    state: ImportState,
    cancel: Option<CancellationToken>,
    finished: bool,
}

impl<S, C> ImportSession<S, C>
where
    S: PageSource,
    C: ContactSync,
{
    pub fn new(source: S, sync: C, options: ImportOptions) -> Self {
        Self {
            source,
            sync,
            options,
            state: ImportState::new(),
            cancel: None,
            finished: false,
        }
    }

    /// Stop cooperatively when `token` is cancelled.
    ///
    /// Checked before each fetch, between records, and during backoff waits.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Current progress through the directory.
    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Run until the directory is exhausted, cancellation, or (when
    /// `max_attempts` is set) a page fails too many times.
    ///
    /// Per-record failures never end the session. Once a run has completed,
    /// later calls return an empty summary without touching the directory.
    pub async fn run(
        &mut self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::default();
        if self.finished {
            return Ok(summary);
        }

        loop {
            if self.is_cancelled() {
                return Ok(self.cancelled(summary, on_progress));
            }

            let request = self.state.request_number;
            let attempt = self.state.attempt_number;
            emit(on_progress, ImportProgress::FetchingPage { request, attempt });
            tracing::debug!(request, attempt, "Fetching page");

            match self
                .source
                .fetch_page(self.state.current_token.as_deref())
                .await
            {
                Ok(page) => {
                    summary.pages += 1;
                    emit(
                        on_progress,
                        ImportProgress::FetchedPage {
                            request,
                            count: page.records.len(),
                            has_more: !page.is_last(),
                        },
                    );

                    if self
                        .process_page(&page.records, &mut summary, on_progress)
                        .await
                        .is_break()
                    {
                        // State keeps pointing at the interrupted page.
                        return Ok(self.cancelled(summary, on_progress));
                    }

                    // The page counts as fetched once its records are done.
                    self.state.record_fetch_success();

                    match page.next_token {
                        Some(token) => self.state.advance(token),
                        None => {
                            self.finished = true;
                            tracing::info!(
                                pages = summary.pages,
                                succeeded = summary.succeeded,
                                failed = summary.failed,
                                skipped = summary.skipped,
                                "Import complete"
                            );
                            emit(
                                on_progress,
                                ImportProgress::ImportComplete {
                                    pages: summary.pages,
                                    succeeded: summary.succeeded,
                                    failed: summary.failed,
                                    skipped: summary.skipped,
                                },
                            );
                            summary.outcome = ImportOutcome::Completed;
                            return Ok(summary);
                        }
                    }
                }
                Err(err) => {
                    summary.fetch_failures += 1;
                    tracing::warn!(request, attempt, code = %err.code(), error = %err, "Page fetch failed");
                    emit(
                        on_progress,
                        ImportProgress::PageFetchFailed {
                            request,
                            attempt,
                            code: err.code().to_string(),
                            message: err.to_string(),
                        },
                    );

                    if let Some(max) = self.options.max_attempts
                        && attempt >= max.max(1)
                    {
                        return Err(ImportError::RetriesExhausted {
                            request,
                            attempts: attempt,
                            source: err,
                        });
                    }

                    self.state.record_fetch_failure();
                    let delay = self.options.backoff.delay_for(self.state.backoff_level);
                    emit(
                        on_progress,
                        ImportProgress::BackingOff {
                            request,
                            next_attempt: self.state.attempt_number,
                            retry_after_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        },
                    );

                    if self.wait(delay).await.is_break() {
                        return Ok(self.cancelled(summary, on_progress));
                    }
                }
            }
        }
    }

    /// Sync every record of a page in order.
    async fn process_page(
        &self,
        records: &[UserRecord],
        summary: &mut ImportSummary,
        on_progress: Option<&ProgressCallback>,
    ) -> ControlFlow<()> {
        for record in records {
            if self.is_cancelled() {
                return ControlFlow::Break(());
            }

            summary.processed += 1;

            let email = match record.email() {
                Ok(email) => email.to_string(),
                Err(err) => {
                    summary.skipped += 1;
                    tracing::warn!(username = ?record.username, "Skipping record without email");
                    emit(
                        on_progress,
                        ImportProgress::RecordSkipped {
                            username: record.username.clone(),
                            reason: err.to_string(),
                        },
                    );
                    continue;
                }
            };

            match self.sync.sync_contact(Contact::subscribed(email.clone())).await {
                SyncOutcome::Success => {
                    summary.succeeded += 1;
                    tracing::debug!(email = %email, "Contact added");
                    emit(on_progress, ImportProgress::ContactAdded { email });
                }
                SyncOutcome::Failure(reason) => {
                    summary.failed += 1;
                    tracing::debug!(email = %email, reason = %reason, "Contact failed");
                    emit(on_progress, ImportProgress::ContactFailed { email, reason });
                }
            }
        }

        ControlFlow::Continue(())
    }

    /// Sleep for `delay`, returning early on cancellation.
    async fn wait(&self, delay: Duration) -> ControlFlow<()> {
        match &self.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => ControlFlow::Break(()),
                () = tokio::time::sleep(delay) => ControlFlow::Continue(()),
            },
            None => {
                tokio::time::sleep(delay).await;
                ControlFlow::Continue(())
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn cancelled(
        &self,
        mut summary: ImportSummary,
        on_progress: Option<&ProgressCallback>,
    ) -> ImportSummary {
        tracing::info!(request = self.state.request_number, "Import cancelled");
        emit(
            on_progress,
            ImportProgress::ImportCancelled {
                request: self.state.request_number,
            },
        );
        summary.outcome = ImportOutcome::Cancelled;
        summary
    }
}
