use std::sync::Arc;

use console::{Term, style};
use poolsync::destination::MailchimpClient;
use poolsync::directory::CognitoPageSource;
use poolsync::{ImportOptions, ImportOutcome, ImportSession, ImportSummary};
use tokio_util::sync::CancellationToken;

use crate::config;
use crate::progress::ProgressReporter;

/// Everything needed to start an import, after merging CLI args with config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportTarget {
    pub pool_id: String,
    pub api_key: String,
    pub list_id: String,
    pub page_size: Option<i32>,
}

impl ImportTarget {
    /// Merge CLI values over configured ones.
    ///
    /// Returns `None` when the pool id, API key or list id is missing or blank.
    pub(crate) fn resolve(
        pool_id: Option<String>,
        api_key: Option<String>,
        list_id: Option<String>,
        page_size: Option<i32>,
        config: &config::Config,
    ) -> Option<Self> {
        let pick = |cli: Option<String>, configured: &Option<String>| {
            cli.or_else(|| configured.clone())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Some(Self {
            pool_id: pick(pool_id, &config.cognito.pool_id)?,
            api_key: pick(api_key, &config.mailchimp.api_key)?,
            list_id: pick(list_id, &config.mailchimp.list_id)?,
            page_size: page_size.or(config.cognito.page_size),
        })
    }
}

pub(crate) async fn handle_import(
    target: ImportTarget,
    options: ImportOptions,
    cancel: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term();

    // Both clients validate their identifiers before any request is made.
    let sync = MailchimpClient::new(&target.api_key, &target.list_id)?;
    let source = CognitoPageSource::connect(&target.pool_id, target.page_size).await?;

    if is_tty {
        println!(
            "Importing users from {} into list {}\n",
            style(&target.pool_id).bold(),
            style(&target.list_id).bold()
        );
    } else {
        tracing::info!(
            pool_id = %target.pool_id,
            list_id = %target.list_id,
            max_attempts = ?options.max_attempts,
            "Starting import"
        );
    }

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();

    let mut session = ImportSession::new(source, sync, options).with_cancellation(cancel);
    let result = session.run(Some(&callback)).await;
    reporter.finish();

    let summary = result?;
    display_summary(&summary, is_tty);

    Ok(())
}

fn display_summary(summary: &ImportSummary, is_tty: bool) {
    if !is_tty {
        tracing::info!(
            pages = summary.pages,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            fetch_failures = summary.fetch_failures,
            cancelled = summary.outcome == ImportOutcome::Cancelled,
            "Import summary"
        );
        return;
    }

    println!();
    println!(
        "Processed {} users from {} pages",
        summary.processed, summary.pages
    );
    if summary.fetch_failures > 0 {
        println!(
            "{}",
            style(format!(
                "{} page fetch attempts failed and were retried",
                summary.fetch_failures
            ))
            .yellow()
        );
    }
    if summary.outcome == ImportOutcome::Cancelled {
        println!(
            "{}",
            style("Import stopped early; run again to continue from the start").yellow()
        );
    }
}
