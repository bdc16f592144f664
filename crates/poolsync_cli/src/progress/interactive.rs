use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use poolsync::ImportProgress;

/// Interactive reporter: one line per record and per failed fetch, printed
/// above a spinner that shows what the session is waiting on.
pub struct InteractiveReporter {
    spinner: ProgressBar,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }

    pub fn handle(&self, event: ImportProgress) {
        match event {
            ImportProgress::FetchingPage { request, attempt } => {
                let msg = if attempt > 1 {
                    format!("Fetching page {request} (attempt {attempt})...")
                } else {
                    format!("Fetching page {request}...")
                };
                self.spinner.set_message(msg);
            }

            ImportProgress::FetchedPage { request, count, .. } => {
                self.spinner
                    .set_message(format!("Page {request}: importing {count} users..."));
            }

            ImportProgress::BackingOff {
                request,
                retry_after_ms,
                ..
            } => {
                self.spinner.set_message(format!(
                    "Retrying page {request} in {}",
                    format_delay(retry_after_ms)
                ));
            }

            ImportProgress::ImportComplete { .. } | ImportProgress::ImportCancelled { .. } => {
                if let Some(line) = render_line(&event) {
                    self.spinner.println(line);
                }
                self.spinner.finish_and_clear();
            }

            other => {
                if let Some(line) = render_line(&other) {
                    self.spinner.println(line);
                }
            }
        }
    }

    pub fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// The permanent output line for an event, if it has one.
fn render_line(event: &ImportProgress) -> Option<String> {
    let line = match event {
        ImportProgress::ContactAdded { email } => {
            format!("{} - {}", style(email).bold(), style("success").green())
        }
        ImportProgress::ContactFailed { email, reason } => format!(
            "{} - {} ({})",
            style(email).bold(),
            style("failure").red(),
            reason
        ),
        ImportProgress::RecordSkipped { username, reason } => format!(
            "{} - {} ({})",
            style(username.as_deref().unwrap_or("<unknown>")).bold(),
            style("skipped").yellow(),
            reason
        ),
        ImportProgress::PageFetchFailed {
            request,
            attempt,
            code,
            ..
        } => format!(
            "{}",
            style(format!(
                "Request #{request} attempt #{attempt} failed with error {code}"
            ))
            .red()
        ),
        ImportProgress::ImportComplete {
            succeeded,
            failed,
            skipped,
            ..
        } => format!(
            "{} {} added, {} failed, {} skipped",
            style("Import Complete").cyan().bold(),
            succeeded,
            failed,
            skipped
        ),
        ImportProgress::ImportCancelled { request } => format!(
            "{}",
            style(format!("Import cancelled at page {request}")).yellow()
        ),
        _ => return None,
    };
    Some(line)
}

fn format_delay(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{:.1}s", ms as f64 / 1_000.0)
    }
}
