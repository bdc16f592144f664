//! Integration tests for import sessions.
//!
//! These drive `ImportSession` end to end with in-memory sources and
//! destinations, and make sure a session always terminates within a bounded
//! time.
//!
//! Key scenarios tested:
//! - Every record produces exactly one outcome, in directory order
//! - Records without email are skipped without touching the destination
//! - Failed fetches retry the same continuation token with escalating delay
//! - The directory is never read again after the last page
//! - Bounded retries and cancellation end the session early

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use poolsync::directory::Result as DirectoryResult;
use poolsync::import::ProgressCallback;
use poolsync::{
    BackoffPolicy, Contact, ContactSync, DirectoryError, ImportError, ImportOptions, ImportOutcome,
    ImportProgress, ImportSession, PageResult, PageSource, SyncOutcome, UserRecord,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upper bound for any session in these tests. Exceeding it means a hang.
const SESSION_TIMEOUT: Duration = Duration::from_secs(600);

// ─── Fakes ──────────────────────────────────────────────────────────────────

/// A directory that replays a fixed script of fetch results.
#[derive(Clone, Default)]
struct FakeDirectory {
    script: Arc<Mutex<VecDeque<DirectoryResult<PageResult>>>>,
    requested: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeDirectory {
    fn with_script(steps: Vec<DirectoryResult<PageResult>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into())),
            requested: Arc::default(),
        }
    }

    /// Tokens passed to each fetch, in call order.
    fn requested(&self) -> Vec<Option<String>> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FakeDirectory {
    async fn fetch_page(&self, token: Option<&str>) -> DirectoryResult<PageResult> {
        self.requested.lock().unwrap().push(token.map(str::to_string));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected fetch with token {token:?}"))
    }
}

/// A destination that accepts every contact except the configured rejections.
#[derive(Clone, Default)]
struct FakeAudience {
    rejections: Arc<HashMap<String, String>>,
    received: Arc<Mutex<Vec<Contact>>>,
}

impl FakeAudience {
    fn rejecting(rejections: &[(&str, &str)]) -> Self {
        Self {
            rejections: Arc::new(
                rejections
                    .iter()
                    .map(|(email, reason)| (email.to_string(), reason.to_string()))
                    .collect(),
            ),
            received: Arc::default(),
        }
    }

    fn received_emails(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.email.clone())
            .collect()
    }
}

#[async_trait]
impl ContactSync for FakeAudience {
    async fn sync_contact(&self, contact: Contact) -> SyncOutcome {
        let outcome = match self.rejections.get(&contact.email) {
            Some(reason) => SyncOutcome::Failure(reason.clone()),
            None => SyncOutcome::Success,
        };
        self.received.lock().unwrap().push(contact);
        outcome
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn user(email: &str) -> UserRecord {
    let name = email.split('@').next().unwrap_or(email);
    UserRecord::new(name).with_attribute("email", email)
}

fn page(emails: &[&str], next: Option<&str>) -> DirectoryResult<PageResult> {
    Ok(PageResult::new(
        emails.iter().map(|e| user(e)).collect(),
        next.map(str::to_string),
    ))
}

fn throttled() -> DirectoryResult<PageResult> {
    Err(DirectoryError::unavailable(
        "TooManyRequestsException",
        "Rate exceeded",
    ))
}

fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<ImportProgress>>>) {
    let events: Arc<Mutex<Vec<ImportProgress>>> = Arc::default();
    let sink = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| {
        sink.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    });
    (callback, events)
}

/// Per-record outcome lines, rendered the way a reporter would print them.
fn outcome_lines(events: &[ImportProgress]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ImportProgress::ContactAdded { email } => Some(format!("{email} success")),
            ImportProgress::ContactFailed { email, reason } => {
                Some(format!("{email} failure {reason}"))
            }
            ImportProgress::RecordSkipped { username, .. } => {
                Some(format!("{} skipped", username.as_deref().unwrap_or("?")))
            }
            _ => None,
        })
        .collect()
}

fn fetch_failures(events: &[ImportProgress]) -> Vec<(u32, u32, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            ImportProgress::PageFetchFailed {
                request,
                attempt,
                code,
                ..
            } => Some((*request, *attempt, code.clone())),
            _ => None,
        })
        .collect()
}

fn backoff_delays(events: &[ImportProgress]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|event| match event {
            ImportProgress::BackingOff { retry_after_ms, .. } => Some(*retry_after_ms),
            _ => None,
        })
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_every_record_gets_one_outcome_in_order() {
    let emails: Vec<String> = (0..25).map(|i| format!("user{i}@example.com")).collect();
    let (first, rest) = emails.split_at(10);
    let first: Vec<&str> = first.iter().map(String::as_str).collect();
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

    let directory = FakeDirectory::with_script(vec![page(&first, Some("P2")), page(&rest, None)]);
    let audience = FakeAudience::rejecting(&[("user3@example.com", "Member Exists")]);
    let (callback, events) = recorder();

    let mut session = ImportSession::new(directory, audience.clone(), ImportOptions::default());
    let summary = tokio::time::timeout(SESSION_TIMEOUT, session.run(Some(&callback)))
        .await
        .expect("session hung")
        .expect("session failed");

    let lines = outcome_lines(&events.lock().unwrap());
    assert_eq!(lines.len(), 25);
    for (line, email) in lines.iter().zip(&emails) {
        assert!(line.starts_with(email.as_str()), "{line} out of order");
    }
    assert_eq!(lines[3], "user3@example.com failure Member Exists");

    assert_eq!(audience.received_emails(), emails);
    assert_eq!(summary.processed, 25);
    assert_eq!(summary.succeeded, 24);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.pages, 2);
}

#[tokio::test]
async fn test_missing_email_skips_destination() {
    let records = vec![
        user("a@x.com"),
        UserRecord::new("no-email"),
        UserRecord::new("blank").with_attribute("email", ""),
        user("d@x.com"),
    ];
    let directory = FakeDirectory::with_script(vec![Ok(PageResult::new(records, None))]);
    let audience = FakeAudience::default();
    let (callback, events) = recorder();

    let mut session = ImportSession::new(directory, audience.clone(), ImportOptions::default());
    let summary = session.run(Some(&callback)).await.unwrap();

    assert_eq!(audience.received_emails(), vec!["a@x.com", "d@x.com"]);
    assert_eq!(
        outcome_lines(&events.lock().unwrap()),
        vec![
            "a@x.com success",
            "no-email skipped",
            "blank skipped",
            "d@x.com success"
        ]
    );
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.processed, 4);
}

#[tokio::test(start_paused = true)]
async fn test_rejection_then_throttled_continuation() {
    let directory = FakeDirectory::with_script(vec![
        page(&["a@x.com", "b@x.com"], Some("T1")),
        throttled(),
        throttled(),
        page(&[], None),
    ]);
    let audience = FakeAudience::rejecting(&[("b@x.com", "Invalid Resource")]);
    let (callback, events) = recorder();

    let mut session =
        ImportSession::new(directory.clone(), audience, ImportOptions::default());
    let summary = tokio::time::timeout(SESSION_TIMEOUT, session.run(Some(&callback)))
        .await
        .expect("session hung")
        .expect("session failed");

    let events = events.lock().unwrap();
    assert_eq!(
        outcome_lines(&events),
        vec!["a@x.com success", "b@x.com failure Invalid Resource"]
    );
    assert_eq!(
        fetch_failures(&events),
        vec![
            (2, 1, "TooManyRequestsException".to_string()),
            (2, 2, "TooManyRequestsException".to_string()),
        ]
    );
    assert!(matches!(
        events.last(),
        Some(ImportProgress::ImportComplete {
            pages: 2,
            succeeded: 1,
            failed: 1,
            skipped: 0,
        })
    ));

    assert_eq!(
        directory.requested(),
        vec![
            None,
            Some("T1".to_string()),
            Some("T1".to_string()),
            Some("T1".to_string()),
        ]
    );
    assert_eq!(summary.outcome, ImportOutcome::Completed);
    assert_eq!(summary.fetch_failures, 2);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_escalates_and_never_decreases() {
    let mut script: Vec<_> = (0..8).map(|_| throttled()).collect();
    script.push(page(&["z@x.com"], None));
    let directory = FakeDirectory::with_script(script);
    let (callback, events) = recorder();

    let options = ImportOptions::default().with_backoff(BackoffPolicy::new(
        Duration::from_millis(100),
        Duration::from_millis(1_000),
    ));
    let mut session = ImportSession::new(directory, FakeAudience::default(), options);

    let started = Instant::now();
    session.run(Some(&callback)).await.unwrap();
    let elapsed = started.elapsed();

    let delays = backoff_delays(&events.lock().unwrap());
    assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000, 1_000, 1_000]);
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(elapsed >= Duration::from_millis(delays.iter().sum()));
}

#[tokio::test(start_paused = true)]
async fn test_success_resets_backoff() {
    let directory = FakeDirectory::with_script(vec![
        throttled(),
        throttled(),
        page(&["a@x.com"], Some("T1")),
        throttled(),
        page(&[], None),
    ]);
    let (callback, events) = recorder();

    let options = ImportOptions::default().with_backoff(BackoffPolicy::new(
        Duration::from_millis(50),
        Duration::from_secs(10),
    ));
    let mut session = ImportSession::new(directory, FakeAudience::default(), options);
    session.run(Some(&callback)).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(backoff_delays(&events), vec![50, 100, 50]);
    assert_eq!(
        fetch_failures(&events)
            .into_iter()
            .map(|(request, attempt, _)| (request, attempt))
            .collect::<Vec<_>>(),
        vec![(1, 1), (1, 2), (2, 1)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_bounded_retries_return_error() {
    let directory = FakeDirectory::with_script(vec![
        page(&["a@x.com"], Some("T1")),
        Err(DirectoryError::unavailable(
            "NotAuthorizedException",
            "Invalid credentials",
        )),
        Err(DirectoryError::unavailable(
            "NotAuthorizedException",
            "Invalid credentials",
        )),
    ]);
    let options = ImportOptions::default().with_max_attempts(Some(2));
    let mut session = ImportSession::new(directory.clone(), FakeAudience::default(), options);

    let err = session.run(None).await.expect_err("retries should run out");

    let ImportError::RetriesExhausted {
        request,
        attempts,
        source,
    } = err;
    assert_eq!((request, attempts), (2, 2));
    assert_eq!(source.code(), "NotAuthorizedException");
    assert_eq!(directory.requested().len(), 3);
}

#[tokio::test]
async fn test_cancellation_between_records() {
    let token = CancellationToken::new();

    /// Cancels the session as soon as the first contact arrives.
    #[derive(Clone)]
    struct CancellingAudience {
        token: CancellationToken,
        inner: FakeAudience,
    }

    #[async_trait]
    impl ContactSync for CancellingAudience {
        async fn sync_contact(&self, contact: Contact) -> SyncOutcome {
            self.token.cancel();
            self.inner.sync_contact(contact).await
        }
    }

    let directory = FakeDirectory::with_script(vec![page(
        &["a@x.com", "b@x.com", "c@x.com"],
        Some("T1"),
    )]);
    let audience = CancellingAudience {
        token: token.clone(),
        inner: FakeAudience::default(),
    };
    let (callback, events) = recorder();

    let mut session = ImportSession::new(directory.clone(), audience.clone(), ImportOptions::default())
        .with_cancellation(token);
    let summary = session.run(Some(&callback)).await.unwrap();

    assert_eq!(summary.outcome, ImportOutcome::Cancelled);
    assert_eq!(audience.inner.received_emails(), vec!["a@x.com"]);
    assert_eq!(directory.requested().len(), 1);
    assert!(matches!(
        events.lock().unwrap().last(),
        Some(ImportProgress::ImportCancelled { request: 1 })
    ));

    // The interrupted page is still the current one.
    assert_eq!(session.state().request_number, 1);
    assert_eq!(session.state().current_token, None);
}

#[tokio::test]
async fn test_empty_directory_completes_immediately() {
    let directory = FakeDirectory::with_script(vec![page(&[], None)]);
    let audience = FakeAudience::default();

    let mut session = ImportSession::new(directory.clone(), audience.clone(), ImportOptions::default());
    let summary = session.run(None).await.unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(summary.processed, 0);
    assert!(audience.received_emails().is_empty());
    assert_eq!(directory.requested(), vec![None]);
}
