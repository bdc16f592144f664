//! The import pipeline.
//!
//! # Module Structure
//!
//! - [`session`] - `ImportSession`, the fetch / process / back off loop
//! - `types` - `ImportState`, `ImportOptions`, `ImportSummary`, `ImportError`
//! - `backoff` - `BackoffPolicy`, the pure delay schedule for failed fetches
//! - `progress` - `ImportProgress` events, `ProgressCallback`, `emit()`
//!
//! # Example
//!
//! ```ignore
//! use poolsync::import::{ImportOptions, ImportProgress, ImportSession, ProgressCallback};
//!
//! let callback: ProgressCallback = Box::new(|event| {
//!     if let ImportProgress::ContactFailed { email, reason } = event {
//!         eprintln!("{email}: {reason}");
//!     }
//! });
//!
//! let mut session = ImportSession::new(source, sync, ImportOptions::default());
//! let summary = session.run(Some(&callback)).await?;
//! ```

mod backoff;
mod progress;
pub mod session;
mod types;

pub use backoff::{BACKOFF_FACTOR, BackoffPolicy, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS};
pub use progress::{ImportProgress, ProgressCallback, emit};
pub use session::ImportSession;
pub use types::{ImportError, ImportOptions, ImportOutcome, ImportState, ImportSummary};
