//! Poolsync - import identity directory users into a marketing contact list.
//!
//! The library is split along the three pieces of the import pipeline:
//!
//! - [`directory`] - the paginated user source (`PageSource`), with an AWS
//!   Cognito implementation behind the `cognito` feature.
//! - [`destination`] - the contact list (`ContactSync`), with a Mailchimp
//!   implementation behind the `mailchimp` feature.
//! - [`import`] - the `ImportSession` that drives both, one page and one
//!   contact at a time, retrying failed page fetches with backoff.
//!
//! # Example
//!
//! ```ignore
//! use poolsync::destination::MailchimpClient;
//! use poolsync::directory::CognitoPageSource;
//! use poolsync::import::{ImportOptions, ImportSession};
//!
//! let source = CognitoPageSource::connect("us-east-1_AbCdEf", None).await?;
//! let sync = MailchimpClient::new("0123abcd-us6", "a1b2c3")?;
//!
//! let mut session = ImportSession::new(source, sync, ImportOptions::default());
//! let summary = session.run(None).await?;
//! println!("{} contacts added", summary.succeeded);
//! ```

pub mod destination;
pub mod directory;
pub mod http;
pub mod import;

pub use destination::{Contact, ContactSync, SyncOutcome};
pub use directory::{DirectoryError, PageResult, PageSource, UserRecord};
pub use import::{
    BackoffPolicy, ImportError, ImportOptions, ImportOutcome, ImportProgress, ImportSession,
    ImportState, ImportSummary, ProgressCallback,
};
