//! Contact list destination.
//!
//! [`ContactSync`] implementations turn every failure into a
//! [`SyncOutcome::Failure`] so that one bad contact never stops a page.

#[cfg(feature = "mailchimp")]
mod error;
#[cfg(feature = "mailchimp")]
mod mailchimp;
mod types;

use async_trait::async_trait;

#[cfg(feature = "mailchimp")]
pub use error::{MailchimpError, rejection_reason};
#[cfg(feature = "mailchimp")]
pub use mailchimp::{ApiKey, AUTH_USERNAME, MailchimpClient};
pub use types::{Contact, SyncOutcome};

/// A destination that accepts contacts one at a time.
#[async_trait]
pub trait ContactSync: Send + Sync {
    /// Create or subscribe `contact`. Never fails; failures are outcomes.
    async fn sync_contact(&self, contact: Contact) -> SyncOutcome;
}
