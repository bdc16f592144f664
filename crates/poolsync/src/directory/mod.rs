//! Paginated user directory.
//!
//! [`PageSource`] is the only thing the import session knows about the
//! directory. Implementations fetch exactly one page per call and never retry
//! on their own; the session owns the retry policy.

#[cfg(feature = "cognito")]
mod cognito;
mod error;
mod types;

use async_trait::async_trait;

#[cfg(feature = "cognito")]
pub use cognito::{CognitoPageSource, MAX_PAGE_SIZE, region_from_pool_id};
pub use error::{DirectoryError, Result};
pub use types::{EMAIL_ATTRIBUTE, PageResult, UserRecord};

/// A paginated source of user records.
///
/// Fetching the same token twice must be safe: a failed call may be retried
/// with the same token without skipping or duplicating records.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page identified by `token`, or the first page when `None`.
    async fn fetch_page(&self, token: Option<&str>) -> Result<PageResult>;
}
