//! Mailchimp API error types.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the Mailchimp API.
#[derive(Debug, Error)]
pub enum MailchimpError {
    /// The API key has no `-<dc>` suffix.
    #[error("Invalid Mailchimp API key: {0}")]
    InvalidApiKey(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The API declined the contact (validation, duplicate, ...).
    #[error("{reason}")]
    ContactRejected {
        status: u16,
        reason: String,
        /// Mailchimp's `X-Request-Id`, for support tickets.
        request_id: Option<String>,
    },

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request body could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MailchimpError {
    /// Text reported as the contact's failure reason.
    pub fn reason(&self) -> String {
        match self {
            Self::ContactRejected { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Mailchimp's problem-details error document.
#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    title: Option<String>,
    detail: Option<String>,
}

/// Pick the most useful reason from an error response body.
///
/// Prefers the `title` field, then `detail`, then the bare status code.
pub fn rejection_reason(status: u16, body: &[u8]) -> String {
    let document: ErrorDocument = serde_json::from_slice(body).unwrap_or_default();

    [document.title, document.detail]
        .into_iter()
        .flatten()
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}
