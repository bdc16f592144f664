//! Mailchimp audience as a [`ContactSync`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use super::ContactSync;
use super::error::{MailchimpError, rejection_reason};
use super::types::{Contact, SyncOutcome};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpTransport};

/// Basic-auth username. Mailchimp ignores it but requires it to be non-empty.
pub const AUTH_USERNAME: &str = "poolsync";

/// A Mailchimp API key and the data center it routes to.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    key: String,
    data_center: String,
}

impl ApiKey {
    /// Parse a key of the form `<secret>-<dc>`.
    ///
    /// The data center is everything after the first hyphen.
    pub fn parse(key: &str) -> Result<Self, MailchimpError> {
        let key = key.trim();
        match key.split_once('-') {
            Some((secret, dc)) if !secret.is_empty() && !dc.is_empty() => Ok(Self {
                key: key.to_string(),
                data_center: dc.to_string(),
            }),
            _ => Err(MailchimpError::InvalidApiKey(
                "expected <key>-<data center>, e.g. 0123abcd-us6".to_string(),
            )),
        }
    }

    /// Data center code, e.g. `us6`.
    pub fn data_center(&self) -> &str {
        &self.data_center
    }

    /// API host for this key's data center.
    pub fn api_host(&self) -> String {
        format!("{}.api.mailchimp.com", self.data_center)
    }

    /// Versioned API base URL.
    pub fn base_url(&self) -> String {
        format!("https://{}/3.0", self.api_host())
    }

    fn authorization(&self) -> String {
        let credentials = STANDARD.encode(format!("{AUTH_USERNAME}:{}", self.key));
        format!("Basic {credentials}")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &"<redacted>")
            .field("data_center", &self.data_center)
            .finish()
    }
}

#[derive(Serialize)]
struct MemberRequest<'a> {
    email_address: &'a str,
    status: &'static str,
}

/// Client for one Mailchimp audience (list).
#[derive(Clone)]
pub struct MailchimpClient {
    transport: Arc<dyn HttpTransport>,
    api_key: ApiKey,
    list_id: String,
}

impl MailchimpClient {
    /// Create a client for `list_id` using a reqwest transport.
    pub fn new(api_key: &str, list_id: &str) -> Result<Self, MailchimpError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| MailchimpError::Config(e.to_string()))?;

        Self::new_with_transport(api_key, list_id, Arc::new(transport))
    }

    pub fn new_with_transport(
        api_key: &str,
        list_id: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, MailchimpError> {
        let api_key = ApiKey::parse(api_key)?;
        let list_id = list_id.trim();
        if list_id.is_empty() {
            return Err(MailchimpError::Config("list id is empty".to_string()));
        }

        Ok(Self {
            transport,
            api_key,
            list_id: list_id.to_string(),
        })
    }

    /// Endpoint that creates list members.
    pub fn members_url(&self) -> String {
        format!("{}/lists/{}/members", self.api_key.base_url(), self.list_id)
    }

    /// Add `contact` to the list.
    pub async fn add_member(&self, contact: &Contact) -> Result<(), MailchimpError> {
        let body = serde_json::to_vec(&MemberRequest {
            email_address: &contact.email,
            status: if contact.subscribed {
                "subscribed"
            } else {
                "unsubscribed"
            },
        })?;

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.members_url(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), "poolsync".to_string()),
                ("Authorization".to_string(), self.api_key.authorization()),
            ],
            body,
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| MailchimpError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(MailchimpError::ContactRejected {
                status: response.status,
                reason: rejection_reason(response.status, &response.body),
                request_id: response.header("X-Request-Id").map(str::to_string),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ContactSync for MailchimpClient {
    async fn sync_contact(&self, contact: Contact) -> SyncOutcome {
        match self.add_member(&contact).await {
            Ok(()) => SyncOutcome::Success,
            Err(MailchimpError::ContactRejected {
                status,
                reason,
                request_id,
            }) => {
                tracing::debug!(
                    email = %contact.email,
                    status,
                    request_id = ?request_id,
                    reason = %reason,
                    "Contact rejected"
                );
                SyncOutcome::Failure(reason)
            }
            Err(e) => {
                tracing::debug!(email = %contact.email, error = %e, "Contact not added");
                SyncOutcome::Failure(e.reason())
            }
        }
    }
}
