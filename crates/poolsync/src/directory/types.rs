use std::collections::BTreeMap;

use super::error::{DirectoryError, Result};

/// Name of the attribute holding a user's email address.
pub const EMAIL_ATTRIBUTE: &str = "email";

/// A single user entry from the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    /// Directory username, when the provider reports one.
    pub username: Option<String>,
    /// Attribute name to value.
    pub attributes: BTreeMap<String, String>,
}

impl UserRecord {
    /// Create a record for the given username with no attributes.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute, returning the updated record.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The record's email address.
    ///
    /// A blank value is reported the same way as a missing attribute.
    pub fn email(&self) -> Result<&str> {
        self.attribute(EMAIL_ATTRIBUTE)
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| DirectoryError::MissingEmailAttribute {
                username: self.username.clone(),
            })
    }
}

/// One page of directory results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    /// Records in the order the directory returned them.
    pub records: Vec<UserRecord>,
    /// Token for the next page; `None` once the directory is exhausted.
    pub next_token: Option<String>,
}

impl PageResult {
    /// Build a page, treating an empty continuation token as exhausted.
    pub fn new(records: Vec<UserRecord>, next_token: Option<String>) -> Self {
        Self {
            records,
            next_token: next_token.filter(|token| !token.is_empty()),
        }
    }

    /// Whether this is the final page.
    #[inline]
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_read_from_attribute() {
        let record = UserRecord::new("alice").with_attribute("email", "alice@example.com");
        assert_eq!(record.email().unwrap(), "alice@example.com");
    }

    #[test]
    fn email_is_trimmed() {
        let record = UserRecord::new("alice").with_attribute("email", "  alice@example.com ");
        assert_eq!(record.email().unwrap(), "alice@example.com");
    }

    #[test]
    fn missing_email_reports_username() {
        let record = UserRecord::new("bob").with_attribute("name", "Bob");
        match record.email() {
            Err(DirectoryError::MissingEmailAttribute { username }) => {
                assert_eq!(username.as_deref(), Some("bob"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn blank_email_counts_as_missing() {
        let record = UserRecord::new("carol").with_attribute("email", "   ");
        assert!(matches!(
            record.email(),
            Err(DirectoryError::MissingEmailAttribute { .. })
        ));
    }

    #[test]
    fn page_with_empty_token_is_last() {
        let page = PageResult::new(Vec::new(), Some(String::new()));
        assert!(page.is_last());
        assert_eq!(page.next_token, None);

        let page = PageResult::new(Vec::new(), Some("T1".to_string()));
        assert!(!page.is_last());
    }
}
