/// A contact ready to be written to the destination list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub email: String,
    pub subscribed: bool,
}

impl Contact {
    /// A new, subscribed contact.
    pub fn subscribed(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            subscribed: true,
        }
    }
}

/// Result of syncing a single contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Contact was added to the list.
    Success,
    /// Contact was not added, with a human-readable reason.
    Failure(String),
}

impl SyncOutcome {
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure(reason) => Some(reason),
        }
    }
}
