//! Caller identity
//!
//! The engine trusts the caller-supplied identity; authentication happens
//! upstream. The actor is stamped onto created/updated records and audit
//! entries.

use serde::{Deserialize, Serialize};

/// Identity of the staff member performing an operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    /// Stable user ID from the identity provider
    pub uid: String,
    /// Email, when the identity provider supplies one
    pub email: Option<String>,
}

impl Actor {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into(), email: None }
    }

    pub fn with_email(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: Some(email.into()),
        }
    }
}
