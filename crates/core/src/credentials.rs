//! Credential types.
//!
//! Operator credentials authenticate ingestion calls; user credentials are
//! supplied per request and only ever combined with a candidate URL at read
//! time. The two types share no conversion, and neither one's `Debug` output
//! contains the password.

use std::fmt;

/// Service-level file-search account used during ingestion.
#[derive(Clone, PartialEq, Eq)]
pub struct OperatorCredentials {
    username: String,
    password: String,
}

impl OperatorCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for OperatorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Caller-supplied file-search account, used only to build a playable URL.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
    username: String,
    password: String,
}

impl UserCredentials {
    /// Returns `None` unless both parts are non-empty.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Option<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}
