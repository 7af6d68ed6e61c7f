//! API key handling for the proxy collaborator.
//!
//! Keys live in a `secrecy::SecretBox` so they never show up in logs, debug
//! output or error messages.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// An Eventor API key that renders as `[REDACTED]`.
pub struct ApiKey(SecretBox<str>);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Only call this when building the proxy request body.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
