//! Credentials and bearer token lifecycle.
//!
//! The API issues a short-lived access token in exchange for an email and
//! password. The token is cached in memory and renewed shortly before it
//! expires:
//!
//! ```text
//! Unset --authenticate--> Valid --time passes--> NearExpiry
//!   ^                                                |
//!   +------------- cleared before re-auth -----------+
//! ```
//!
//! [`TokenCache`] guards the single cached token so that concurrent callers
//! share one in-flight authentication instead of racing each other.

mod cache;
mod token;

pub use cache::TokenCache;
pub use token::{AccessToken, TokenPolicy, TokenState};

use std::fmt;

/// Login credentials, immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Create credentials from an email and password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
