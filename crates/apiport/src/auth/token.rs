//! Access token value and expiry policy.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Upper bound for policy durations.
const MAX_POLICY_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// How long tokens live and how early they are renewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    lifetime: Duration,
    refresh_buffer: Duration,
}

impl TokenPolicy {
    /// Build a policy from whole seconds.
    ///
    /// Values are capped at ten years. Callers are expected to have validated
    /// that `refresh_buffer_secs < lifetime_secs`.
    #[must_use]
    pub fn from_secs(lifetime_secs: u64, refresh_buffer_secs: u64) -> Self {
        let secs = |s: u64| {
            Duration::seconds(i64::try_from(s).map_or(MAX_POLICY_SECS, |s| s.min(MAX_POLICY_SECS)))
        };
        Self {
            lifetime: secs(lifetime_secs),
            refresh_buffer: secs(refresh_buffer_secs),
        }
    }

    /// Token lifetime measured from issue.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Window before expiry in which the token is renewed.
    #[must_use]
    pub fn refresh_buffer(&self) -> Duration {
        self.refresh_buffer
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self::from_secs(
            crate::config::DEFAULT_TOKEN_LIFETIME_SECS,
            crate::config::DEFAULT_REFRESH_BUFFER_SECS,
        )
    }
}

/// Validity of the cached token at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token is cached.
    Unset,
    /// A token is cached and outside its refresh window.
    Valid,
    /// A token is cached but inside its refresh window (or already expired).
    NearExpiry,
}

/// A bearer token together with its expiry bookkeeping.
///
/// Tokens are never modified after creation. A refresh produces a new value
/// that replaces the cached one.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    refresh_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token issued at `issued_at` under `policy`.
    #[must_use]
    pub fn new(secret: impl Into<String>, issued_at: DateTime<Utc>, policy: &TokenPolicy) -> Self {
        let expires_at = issued_at + policy.lifetime();
        Self {
            secret: secret.into(),
            issued_at,
            expires_at,
            refresh_at: expires_at - policy.refresh_buffer(),
        }
    }

    /// The raw bearer value.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// When the token was obtained.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Hard expiry.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Start of the refresh window.
    #[must_use]
    pub fn refresh_at(&self) -> DateTime<Utc> {
        self.refresh_at
    }

    /// Whether the token must be renewed before being used at `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_at
    }

    /// Whether the token is past its hard expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds left before hard expiry, never negative.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Validity of this token at `now`.
    #[must_use]
    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.needs_refresh(now) {
            TokenState::NearExpiry
        } else {
            TokenState::Valid
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("refresh_at", &self.refresh_at)
            .finish()
    }
}
