//! Configuration for the ApiPort client.
//!
//! Configuration comes from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional YAML file (kebab-case keys, same shape as [`Config`])
//! 3. Environment variables (`APIPORT_API_URL`, `APIPORT_EMAIL`, `APIPORT_PASSWORD`,
//!    `VERIFY_SSL`, `DEBUG`, `APIPORT_TIMEOUT_SECS`, `APIPORT_TOKEN_LIFETIME_SECS`,
//!    `APIPORT_REFRESH_BUFFER_SECS`)
//!
//! Credentials are optional at load time. They are only required when a client
//! is actually built, see [`Config::credentials`].

use crate::auth::{Credentials, TokenPolicy};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.apiport.hu";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default access token lifetime in seconds (one hour).
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Default window before expiry in which the token is renewed (five minutes).
pub const DEFAULT_REFRESH_BUFFER_SECS: u64 = 300;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "APIPORT_API_URL";
/// Environment variable holding the login email.
pub const ENV_EMAIL: &str = "APIPORT_EMAIL";
/// Environment variable holding the login password.
pub const ENV_PASSWORD: &str = "APIPORT_PASSWORD";
/// Environment variable toggling TLS certificate verification.
pub const ENV_VERIFY_SSL: &str = "VERIFY_SSL";
/// Environment variable enabling debug logging.
pub const ENV_DEBUG: &str = "DEBUG";
/// Environment variable overriding the request timeout.
pub const ENV_TIMEOUT_SECS: &str = "APIPORT_TIMEOUT_SECS";
/// Environment variable overriding the token lifetime.
pub const ENV_TOKEN_LIFETIME_SECS: &str = "APIPORT_TOKEN_LIFETIME_SECS";
/// Environment variable overriding the refresh buffer.
pub const ENV_REFRESH_BUFFER_SECS: &str = "APIPORT_REFRESH_BUFFER_SECS";

/// Client configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Base URL of the ApiPort server, without the `/api` suffix.
    pub api_url: String,

    /// Login email.
    pub email: Option<String>,

    /// Login password.
    pub password: Option<String>,

    /// Verify TLS certificates.
    pub verify_ssl: bool,

    /// Enable debug logging.
    pub debug: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Token lifetime policy.
    pub token: TokenSettings,
}

/// Token lifetime settings, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TokenSettings {
    /// How long an access token stays valid after it is issued.
    pub lifetime_secs: u64,

    /// How long before expiry the token is proactively renewed.
    pub refresh_buffer_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            refresh_buffer_secs: DEFAULT_REFRESH_BUFFER_SECS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            email: None,
            password: None,
            verify_ssl: true,
            debug: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token: TokenSettings::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("verify_ssl", &self.verify_ssl)
            .field("debug", &self.debug)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token", &self.token)
            .finish()
    }
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Build the effective configuration: defaults, then the optional file,
    /// then the process environment. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded, an environment variable
    /// has an unparsable value, or the merged configuration is inconsistent.
    pub async fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path).await?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values produced by `lookup`, keyed by environment variable name.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a boolean or numeric value cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url.trim().to_string();
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.email = Some(email.trim().to_string());
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(value) = get(ENV_VERIFY_SSL) {
            self.verify_ssl = parse_bool(ENV_VERIFY_SSL, &value)?;
        }
        if let Some(value) = get(ENV_DEBUG) {
            self.debug = parse_bool(ENV_DEBUG, &value)?;
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_secs(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_TOKEN_LIFETIME_SECS) {
            self.token.lifetime_secs = parse_secs(ENV_TOKEN_LIFETIME_SECS, &value)?;
        }
        if let Some(value) = get(ENV_REFRESH_BUFFER_SECS) {
            self.token.refresh_buffer_secs = parse_secs(ENV_REFRESH_BUFFER_SECS, &value)?;
        }
        Ok(())
    }

    /// Check that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(Error::Config("API URL must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "API URL must start with http:// or https://, got '{url}'"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "Request timeout must be at least one second".to_string(),
            ));
        }
        if self.token.lifetime_secs == 0 {
            return Err(Error::Config(
                "Token lifetime must be at least one second".to_string(),
            ));
        }
        if self.token.refresh_buffer_secs >= self.token.lifetime_secs {
            return Err(Error::Config(format!(
                "Refresh buffer ({}s) must be shorter than the token lifetime ({}s)",
                self.token.refresh_buffer_secs, self.token.lifetime_secs
            )));
        }
        Ok(())
    }

    /// The login credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the email or password is missing or blank.
    pub fn credentials(&self) -> Result<Credentials> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Ok(Credentials::new(email.trim(), password))
            }
            _ => Err(Error::Config(format!(
                "{ENV_EMAIL} and {ENV_PASSWORD} must be set"
            ))),
        }
    }

    /// Base URL with any trailing slashes removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_url.trim().trim_end_matches('/')
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The token renewal policy.
    #[must_use]
    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy::from_secs(self.token.lifetime_secs, self.token.refresh_buffer_secs)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{key} must be a boolean (true/false), got '{other}'"
        ))),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a whole number of seconds, got '{value}'")))
}
