//! Shared server context.
//!
//! The context owns the configuration and the tracker. The tracker is built
//! lazily on the first call that needs it, exactly once, so the server can
//! start (and list its tools) before credentials are checked. Concurrent first
//! calls wait for the same construction.

use apiport::{ApiPortClient, Config, Tracker};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Configuration plus the lazily created tracker.
pub struct Context {
    config: Config,
    tracker: OnceCell<Arc<dyn Tracker>>,
}

impl Context {
    /// Create a context that will build an [`ApiPortClient`] from `config`
    /// on first use.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tracker: OnceCell::new(),
        }
    }

    /// Create a context around an existing tracker.
    #[must_use]
    pub fn with_tracker(config: Config, tracker: Arc<dyn Tracker>) -> Self {
        Self {
            config,
            tracker: OnceCell::new_with(Some(tracker)),
        }
    }

    /// The tracker, building the HTTP client on first call.
    ///
    /// A failed construction is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns `apiport::Error::Config` if the credentials are missing or the
    /// HTTP client cannot be built.
    pub async fn tracker(&self) -> apiport::Result<Arc<dyn Tracker>> {
        self.tracker
            .get_or_try_init(|| async {
                let client = ApiPortClient::new(&self.config)?;
                info!(api_url = %client.base_url(), "ApiPort client initialized");
                Ok(Arc::new(client) as Arc<dyn Tracker>)
            })
            .await
            .cloned()
    }

    /// Whether the tracker has been created.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.tracker.initialized()
    }

    /// The configuration this context was created with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiport::mock::MockTracker;

    fn config_with_credentials() -> Config {
        Config {
            api_url: "http://127.0.0.1:1".into(),
            email: Some("dev@example.com".into()),
            password: Some("secret".into()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_client_is_built_lazily_once() {
        let context = Context::new(config_with_credentials());
        assert!(!context.is_initialized());

        let first = context.tracker().await.unwrap();
        let second = context.tracker().await.unwrap();

        assert!(context.is_initialized());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_at_first_use() {
        let context = Context::new(Config::default());
        let Err(err) = context.tracker().await else {
            panic!("expected a configuration error");
        };
        assert!(matches!(err, apiport::Error::Config(_)));
        assert!(!context.is_initialized());
    }

    #[tokio::test]
    async fn test_with_tracker_is_initialized() {
        let context = Context::with_tracker(Config::default(), Arc::new(MockTracker::new()));
        assert!(context.is_initialized());
        assert!(context.tracker().await.is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let context = Context::new(config_with_credentials());
        assert!(!format!("{context:?}").contains("secret"));
    }
}
