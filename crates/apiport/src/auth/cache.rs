//! Single-flight cache for the bearer token.

use super::token::{AccessToken, TokenPolicy, TokenState};
use crate::clock::Clock;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Holds at most one access token and serializes its renewal.
///
/// The lock is held across the authentication call, so while one caller is
/// fetching a token every other caller waits and then reuses the fresh value.
/// Requests themselves run outside the lock.
#[derive(Debug)]
pub struct TokenCache {
    slot: Mutex<Option<AccessToken>>,
    policy: TokenPolicy,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(policy: TokenPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            policy,
            clock,
        }
    }

    /// The renewal policy applied to fetched tokens.
    #[must_use]
    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Return the cached token, or fetch a new one with `fetch` when none is
    /// cached or the cached one has entered its refresh window.
    ///
    /// A stale token is dropped before `fetch` runs. If `fetch` fails the cache
    /// stays empty and the error is returned as is; there is no retry.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `fetch`.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(token) = slot.as_ref() {
            if !token.needs_refresh(now) {
                return Ok(token.clone());
            }
            debug!(
                expires_in_secs = token.seconds_until_expiry(now),
                "Access token entered refresh window"
            );
        }

        self.replace(&mut slot, fetch).await
    }

    /// Fetch a new token with `fetch` unconditionally, replacing any cached one.
    ///
    /// Callers arriving while the fetch runs wait for it and reuse the result.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `fetch`; the cache is left empty.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut slot = self.slot.lock().await;
        self.replace(&mut slot, fetch).await
    }

    async fn replace<F, Fut>(&self, slot: &mut Option<AccessToken>, fetch: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        *slot = None;
        let secret = fetch().await?;
        let token = AccessToken::new(secret, self.clock.now(), &self.policy);
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Drop `stale` from the cache.
    ///
    /// Does nothing if the cache already holds a different token, so a caller
    /// reacting to a rejected token cannot discard one fetched after it.
    /// Returns whether the cache was cleared.
    pub async fn invalidate(&self, stale: &AccessToken) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|current| current == stale) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// The cached token, if any, regardless of its state.
    pub async fn current(&self) -> Option<AccessToken> {
        self.slot.lock().await.clone()
    }

    /// Validity of the cached token right now.
    pub async fn state(&self) -> TokenState {
        let now = self.clock.now();
        self.slot
            .lock()
            .await
            .as_ref()
            .map_or(TokenState::Unset, |token| token.state(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::error::Error;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn cache_with(clock: Arc<ManualClock>) -> TokenCache {
        TokenCache::new(TokenPolicy::from_secs(3600, 300), clock)
    }

    async fn fetch_counted(cache: &TokenCache, calls: &AtomicUsize) -> Result<AccessToken> {
        cache
            .get_or_refresh(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(format!("token-{n}"))
            })
            .await
    }

    #[tokio::test]
    async fn test_first_call_fetches_then_reuses() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(Arc::clone(&clock));
        let calls = AtomicUsize::new(0);

        assert_eq!(cache.state().await, TokenState::Unset);

        let first = fetch_counted(&cache, &calls).await.unwrap();
        let second = fetch_counted(&cache, &calls).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(cache.state().await, TokenState::Valid);
    }

    #[tokio::test]
    async fn test_refresh_happens_inside_buffer_only() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(Arc::clone(&clock));
        let calls = AtomicUsize::new(0);

        let original = fetch_counted(&cache, &calls).await.unwrap();

        clock.set_secs(3000);
        let still = fetch_counted(&cache, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(still.secret(), "token-1");

        clock.set_secs(3301);
        assert_eq!(cache.state().await, TokenState::NearExpiry);
        let renewed = fetch_counted(&cache, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(renewed.secret(), "token-2");
        assert!(renewed.issued_at() > original.issued_at());

        // The new token is the only one handed out from now on.
        let after = fetch_counted(&cache, &calls).await.unwrap();
        assert_eq!(after.secret(), "token-2");
    }

    #[tokio::test]
    async fn test_explicit_refresh_replaces_valid_token() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(Arc::clone(&clock));
        let calls = AtomicUsize::new(0);

        let first = fetch_counted(&cache, &calls).await.unwrap();
        let replaced = cache
            .refresh(|| async { Ok("forced".to_string()) })
            .await
            .unwrap();

        assert_ne!(first, replaced);
        assert_eq!(cache.current().await, Some(replaced));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_unset() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(Arc::clone(&clock));
        let calls = AtomicUsize::new(0);

        fetch_counted(&cache, &calls).await.unwrap();
        clock.set_secs(3500);

        let err = cache
            .get_or_refresh(|| async { Err(Error::Authentication("bad password".into())) })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(cache.state().await, TokenState::Unset);
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_only_clears_matching_token() {
        let clock = Arc::new(ManualClock::new());
        let cache = cache_with(Arc::clone(&clock));
        let calls = AtomicUsize::new(0);

        let first = fetch_counted(&cache, &calls).await.unwrap();
        assert!(cache.invalidate(&first).await);
        assert_eq!(cache.state().await, TokenState::Unset);

        let second = fetch_counted(&cache, &calls).await.unwrap();
        // A late invalidation for the old token must not drop the new one.
        assert!(!cache.invalidate(&first).await);
        assert_eq!(cache.current().await, Some(second));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = Arc::new(TokenCache::new(TokenPolicy::default(), Arc::new(SystemClock)));
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_refresh(|| async {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok("shared".to_string())
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.secret(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    proptest! {
        // Any sequence of calls that stays before the refresh window costs
        // exactly one authentication.
        #[test]
        fn prop_single_fetch_within_window(offsets in prop::collection::vec(0i64..3300, 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let clock = Arc::new(ManualClock::new());
                let cache = cache_with(Arc::clone(&clock));
                let calls = AtomicUsize::new(0);

                let mut sorted = offsets.clone();
                sorted.sort_unstable();
                for offset in sorted {
                    clock.set_secs(offset);
                    fetch_counted(&cache, &calls).await.unwrap();
                }
                prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
                Ok(())
            })?;
        }
    }
}
