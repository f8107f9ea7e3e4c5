//! Port interface for the leaderboard listing cache.
//!
//! The core never populates this cache; it only invalidates the fixed
//! listing key when a user's aggregate genuinely changes. Staleness is
//! tolerable, incorrect cached maxima are not.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

/// Key of the leaderboard-style listing invalidated on aggregate changes.
pub const LEADERBOARD_CACHE_KEY: &str = "users:list:default";

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum LeaderboardCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "leaderboard cache backend failure: {message}",
    }
}

/// Port for the key-value cache collaborating with the stats tracker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardCache: Send + Sync {
    /// Read a cached value for the given key.
    async fn get(&self, key: &str) -> Result<Option<String>, LeaderboardCacheError>;

    /// Store a value under the key, optionally expiring after `ttl`.
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), LeaderboardCacheError>;

    /// Drop the key, if present.
    async fn del(&self, key: &str) -> Result<(), LeaderboardCacheError>;
}

/// No-op cache for cache-less deployments and incidental test wiring.
///
/// All `get` operations miss; `set` and `del` succeed silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLeaderboardCache;

#[async_trait]
impl LeaderboardCache for NoOpLeaderboardCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, LeaderboardCacheError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), LeaderboardCacheError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<(), LeaderboardCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoOpLeaderboardCache;
        let value = cache
            .get(LEADERBOARD_CACHE_KEY)
            .await
            .expect("get succeeds");
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn noop_cache_accepts_writes_and_deletes() {
        let cache = NoOpLeaderboardCache;
        cache
            .set(LEADERBOARD_CACHE_KEY, "[]", Some(Duration::from_secs(60)))
            .await
            .expect("set succeeds");
        cache.del(LEADERBOARD_CACHE_KEY).await.expect("del succeeds");
    }
}
