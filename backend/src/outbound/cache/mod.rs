//! Redis-backed leaderboard cache adapter.
//!
//! Implements the `LeaderboardCache` port over `bb8-redis`. Values are
//! opaque strings (another component serialises the listing); this crate
//! only needs `get`/`set`/`del`, with the tracker using `del` alone. Writes
//! apply TTL jitter to prevent a thundering herd when many entries expire
//! together.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use bb8_redis::{bb8, RedisConnectionManager};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::ports::{LeaderboardCache, LeaderboardCacheError};

/// Configuration for the Redis cache connection pool.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    redis_url: String,
    max_size: u32,
    connection_timeout: Duration,
    max_ttl_jitter: Duration,
}

impl CacheConfig {
    /// Create a new configuration with the given Redis URL.
    ///
    /// Uses sensible defaults:
    /// - `max_size`: 8 connections
    /// - `connection_timeout`: 5 seconds
    /// - `max_ttl_jitter`: 30 seconds
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            max_size: 8,
            connection_timeout: Duration::from_secs(5),
            max_ttl_jitter: Duration::from_secs(30),
        }
    }

    /// Set the maximum number of pooled connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the connection checkout timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the upper bound of the random TTL extension.
    pub fn with_max_ttl_jitter(mut self, jitter: Duration) -> Self {
        self.max_ttl_jitter = jitter;
        self
    }
}

/// Extend a TTL by a random amount up to `max_jitter`.
///
/// Spreads expiries out so entries written together do not all fall out of
/// the cache in the same instant.
fn jittered_ttl(ttl: Duration, max_jitter: Duration, rng: &mut impl Rng) -> Duration {
    if max_jitter.is_zero() {
        return ttl;
    }
    let extra_ms = rng.gen_range(0..=max_jitter.as_millis());
    ttl + Duration::from_millis(u64::try_from(extra_ms).unwrap_or(u64::MAX))
}

/// Redis-backed implementation of the `LeaderboardCache` port.
#[derive(Clone)]
pub struct RedisLeaderboardCache {
    pool: bb8::Pool<RedisConnectionManager>,
    max_ttl_jitter: Duration,
}

impl RedisLeaderboardCache {
    /// Create a new cache adapter with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardCacheError::Backend`] if the URL is rejected or
    /// the pool cannot be built.
    pub async fn new(config: CacheConfig) -> Result<Self, LeaderboardCacheError> {
        let manager = RedisConnectionManager::new(config.redis_url.clone())
            .map_err(|err| LeaderboardCacheError::backend(err.to_string()))?;

        let pool = bb8::Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| LeaderboardCacheError::backend(err.to_string()))?;

        Ok(Self {
            pool,
            max_ttl_jitter: config.max_ttl_jitter,
        })
    }

    async fn connection(
        &self,
    ) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>, LeaderboardCacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| LeaderboardCacheError::backend(err.to_string()))
    }
}

#[async_trait]
impl LeaderboardCache for RedisLeaderboardCache {
    async fn get(&self, key: &str) -> Result<Option<String>, LeaderboardCacheError> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|err| LeaderboardCacheError::backend(err.to_string()))
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), LeaderboardCacheError> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                let mut rng = SmallRng::from_entropy();
                let effective = jittered_ttl(ttl, self.max_ttl_jitter, &mut rng);
                let seconds = effective.as_secs().max(1);
                let _: () = conn
                    .set_ex(key, value, seconds)
                    .await
                    .map_err(|err| LeaderboardCacheError::backend(err.to_string()))?;
            }
            None => {
                let _: () = conn
                    .set(key, value)
                    .await
                    .map_err(|err| LeaderboardCacheError::backend(err.to_string()))?;
            }
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), LeaderboardCacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .del(key)
            .await
            .map_err(|err| LeaderboardCacheError::backend(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn cache_config_default_values() {
        let config = CacheConfig::new("redis://localhost/0");

        assert_eq!(config.max_size, 8);
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
        assert_eq!(config.max_ttl_jitter, Duration::from_secs(30));
    }

    #[rstest]
    fn cache_config_builder_pattern() {
        let config = CacheConfig::new("redis://localhost/0")
            .with_max_size(2)
            .with_connection_timeout(Duration::from_millis(250))
            .with_max_ttl_jitter(Duration::ZERO);

        assert_eq!(config.max_size, 2);
        assert_eq!(config.connection_timeout, Duration::from_millis(250));
        assert_eq!(config.max_ttl_jitter, Duration::ZERO);
    }

    #[rstest]
    fn jitter_stays_within_its_bound() {
        let mut rng = SmallRng::seed_from_u64(7);
        let ttl = Duration::from_secs(600);
        let max_jitter = Duration::from_secs(30);

        for _ in 0..100 {
            let effective = jittered_ttl(ttl, max_jitter, &mut rng);
            assert!(effective >= ttl);
            assert!(effective <= ttl + max_jitter);
        }
    }

    #[rstest]
    fn zero_jitter_leaves_the_ttl_alone() {
        let mut rng = SmallRng::seed_from_u64(7);
        let ttl = Duration::from_secs(600);

        assert_eq!(jittered_ttl(ttl, Duration::ZERO, &mut rng), ttl);
    }
}
