//! Derived highest-ranked-count tracking.
//!
//! `highest_ranked_count` is the largest Pokémon count across a user's
//! rankings, cached on the user row and mirrored into a leaderboard listing
//! cache owned by another component. The tracker is the only writer of the
//! stored value. Downstream caches are long-lived and invalidated only on
//! genuine change; an unchanged recompute is a strict no-op with no write
//! and no invalidation.

use std::sync::Arc;

use tracing::debug;

use crate::domain::ports::{
    LeaderboardCache, LeaderboardCacheError, RankedStatsRepository, RankedStatsRepositoryError,
    LEADERBOARD_CACHE_KEY,
};
use crate::domain::user::UserId;
use crate::domain::Error;

/// Recomputes and persists the per-user highest-ranked-count aggregate.
#[derive(Clone)]
pub struct RankedStatsTracker<S, C> {
    stats_repo: Arc<S>,
    cache: Arc<C>,
}

impl<S, C> RankedStatsTracker<S, C> {
    /// Create a new tracker over the given repository and cache.
    pub fn new(stats_repo: Arc<S>, cache: Arc<C>) -> Self {
        Self { stats_repo, cache }
    }
}

impl<S, C> RankedStatsTracker<S, C>
where
    S: RankedStatsRepository,
    C: LeaderboardCache,
{
    fn map_stats_error(error: RankedStatsRepositoryError) -> Error {
        match error {
            RankedStatsRepositoryError::OwnerMissing { owner } => {
                Error::not_found(format!("user {owner} not found"))
            }
            RankedStatsRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("ranked-stats repository unavailable: {message}"))
            }
            RankedStatsRepositoryError::Query { message } => {
                Error::internal(format!("ranked-stats repository error: {message}"))
            }
        }
    }

    fn map_cache_error(error: LeaderboardCacheError) -> Error {
        match error {
            LeaderboardCacheError::Backend { message } => {
                Error::service_unavailable(format!("leaderboard cache unavailable: {message}"))
            }
        }
    }

    /// Bring the stored aggregate in line with the user's rankings.
    ///
    /// Loads ranking sizes only, takes their maximum (0 with no rankings),
    /// and, when the result differs from the stored value, invalidates the
    /// leaderboard listing key and persists the new value — in that order,
    /// so a half-completed recompute can leave the cache cold but never
    /// holding a stale maximum. Returns the effective aggregate.
    pub async fn recompute(&self, owner: UserId) -> Result<u32, Error> {
        let counts = self
            .stats_repo
            .pokemon_counts(owner)
            .await
            .map_err(Self::map_stats_error)?;
        let highest = counts.into_iter().max().unwrap_or(0);

        let stored = self
            .stats_repo
            .stored_highest(owner)
            .await
            .map_err(Self::map_stats_error)?;

        if stored == highest {
            return Ok(highest);
        }

        debug!(%owner, stored, highest, "highest ranked count changed");

        self.cache
            .del(LEADERBOARD_CACHE_KEY)
            .await
            .map_err(Self::map_cache_error)?;
        self.stats_repo
            .store_highest(owner, highest)
            .await
            .map_err(Self::map_stats_error)?;

        Ok(highest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockLeaderboardCache, MockRankedStatsRepository};
    use crate::domain::ErrorCode;

    fn make_tracker(
        stats: MockRankedStatsRepository,
        cache: MockLeaderboardCache,
    ) -> RankedStatsTracker<MockRankedStatsRepository, MockLeaderboardCache> {
        RankedStatsTracker::new(Arc::new(stats), Arc::new(cache))
    }

    #[tokio::test]
    async fn recompute_persists_and_invalidates_on_change() {
        let owner = UserId::random();
        let mut stats = MockRankedStatsRepository::new();
        stats
            .expect_pokemon_counts()
            .times(1)
            .return_once(|_| Ok(vec![1, 3, 2]));
        stats.expect_stored_highest().times(1).return_once(|_| Ok(1));
        stats
            .expect_store_highest()
            .withf(|_, value| *value == 3)
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut cache = MockLeaderboardCache::new();
        cache
            .expect_del()
            .withf(|key| key == LEADERBOARD_CACHE_KEY)
            .times(1)
            .return_once(|_| Ok(()));

        let tracker = make_tracker(stats, cache);
        let highest = tracker.recompute(owner).await.expect("recompute succeeds");
        assert_eq!(highest, 3);
    }

    #[tokio::test]
    async fn recompute_is_a_strict_noop_when_unchanged() {
        let owner = UserId::random();
        let mut stats = MockRankedStatsRepository::new();
        stats
            .expect_pokemon_counts()
            .times(1)
            .return_once(|_| Ok(vec![2, 5]));
        stats.expect_stored_highest().times(1).return_once(|_| Ok(5));
        stats.expect_store_highest().times(0);

        let mut cache = MockLeaderboardCache::new();
        cache.expect_del().times(0);

        let tracker = make_tracker(stats, cache);
        let highest = tracker.recompute(owner).await.expect("recompute succeeds");
        assert_eq!(highest, 5);
    }

    #[tokio::test]
    async fn recompute_defaults_to_zero_without_rankings() {
        let owner = UserId::random();
        let mut stats = MockRankedStatsRepository::new();
        stats
            .expect_pokemon_counts()
            .times(1)
            .return_once(|_| Ok(Vec::new()));
        stats.expect_stored_highest().times(1).return_once(|_| Ok(3));
        stats
            .expect_store_highest()
            .withf(|_, value| *value == 0)
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut cache = MockLeaderboardCache::new();
        cache.expect_del().times(1).return_once(|_| Ok(()));

        let tracker = make_tracker(stats, cache);
        let highest = tracker.recompute(owner).await.expect("recompute succeeds");
        assert_eq!(highest, 0);
    }

    #[tokio::test]
    async fn missing_owner_surfaces_as_not_found() {
        let owner = UserId::random();
        let mut stats = MockRankedStatsRepository::new();
        stats
            .expect_pokemon_counts()
            .times(1)
            .return_once(move |_| Err(RankedStatsRepositoryError::owner_missing(*owner.as_uuid())));

        let tracker = make_tracker(stats, MockLeaderboardCache::new());
        let error = tracker.recompute(owner).await.expect_err("owner missing");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn cache_failure_surfaces_as_service_unavailable() {
        let owner = UserId::random();
        let mut stats = MockRankedStatsRepository::new();
        stats
            .expect_pokemon_counts()
            .times(1)
            .return_once(|_| Ok(vec![4]));
        stats.expect_stored_highest().times(1).return_once(|_| Ok(0));
        stats.expect_store_highest().times(0);

        let mut cache = MockLeaderboardCache::new();
        cache
            .expect_del()
            .times(1)
            .return_once(|_| Err(LeaderboardCacheError::backend("redis down")));

        let tracker = make_tracker(stats, cache);
        let error = tracker.recompute(owner).await.expect_err("cache down");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
