//! Port for the derived highest-ranked-count statistic.
//!
//! The tracker needs ranking sizes, not rankings: adapters fetch position
//! counts only (SQL `array_length`, not the arrays themselves) so a user
//! with large rankings costs the same as one with empty ones.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by ranked-stats repository adapters.
    pub enum RankedStatsRepositoryError {
        /// The user does not exist.
        OwnerMissing { owner: Uuid } =>
            "user not found: {owner}",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ranked-stats repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ranked-stats repository query failed: {message}",
    }
}

/// Port for reading ranking sizes and persisting the cached aggregate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankedStatsRepository: Send + Sync {
    /// Pokémon counts of the user's rankings, one entry per ranking.
    async fn pokemon_counts(&self, owner: UserId)
        -> Result<Vec<u32>, RankedStatsRepositoryError>;

    /// The currently stored `highest_ranked_count` for the user.
    async fn stored_highest(&self, owner: UserId) -> Result<u32, RankedStatsRepositoryError>;

    /// Persist a new `highest_ranked_count` for the user.
    async fn store_highest(
        &self,
        owner: UserId,
        value: u32,
    ) -> Result<(), RankedStatsRepositoryError>;
}

/// Fixture implementation for testing without a real database.
///
/// Reports no rankings and a zero stored aggregate; writes are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRankedStatsRepository;

#[async_trait]
impl RankedStatsRepository for FixtureRankedStatsRepository {
    async fn pokemon_counts(
        &self,
        _owner: UserId,
    ) -> Result<Vec<u32>, RankedStatsRepositoryError> {
        Ok(Vec::new())
    }

    async fn stored_highest(&self, _owner: UserId) -> Result<u32, RankedStatsRepositoryError> {
        Ok(0)
    }

    async fn store_highest(
        &self,
        _owner: UserId,
        _value: u32,
    ) -> Result<(), RankedStatsRepositoryError> {
        Ok(())
    }
}
