//! Port for transactional ranking persistence.
//!
//! Each mutating method is one database transaction. Adapters must perform
//! the entity write and the paired user-array write atomically, assert title
//! uniqueness inside the same transaction (with the per-owner unique index
//! as the commit-time backstop), and validate effective zones in-transaction
//! on update, where the current row is the other half of the effective pair.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ranking::{NewRanking, Ranking, RankingChanges};
use crate::domain::user::UserId;
use crate::domain::zones::ZoneValidationError;

use super::define_port_error;

define_port_error! {
    /// Errors raised by ranking repository adapters.
    pub enum RankingRepositoryError {
        /// The owning user does not exist.
        OwnerMissing { owner: Uuid } =>
            "ranking owner not found: {owner}",
        /// The ranking does not exist.
        NotFound { id: Uuid } =>
            "ranking not found: {id}",
        /// The requester does not own the ranking.
        NotOwner { id: Uuid } =>
            "ranking {id} is not owned by the requester",
        /// The owner already has a ranking with this title.
        DuplicateTitle { title: String } =>
            "ranking title already in use: {title}",
        /// The effective zones failed validation against the effective list.
        ZonesRejected { violation: ZoneValidationError } =>
            "{violation}",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ranking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ranking repository query failed: {message}",
    }
}

/// Port for ranking storage and retrieval.
///
/// # Transaction Semantics
///
/// - `insert` checks the owner row, asserts title uniqueness, writes the
///   ranking, and appends its id to the owner's reference array — all in one
///   transaction.
/// - `update` loads the row in-transaction, enforces ownership, asserts
///   title uniqueness excluding the ranking itself (renaming to one's own
///   current title succeeds), validates the effective zones against the
///   effective Pokémon count, and applies the change set.
/// - `delete` enforces ownership and pulls the id from the owner's array in
///   the same transaction.
///
/// A failed precondition aborts the transaction before any write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankingRepository: Send + Sync {
    /// Create a ranking and link it to its owner.
    async fn insert(&self, ranking: &NewRanking) -> Result<Ranking, RankingRepositoryError>;

    /// Apply a partial update on behalf of `requester`.
    async fn update(
        &self,
        id: Uuid,
        requester: UserId,
        changes: &RankingChanges,
    ) -> Result<Ranking, RankingRepositoryError>;

    /// Delete a ranking on behalf of `requester` and unlink it.
    async fn delete(&self, id: Uuid, requester: UserId) -> Result<(), RankingRepositoryError>;

    /// Fetch a ranking by id.
    async fn find(&self, id: Uuid) -> Result<Option<Ranking>, RankingRepositoryError>;

    /// List a user's rankings, newest first.
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Ranking>, RankingRepositoryError>;
}

/// Fixture implementation for testing without a real database.
///
/// Lookups miss, listings are empty, and mutations against existing rows
/// report [`RankingRepositoryError::NotFound`]. Use it where ranking
/// behaviour is not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRankingRepository;

#[async_trait]
impl RankingRepository for FixtureRankingRepository {
    async fn insert(&self, ranking: &NewRanking) -> Result<Ranking, RankingRepositoryError> {
        let now = chrono::Utc::now();
        Ok(Ranking {
            id: Uuid::new_v4(),
            owner: ranking.owner,
            title: ranking.title.clone(),
            pokemon: ranking.pokemon.clone(),
            zones: ranking.zones.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        id: Uuid,
        _requester: UserId,
        _changes: &RankingChanges,
    ) -> Result<Ranking, RankingRepositoryError> {
        Err(RankingRepositoryError::not_found(id))
    }

    async fn delete(&self, id: Uuid, _requester: UserId) -> Result<(), RankingRepositoryError> {
        Err(RankingRepositoryError::not_found(id))
    }

    async fn find(&self, _id: Uuid) -> Result<Option<Ranking>, RankingRepositoryError> {
        Ok(None)
    }

    async fn list_for_owner(
        &self,
        _owner: UserId,
    ) -> Result<Vec<Ranking>, RankingRepositoryError> {
        Ok(Vec::new())
    }
}
