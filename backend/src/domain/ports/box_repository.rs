//! Port for transactional box persistence, including the favorite copy.
//!
//! Each mutating method is one database transaction pairing the entity write
//! with the owner's reference-array write. Name uniqueness is asserted
//! inside the transaction; the per-owner unique index decides at commit, so
//! a concurrent creator racing the same name surfaces as
//! [`BoxRepositoryError::DuplicateName`] and the caller may retry.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::boxes::{BoxChanges, NewBox, PokemonBox};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by box repository adapters.
    pub enum BoxRepositoryError {
        /// The owning user does not exist.
        OwnerMissing { owner: Uuid } =>
            "box owner not found: {owner}",
        /// The box does not exist.
        NotFound { id: Uuid } =>
            "box not found: {id}",
        /// The requester does not own the box.
        NotOwner { id: Uuid } =>
            "box {id} is not owned by the requester",
        /// The owner already has a box with this name.
        DuplicateName { name: String } =>
            "box name already in use: {name}",
        /// The favorite source does not exist or is not public.
        SourceUnavailable { id: Uuid } =>
            "box {id} does not exist or is not public",
        /// The requester tried to favorite their own box.
        SelfFavorite { id: Uuid } =>
            "box {id} already belongs to the requester",
        /// Every copy-name candidate for the favorite was taken.
        CopyNameExhausted { base: String } =>
            "no free copy name derived from {base}",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "box repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "box repository query failed: {message}",
    }
}

/// Result of a favorite copy: the private copy owned by the requester and
/// the source's counter after the atomic increment.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteOutcome {
    /// The freshly created private copy.
    pub copy: PokemonBox,
    /// The source's favorite count after this favorite.
    pub source_favorite_count: u64,
}

/// Port for box storage and retrieval.
///
/// # Transaction Semantics
///
/// `favorite` performs all of its effects in one transaction: load the
/// source, reject missing-or-private sources and self-favorites, probe the
/// requester's box names for a free copy name, insert the private copy with
/// a zero counter, append the new id to the requester's reference array, and
/// bump the source's counter via an atomic SQL increment (never
/// read-modify-write, so concurrent favoriters cannot lose updates).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoxRepository: Send + Sync {
    /// Create a box and link it to its owner.
    async fn insert(&self, new_box: &NewBox) -> Result<PokemonBox, BoxRepositoryError>;

    /// Apply a partial update on behalf of `requester`.
    async fn update(
        &self,
        id: Uuid,
        requester: UserId,
        changes: &BoxChanges,
    ) -> Result<PokemonBox, BoxRepositoryError>;

    /// Delete a box on behalf of `requester` and unlink it.
    async fn delete(&self, id: Uuid, requester: UserId) -> Result<(), BoxRepositoryError>;

    /// Copy a public box into the requester's collection.
    async fn favorite(
        &self,
        source_id: Uuid,
        requester: UserId,
    ) -> Result<FavoriteOutcome, BoxRepositoryError>;

    /// Fetch a box by id.
    async fn find(&self, id: Uuid) -> Result<Option<PokemonBox>, BoxRepositoryError>;

    /// List a user's boxes, newest first.
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<PokemonBox>, BoxRepositoryError>;
}

/// Fixture implementation for testing without a real database.
///
/// Lookups miss, listings are empty, and mutations against existing rows
/// report [`BoxRepositoryError::NotFound`]. Use it where box behaviour is
/// not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBoxRepository;

#[async_trait]
impl BoxRepository for FixtureBoxRepository {
    async fn insert(&self, new_box: &NewBox) -> Result<PokemonBox, BoxRepositoryError> {
        let now = chrono::Utc::now();
        Ok(PokemonBox {
            id: Uuid::new_v4(),
            owner: new_box.owner,
            name: new_box.name.clone(),
            is_public: new_box.is_public,
            pokemon: new_box.pokemon.clone(),
            favorite_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        id: Uuid,
        _requester: UserId,
        _changes: &BoxChanges,
    ) -> Result<PokemonBox, BoxRepositoryError> {
        Err(BoxRepositoryError::not_found(id))
    }

    async fn delete(&self, id: Uuid, _requester: UserId) -> Result<(), BoxRepositoryError> {
        Err(BoxRepositoryError::not_found(id))
    }

    async fn favorite(
        &self,
        source_id: Uuid,
        _requester: UserId,
    ) -> Result<FavoriteOutcome, BoxRepositoryError> {
        Err(BoxRepositoryError::source_unavailable(source_id))
    }

    async fn find(&self, _id: Uuid) -> Result<Option<PokemonBox>, BoxRepositoryError> {
        Ok(None)
    }

    async fn list_for_owner(
        &self,
        _owner: UserId,
    ) -> Result<Vec<PokemonBox>, BoxRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::boxes::BoxName;

    #[tokio::test]
    async fn fixture_insert_starts_the_counter_at_zero() {
        let repo = FixtureBoxRepository;
        let draft = NewBox {
            owner: UserId::random(),
            name: BoxName::new("Water").expect("valid name"),
            is_public: true,
            pokemon: BTreeSet::new(),
        };

        let created = repo.insert(&draft).await.expect("insert succeeds");

        assert_eq!(created.favorite_count, 0);
        assert!(created.is_public);
    }

    #[tokio::test]
    async fn fixture_favorite_reports_the_source_unavailable() {
        let repo = FixtureBoxRepository;
        let id = Uuid::new_v4();

        let error = repo
            .favorite(id, UserId::random())
            .await
            .expect_err("fixture has no rows");

        assert_eq!(error, BoxRepositoryError::source_unavailable(id));
    }

    #[test]
    fn duplicate_name_error_names_the_name() {
        let error = BoxRepositoryError::duplicate_name("Water (2)");
        assert!(error.to_string().contains("Water (2)"));
    }
}
