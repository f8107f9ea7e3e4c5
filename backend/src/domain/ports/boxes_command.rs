//! Driving port for box mutations, including the favorite copy.

use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::boxes::{BoxChanges, BoxName, PokemonBox};
use crate::domain::user::UserId;
use crate::domain::Error;

/// Input payload for creating a box.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateBoxRequest {
    /// Owner of the new box.
    pub owner: UserId,
    /// Name, unique among the owner's boxes.
    pub name: BoxName,
    /// Whether other users may see and favorite the box.
    pub is_public: bool,
    /// Initial Pokémon membership.
    pub pokemon: BTreeSet<Uuid>,
}

/// Input payload for a partial box update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBoxRequest {
    /// Box to change.
    pub id: Uuid,
    /// User asking for the change; must be the owner.
    pub requester: UserId,
    /// Fields to replace.
    pub changes: BoxChanges,
}

/// Input payload for deleting a box.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBoxRequest {
    /// Box to delete.
    pub id: Uuid,
    /// User asking for the deletion; must be the owner.
    pub requester: UserId,
}

/// Input payload for favoriting a public box.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteBoxRequest {
    /// Public box to copy.
    pub source_id: Uuid,
    /// User receiving the copy; must not own the source.
    pub requester: UserId,
}

/// Result of a favorite: the requester's new private copy and the source's
/// counter after the increment.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteBoxResponse {
    /// The freshly created private copy.
    pub copy: PokemonBox,
    /// The source's favorite count after this favorite.
    pub source_favorite_count: u64,
}

/// Driving port covering every box mutation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoxesCommand: Send + Sync {
    /// Create a box for its owner.
    async fn create_box(&self, request: CreateBoxRequest) -> Result<PokemonBox, Error>;

    /// Apply a partial update on behalf of the requester.
    async fn update_box(&self, request: UpdateBoxRequest) -> Result<PokemonBox, Error>;

    /// Delete a box on behalf of the requester.
    async fn delete_box(&self, request: DeleteBoxRequest) -> Result<(), Error>;

    /// Copy a public box into the requester's collection.
    async fn favorite_box(&self, request: FavoriteBoxRequest)
        -> Result<FavoriteBoxResponse, Error>;
}

/// Fixture command implementation that accepts creates and rejects the rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBoxesCommand;

#[async_trait]
impl BoxesCommand for FixtureBoxesCommand {
    async fn create_box(&self, request: CreateBoxRequest) -> Result<PokemonBox, Error> {
        let now = chrono::Utc::now();
        Ok(PokemonBox {
            id: Uuid::new_v4(),
            owner: request.owner,
            name: request.name,
            is_public: request.is_public,
            pokemon: request.pokemon,
            favorite_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_box(&self, request: UpdateBoxRequest) -> Result<PokemonBox, Error> {
        Err(Error::not_found(format!("box {} not found", request.id)))
    }

    async fn delete_box(&self, request: DeleteBoxRequest) -> Result<(), Error> {
        Err(Error::not_found(format!("box {} not found", request.id)))
    }

    async fn favorite_box(
        &self,
        request: FavoriteBoxRequest,
    ) -> Result<FavoriteBoxResponse, Error> {
        Err(Error::not_found(format!(
            "box {} not found",
            request.source_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[tokio::test]
    async fn fixture_create_echoes_the_request() {
        let command = FixtureBoxesCommand;
        let owner = UserId::random();
        let created = command
            .create_box(CreateBoxRequest {
                owner,
                name: BoxName::new("Water").expect("valid name"),
                is_public: true,
                pokemon: BTreeSet::new(),
            })
            .await
            .expect("create succeeds");

        assert_eq!(created.owner, owner);
        assert_eq!(created.favorite_count, 0);
    }

    #[tokio::test]
    async fn fixture_favorite_reports_not_found() {
        let command = FixtureBoxesCommand;
        let error = command
            .favorite_box(FavoriteBoxRequest {
                source_id: Uuid::new_v4(),
                requester: UserId::random(),
            })
            .await
            .expect_err("fixture has no rows");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
