//! Driving port for ranking mutations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ranking::{Ranking, RankingChanges, RankingTitle};
use crate::domain::user::UserId;
use crate::domain::zones::Zone;
use crate::domain::Error;

/// Input payload for creating a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRankingRequest {
    /// Owner of the new ranking.
    pub owner: UserId,
    /// Title, unique among the owner's rankings.
    pub title: RankingTitle,
    /// Initial ranked Pokémon, position = rank.
    pub pokemon: Vec<Uuid>,
    /// Initial zones; validated against the Pokémon count.
    pub zones: Vec<Zone>,
}

/// Input payload for a partial ranking update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRankingRequest {
    /// Ranking to change.
    pub id: Uuid,
    /// User asking for the change; must be the owner.
    pub requester: UserId,
    /// Fields to replace.
    pub changes: RankingChanges,
}

/// Input payload for deleting a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRankingRequest {
    /// Ranking to delete.
    pub id: Uuid,
    /// User asking for the deletion; must be the owner.
    pub requester: UserId,
}

/// Driving port covering every ranking mutation.
///
/// Implementations keep the derived `highest_ranked_count` aggregate in step
/// with the mutation before returning.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankingsCommand: Send + Sync {
    /// Create a ranking for its owner.
    async fn create_ranking(&self, request: CreateRankingRequest) -> Result<Ranking, Error>;

    /// Apply a partial update on behalf of the requester.
    async fn update_ranking(&self, request: UpdateRankingRequest) -> Result<Ranking, Error>;

    /// Delete a ranking on behalf of the requester.
    async fn delete_ranking(&self, request: DeleteRankingRequest) -> Result<(), Error>;
}

/// Fixture command implementation that accepts creates and rejects the rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRankingsCommand;

#[async_trait]
impl RankingsCommand for FixtureRankingsCommand {
    async fn create_ranking(&self, request: CreateRankingRequest) -> Result<Ranking, Error> {
        let now = chrono::Utc::now();
        Ok(Ranking {
            id: Uuid::new_v4(),
            owner: request.owner,
            title: request.title,
            pokemon: request.pokemon,
            zones: request.zones,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_ranking(&self, request: UpdateRankingRequest) -> Result<Ranking, Error> {
        Err(Error::not_found(format!("ranking {} not found", request.id)))
    }

    async fn delete_ranking(&self, request: DeleteRankingRequest) -> Result<(), Error> {
        Err(Error::not_found(format!("ranking {} not found", request.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[tokio::test]
    async fn fixture_create_echoes_the_request() {
        let command = FixtureRankingsCommand;
        let owner = UserId::random();
        let request = CreateRankingRequest {
            owner,
            title: RankingTitle::new("Johto legends").expect("valid title"),
            pokemon: Vec::new(),
            zones: Vec::new(),
        };

        let ranking = command
            .create_ranking(request)
            .await
            .expect("create succeeds");
        assert_eq!(ranking.owner, owner);
    }

    #[tokio::test]
    async fn fixture_delete_reports_not_found() {
        let command = FixtureRankingsCommand;
        let error = command
            .delete_ranking(DeleteRankingRequest {
                id: Uuid::new_v4(),
                requester: UserId::random(),
            })
            .await
            .expect_err("fixture has no rows");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
