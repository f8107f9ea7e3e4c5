//! Driving port for ranking reads.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ranking::Ranking;
use crate::domain::user::UserId;
use crate::domain::Error;

/// Driving port covering ranking reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankingsQuery: Send + Sync {
    /// Fetch a ranking by id; `NotFound` when missing.
    async fn get_ranking(&self, id: Uuid) -> Result<Ranking, Error>;

    /// List a user's rankings, newest first.
    async fn list_rankings(&self, owner: UserId) -> Result<Vec<Ranking>, Error>;
}

/// Fixture query implementation with no rankings at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRankingsQuery;

#[async_trait]
impl RankingsQuery for FixtureRankingsQuery {
    async fn get_ranking(&self, id: Uuid) -> Result<Ranking, Error> {
        Err(Error::not_found(format!("ranking {id} not found")))
    }

    async fn list_rankings(&self, _owner: UserId) -> Result<Vec<Ranking>, Error> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[tokio::test]
    async fn fixture_get_reports_not_found() {
        let query = FixtureRankingsQuery;
        let error = query
            .get_ranking(Uuid::new_v4())
            .await
            .expect_err("fixture has no rows");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn fixture_listing_is_empty() {
        let query = FixtureRankingsQuery;
        let rankings = query
            .list_rankings(UserId::random())
            .await
            .expect("list succeeds");
        assert!(rankings.is_empty());
    }
}
