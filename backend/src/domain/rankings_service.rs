//! Ranking domain services.
//!
//! Implements the driving ports for ranking mutations and reads. Zone
//! validation for creates happens here, where the whole effective state is
//! the request itself; updates re-validate inside the repository
//! transaction, where the current row is the other half of the effective
//! pair. Every mutation brings the ranked-stats aggregate in line before
//! returning.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::{
    CreateRankingRequest, DeleteRankingRequest, LeaderboardCache, RankedStatsRepository,
    RankingRepository, RankingRepositoryError, RankingsCommand, RankingsQuery,
    UpdateRankingRequest,
};
use crate::domain::ranked_stats::RankedStatsTracker;
use crate::domain::ranking::Ranking;
use crate::domain::user::UserId;
use crate::domain::zones::{validate_zones, ZoneValidationError};
use crate::domain::Error;

/// Structured details for a zone validation failure, rich enough for a
/// precise user-facing message.
pub(crate) fn zone_violation_details(violation: &ZoneValidationError) -> serde_json::Value {
    match violation {
        ZoneValidationError::InvalidColor { value } => json!({
            "code": "invalid_color",
            "value": value,
        }),
        ZoneValidationError::InvalidStart { zone_name } => json!({
            "code": "invalid_start",
            "zone": zone_name,
        }),
        ZoneValidationError::InvalidInterval {
            zone_name,
            start,
            end,
        } => json!({
            "code": "invalid_interval",
            "zone": zone_name,
            "start": start,
            "end": end,
        }),
        ZoneValidationError::ZoneExceedsCapacity {
            zone_name,
            end,
            total_positions,
        } => json!({
            "code": "zone_exceeds_capacity",
            "zone": zone_name,
            "end": end,
            "totalPositions": total_positions,
        }),
        ZoneValidationError::OverlappingZones {
            first,
            second,
            end,
            start,
        } => json!({
            "code": "overlapping_zones",
            "first": first,
            "second": second,
            "end": end,
            "start": start,
        }),
        ZoneValidationError::ZoneAfterUnbounded { zone_name } => json!({
            "code": "zone_after_unbounded",
            "zone": zone_name,
        }),
    }
}

/// Ranking service implementing the driving ports.
#[derive(Clone)]
pub struct RankingsService<R, S, C> {
    ranking_repo: Arc<R>,
    stats: RankedStatsTracker<S, C>,
}

impl<R, S, C> RankingsService<R, S, C> {
    /// Create a new service over the given repository and stats tracker.
    pub fn new(ranking_repo: Arc<R>, stats: RankedStatsTracker<S, C>) -> Self {
        Self {
            ranking_repo,
            stats,
        }
    }
}

impl<R, S, C> RankingsService<R, S, C>
where
    R: RankingRepository,
    S: RankedStatsRepository,
    C: LeaderboardCache,
{
    fn map_ranking_error(error: RankingRepositoryError) -> Error {
        match error {
            RankingRepositoryError::OwnerMissing { owner } => {
                Error::not_found(format!("user {owner} not found"))
            }
            RankingRepositoryError::NotFound { id } => {
                Error::not_found(format!("ranking {id} not found"))
            }
            RankingRepositoryError::NotOwner { .. } => {
                Error::forbidden("not authorised to modify this ranking")
            }
            RankingRepositoryError::DuplicateTitle { title } => {
                Error::conflict("ranking title already in use").with_details(json!({
                    "code": "duplicate_title",
                    "title": title,
                }))
            }
            RankingRepositoryError::ZonesRejected { violation } => {
                Error::invalid_request(violation.to_string())
                    .with_details(zone_violation_details(&violation))
            }
            RankingRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("ranking repository unavailable: {message}"))
            }
            RankingRepositoryError::Query { message } => {
                Error::internal(format!("ranking repository error: {message}"))
            }
        }
    }
}

#[async_trait]
impl<R, S, C> RankingsCommand for RankingsService<R, S, C>
where
    R: RankingRepository,
    S: RankedStatsRepository,
    C: LeaderboardCache,
{
    async fn create_ranking(&self, request: CreateRankingRequest) -> Result<Ranking, Error> {
        let total = u32::try_from(request.pokemon.len())
            .map_err(|_| Error::invalid_request("too many ranked Pokémon"))?;
        if let Err(violation) = validate_zones(&request.zones, total) {
            return Err(Error::invalid_request(violation.to_string())
                .with_details(zone_violation_details(&violation)));
        }

        let draft = crate::domain::ranking::NewRanking {
            owner: request.owner,
            title: request.title,
            pokemon: request.pokemon,
            zones: request.zones,
        };
        let ranking = self
            .ranking_repo
            .insert(&draft)
            .await
            .map_err(Self::map_ranking_error)?;

        self.stats.recompute(ranking.owner).await?;
        Ok(ranking)
    }

    async fn update_ranking(&self, request: UpdateRankingRequest) -> Result<Ranking, Error> {
        let affects_count = request.changes.affects_pokemon_count();
        let ranking = self
            .ranking_repo
            .update(request.id, request.requester, &request.changes)
            .await
            .map_err(Self::map_ranking_error)?;

        if affects_count {
            self.stats.recompute(ranking.owner).await?;
        }
        Ok(ranking)
    }

    async fn delete_ranking(&self, request: DeleteRankingRequest) -> Result<(), Error> {
        self.ranking_repo
            .delete(request.id, request.requester)
            .await
            .map_err(Self::map_ranking_error)?;

        // A successful delete proves the requester owned the ranking, and a
        // deletion can lower the maximum.
        self.stats.recompute(request.requester).await?;
        Ok(())
    }
}

#[async_trait]
impl<R, S, C> RankingsQuery for RankingsService<R, S, C>
where
    R: RankingRepository,
    S: RankedStatsRepository,
    C: LeaderboardCache,
{
    async fn get_ranking(&self, id: Uuid) -> Result<Ranking, Error> {
        self.ranking_repo
            .find(id)
            .await
            .map_err(Self::map_ranking_error)?
            .ok_or_else(|| Error::not_found(format!("ranking {id} not found")))
    }

    async fn list_rankings(&self, owner: UserId) -> Result<Vec<Ranking>, Error> {
        self.ranking_repo
            .list_for_owner(owner)
            .await
            .map_err(Self::map_ranking_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockLeaderboardCache, MockRankedStatsRepository, MockRankingRepository,
    };
    use crate::domain::ranking::{RankingChanges, RankingTitle};
    use crate::domain::zones::{Zone, ZoneColor};
    use crate::domain::ErrorCode;

    fn title(value: &str) -> RankingTitle {
        RankingTitle::new(value).expect("valid title")
    }

    fn zone(name: &str, start: u32, end: Option<u32>) -> Zone {
        Zone {
            name: name.to_owned(),
            start,
            end,
            color: ZoneColor::new("00ff00").expect("valid colour"),
        }
    }

    fn quiet_stats() -> RankedStatsTracker<MockRankedStatsRepository, MockLeaderboardCache> {
        let mut stats = MockRankedStatsRepository::new();
        stats.expect_pokemon_counts().returning(|_| Ok(Vec::new()));
        stats.expect_stored_highest().returning(|_| Ok(0));
        stats.expect_store_highest().returning(|_, _| Ok(()));
        let mut cache = MockLeaderboardCache::new();
        cache.expect_del().returning(|_| Ok(()));
        RankedStatsTracker::new(Arc::new(stats), Arc::new(cache))
    }

    fn sample_ranking(owner: UserId, pokemon: usize) -> Ranking {
        let now = chrono::Utc::now();
        Ranking {
            id: Uuid::new_v4(),
            owner,
            title: title("Kanto favourites"),
            pokemon: (0..pokemon).map(|_| Uuid::new_v4()).collect(),
            zones: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_rejects_out_of_bounds_zones_before_any_write() {
        let mut repo = MockRankingRepository::new();
        repo.expect_insert().times(0);
        let service = RankingsService::new(Arc::new(repo), quiet_stats());

        let error = service
            .create_ranking(CreateRankingRequest {
                owner: UserId::random(),
                title: title("Too ambitious"),
                pokemon: vec![Uuid::new_v4(), Uuid::new_v4()],
                zones: vec![zone("greedy", 1, Some(10))],
            })
            .await
            .expect_err("zone exceeds the list");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("details are attached");
        assert_eq!(details["code"], "zone_exceeds_capacity");
        assert_eq!(details["totalPositions"], 2);
    }

    #[tokio::test]
    async fn create_accepts_zones_matching_the_list() {
        let owner = UserId::random();
        let created = sample_ranking(owner, 2);
        let mut repo = MockRankingRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(move |_| Ok(created));
        let service = RankingsService::new(Arc::new(repo), quiet_stats());

        let ranking = service
            .create_ranking(CreateRankingRequest {
                owner,
                title: title("Just right"),
                pokemon: vec![Uuid::new_v4(), Uuid::new_v4()],
                zones: vec![zone("top", 1, Some(2))],
            })
            .await
            .expect("create succeeds");

        assert_eq!(ranking.owner, owner);
    }

    #[tokio::test]
    async fn create_recomputes_the_aggregate_before_returning() {
        let owner = UserId::random();
        let created = sample_ranking(owner, 3);
        let mut repo = MockRankingRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(move |_| Ok(created));

        let mut stats = MockRankedStatsRepository::new();
        stats
            .expect_pokemon_counts()
            .times(1)
            .return_once(|_| Ok(vec![3]));
        stats.expect_stored_highest().times(1).return_once(|_| Ok(0));
        stats
            .expect_store_highest()
            .withf(|_, value| *value == 3)
            .times(1)
            .return_once(|_, _| Ok(()));
        let mut cache = MockLeaderboardCache::new();
        cache.expect_del().times(1).return_once(|_| Ok(()));

        let service = RankingsService::new(
            Arc::new(repo),
            RankedStatsTracker::new(Arc::new(stats), Arc::new(cache)),
        );

        service
            .create_ranking(CreateRankingRequest {
                owner,
                title: title("Counts"),
                pokemon: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
                zones: Vec::new(),
            })
            .await
            .expect("create succeeds");
    }

    #[tokio::test]
    async fn duplicate_title_maps_to_conflict() {
        let mut repo = MockRankingRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(|_| Err(RankingRepositoryError::duplicate_title("Kanto favourites")));
        let service = RankingsService::new(Arc::new(repo), quiet_stats());

        let error = service
            .create_ranking(CreateRankingRequest {
                owner: UserId::random(),
                title: title("Kanto favourites"),
                pokemon: Vec::new(),
                zones: Vec::new(),
            })
            .await
            .expect_err("title is taken");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn update_by_a_stranger_maps_to_forbidden() {
        let id = Uuid::new_v4();
        let mut repo = MockRankingRepository::new();
        repo.expect_update()
            .times(1)
            .return_once(move |_, _, _| Err(RankingRepositoryError::not_owner(id)));
        let service = RankingsService::new(Arc::new(repo), quiet_stats());

        let error = service
            .update_ranking(UpdateRankingRequest {
                id,
                requester: UserId::random(),
                changes: RankingChanges {
                    title: Some(title("Renamed")),
                    ..RankingChanges::default()
                },
            })
            .await
            .expect_err("requester is not the owner");

        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn title_only_update_skips_the_recompute() {
        let owner = UserId::random();
        let updated = sample_ranking(owner, 1);
        let mut repo = MockRankingRepository::new();
        repo.expect_update()
            .times(1)
            .return_once(move |_, _, _| Ok(updated));

        let mut stats = MockRankedStatsRepository::new();
        stats.expect_pokemon_counts().times(0);
        let cache = MockLeaderboardCache::new();

        let service = RankingsService::new(
            Arc::new(repo),
            RankedStatsTracker::new(Arc::new(stats), Arc::new(cache)),
        );

        service
            .update_ranking(UpdateRankingRequest {
                id: Uuid::new_v4(),
                requester: owner,
                changes: RankingChanges {
                    title: Some(title("Renamed")),
                    ..RankingChanges::default()
                },
            })
            .await
            .expect("update succeeds");
    }

    #[tokio::test]
    async fn delete_recomputes_for_the_requester() {
        let owner = UserId::random();
        let mut repo = MockRankingRepository::new();
        repo.expect_delete().times(1).return_once(|_, _| Ok(()));

        let mut stats = MockRankedStatsRepository::new();
        let expected_owner = owner;
        stats
            .expect_pokemon_counts()
            .withf(move |candidate| *candidate == expected_owner)
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

        let service = RankingsService::new(
            Arc::new(repo),
            RankedStatsTracker::new(Arc::new(stats), Arc::new(cache)),
        );

        service
            .delete_ranking(DeleteRankingRequest {
                id: Uuid::new_v4(),
                requester: owner,
            })
            .await
            .expect("delete succeeds");
    }

    #[tokio::test]
    async fn get_ranking_misses_map_to_not_found() {
        let mut repo = MockRankingRepository::new();
        repo.expect_find().times(1).return_once(|_| Ok(None));
        let service = RankingsService::new(Arc::new(repo), quiet_stats());

        let error = service
            .get_ranking(Uuid::new_v4())
            .await
            .expect_err("nothing stored");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
