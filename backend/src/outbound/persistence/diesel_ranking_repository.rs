//! PostgreSQL-backed `RankingRepository` implementation using Diesel ORM.
//!
//! Every mutation runs as one transaction: precondition probes (owner row,
//! title uniqueness, zone validation on the effective state), the ranking
//! write, and the paired push/pull on the owner's `ranking_ids` array either
//! all commit or all roll back. The `(owner_id, title)` unique index backs
//! the probe at commit time; a violation from a concurrent writer is mapped
//! back to [`RankingRepositoryError::DuplicateTitle`].

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{RankingRepository, RankingRepositoryError};
use crate::domain::ranking::{NewRanking, Ranking, RankingChanges, RankingTitle};
use crate::domain::user::UserId;
use crate::domain::zones::{validate_zones, Zone};

use super::diesel_helpers::{
    array_append, array_remove, map_basic_diesel_error, map_basic_pool_error,
    unique_violation_constraint, TxError,
};
use super::models::{NewRankingRow, RankingRow, RankingUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{rankings, users};

/// Diesel-backed implementation of the `RankingRepository` port.
#[derive(Clone)]
pub struct DieselRankingRepository {
    pool: DbPool,
}

impl DieselRankingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to ranking repository errors.
fn map_pool_error(error: PoolError) -> RankingRepositoryError {
    map_basic_pool_error(error, |message| {
        RankingRepositoryError::connection(message)
    })
}

/// Map Diesel errors to ranking repository errors.
fn map_diesel_error(error: diesel::result::Error) -> RankingRepositoryError {
    map_basic_diesel_error(
        error,
        |message| RankingRepositoryError::query(message),
        |message| RankingRepositoryError::connection(message),
    )
}

/// Map Diesel errors on a titled write, catching the unique-index backstop.
fn map_write_error(error: diesel::result::Error, title: &str) -> RankingRepositoryError {
    if let Some(constraint) = unique_violation_constraint(&error) {
        debug!(constraint, "unique violation on ranking write");
        return RankingRepositoryError::duplicate_title(title);
    }
    map_diesel_error(error)
}

/// Convert a database row to a domain ranking.
fn row_to_ranking(row: RankingRow) -> Result<Ranking, RankingRepositoryError> {
    let title = RankingTitle::new(row.title)
        .map_err(|err| RankingRepositoryError::query(format!("stored title rejected: {err}")))?;
    let zones: Vec<Zone> = serde_json::from_value(row.zones)
        .map_err(|err| RankingRepositoryError::query(format!("stored zones rejected: {err}")))?;

    Ok(Ranking {
        id: row.id,
        owner: UserId::from_uuid(row.owner_id),
        title,
        pokemon: row.pokemon_ids,
        zones,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Effective Pokémon count as validated against the zones.
fn effective_total(len: usize) -> Result<u32, TxError<RankingRepositoryError>> {
    u32::try_from(len).map_err(|_| {
        TxError::Domain(RankingRepositoryError::query(
            "ranking exceeds the representable position range",
        ))
    })
}

#[async_trait]
impl RankingRepository for DieselRankingRepository {
    async fn insert(&self, ranking: &NewRanking) -> Result<Ranking, RankingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id = Uuid::new_v4();
        let owner = *ranking.owner.as_uuid();
        let title = ranking.title.as_ref();
        let now = Utc::now();
        let zones_json = serde_json::to_value(&ranking.zones).map_err(|err| {
            RankingRepositoryError::query(format!("failed to serialize zones: {err}"))
        })?;

        let result: Result<(), TxError<RankingRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let owner_exists: bool = diesel::select(diesel::dsl::exists(
                        users::table.filter(users::id.eq(owner)),
                    ))
                    .get_result(conn)
                    .await?;
                    if !owner_exists {
                        return Err(TxError::Domain(RankingRepositoryError::owner_missing(
                            owner,
                        )));
                    }

                    let duplicate: bool = diesel::select(diesel::dsl::exists(
                        rankings::table
                            .filter(rankings::owner_id.eq(owner))
                            .filter(rankings::title.eq(title)),
                    ))
                    .get_result(conn)
                    .await?;
                    if duplicate {
                        return Err(TxError::Domain(RankingRepositoryError::duplicate_title(
                            title,
                        )));
                    }

                    let row = NewRankingRow {
                        id,
                        owner_id: owner,
                        title,
                        pokemon_ids: &ranking.pokemon,
                        zones: zones_json,
                        created_at: now,
                        updated_at: now,
                    };
                    diesel::insert_into(rankings::table)
                        .values(&row)
                        .execute(conn)
                        .await?;

                    diesel::update(users::table.filter(users::id.eq(owner)))
                        .set(users::ranking_ids.eq(array_append(users::ranking_ids, id)))
                        .execute(conn)
                        .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(()) => Ok(Ranking {
                id,
                owner: ranking.owner,
                title: ranking.title.clone(),
                pokemon: ranking.pokemon.clone(),
                zones: ranking.zones.clone(),
                created_at: now,
                updated_at: now,
            }),
            Err(error) => Err(error.unwrap_or_map(|db| map_write_error(db, title))),
        }
    }

    async fn update(
        &self,
        id: Uuid,
        requester: UserId,
        changes: &RankingChanges,
    ) -> Result<Ranking, RankingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let requester_id = *requester.as_uuid();
        let now = Utc::now();

        let result: Result<Ranking, TxError<RankingRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let row: Option<RankingRow> = rankings::table
                        .find(id)
                        .select(RankingRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Err(TxError::Domain(RankingRepositoryError::not_found(id)));
                    };
                    if row.owner_id != requester_id {
                        return Err(TxError::Domain(RankingRepositoryError::not_owner(id)));
                    }

                    if let Some(new_title) = changes.title.as_ref() {
                        // Renaming to one's own current title is a no-op,
                        // not a conflict.
                        if new_title.as_ref() != row.title {
                            let duplicate: bool = diesel::select(diesel::dsl::exists(
                                rankings::table
                                    .filter(rankings::owner_id.eq(row.owner_id))
                                    .filter(rankings::title.eq(new_title.as_ref()))
                                    .filter(rankings::id.ne(id)),
                            ))
                            .get_result(conn)
                            .await?;
                            if duplicate {
                                return Err(TxError::Domain(
                                    RankingRepositoryError::duplicate_title(new_title.as_ref()),
                                ));
                            }
                        }
                    }

                    let stored_zones: Vec<Zone> =
                        serde_json::from_value(row.zones.clone()).map_err(|err| {
                            TxError::Domain(RankingRepositoryError::query(format!(
                                "stored zones rejected: {err}"
                            )))
                        })?;
                    let effective_pokemon: &[Uuid] =
                        changes.pokemon.as_deref().unwrap_or(&row.pokemon_ids);
                    let effective_zones: &[Zone] =
                        changes.zones.as_deref().unwrap_or(&stored_zones);

                    let total = effective_total(effective_pokemon.len())?;
                    if let Err(violation) = validate_zones(effective_zones, total) {
                        return Err(TxError::Domain(RankingRepositoryError::zones_rejected(
                            violation,
                        )));
                    }

                    let zones_json = changes
                        .zones
                        .as_ref()
                        .map(serde_json::to_value)
                        .transpose()
                        .map_err(|err| {
                            TxError::Domain(RankingRepositoryError::query(format!(
                                "failed to serialize zones: {err}"
                            )))
                        })?;
                    let update = RankingUpdate {
                        title: changes.title.as_ref().map(AsRef::as_ref),
                        pokemon_ids: changes.pokemon.as_deref(),
                        zones: zones_json,
                        updated_at: now,
                    };
                    diesel::update(rankings::table.find(id))
                        .set(&update)
                        .execute(conn)
                        .await?;

                    let title = match changes.title.clone() {
                        Some(title) => title,
                        None => RankingTitle::new(row.title).map_err(|err| {
                            TxError::Domain(RankingRepositoryError::query(format!(
                                "stored title rejected: {err}"
                            )))
                        })?,
                    };

                    Ok(Ranking {
                        id,
                        owner: UserId::from_uuid(row.owner_id),
                        title,
                        pokemon: effective_pokemon.to_vec(),
                        zones: effective_zones.to_vec(),
                        created_at: row.created_at,
                        updated_at: now,
                    })
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| {
            let fallback = changes
                .title
                .as_ref()
                .map_or("ranking title", AsRef::as_ref);
            error.unwrap_or_map(|db| map_write_error(db, fallback))
        })
    }

    async fn delete(&self, id: Uuid, requester: UserId) -> Result<(), RankingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let requester_id = *requester.as_uuid();

        let result: Result<(), TxError<RankingRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let owner: Option<Uuid> = rankings::table
                        .find(id)
                        .select(rankings::owner_id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(owner) = owner else {
                        return Err(TxError::Domain(RankingRepositoryError::not_found(id)));
                    };
                    if owner != requester_id {
                        return Err(TxError::Domain(RankingRepositoryError::not_owner(id)));
                    }

                    diesel::delete(rankings::table.find(id)).execute(conn).await?;

                    diesel::update(users::table.filter(users::id.eq(owner)))
                        .set(users::ranking_ids.eq(array_remove(users::ranking_ids, id)))
                        .execute(conn)
                        .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| error.unwrap_or_map(map_diesel_error))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Ranking>, RankingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<RankingRow> = rankings::table
            .find(id)
            .select(RankingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_ranking).transpose()
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Ranking>, RankingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<RankingRow> = rankings::table
            .filter(rankings::owner_id.eq(owner.as_uuid()))
            .order(rankings::created_at.desc())
            .select(RankingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_ranking).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module's error and row mapping.
    use super::*;
    use crate::domain::zones::ZoneColor;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(
            repo_err,
            RankingRepositoryError::Connection { .. }
        ));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_title() {
        let db_error = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );

        let repo_err = map_write_error(db_error, "Kanto favourites");

        assert_eq!(
            repo_err,
            RankingRepositoryError::duplicate_title("Kanto favourites")
        );
    }

    #[rstest]
    fn other_database_errors_stay_query_errors() {
        let repo_err = map_write_error(diesel::result::Error::NotFound, "Kanto favourites");
        assert!(matches!(repo_err, RankingRepositoryError::Query { .. }));
    }

    #[rstest]
    fn row_to_ranking_restores_zones() {
        let zones = vec![Zone {
            name: "top".to_owned(),
            start: 1,
            end: Some(2),
            color: ZoneColor::new("ff0000").expect("valid colour"),
        }];
        let now = Utc::now();
        let row = RankingRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Kanto favourites".to_owned(),
            pokemon_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            zones: serde_json::to_value(&zones).expect("zones serialize"),
            created_at: now,
            updated_at: now,
        };

        let ranking = row_to_ranking(row).expect("row converts");

        assert_eq!(ranking.zones, zones);
        assert_eq!(ranking.pokemon.len(), 2);
    }

    #[rstest]
    fn row_to_ranking_rejects_corrupt_zones() {
        let now = Utc::now();
        let row = RankingRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Kanto favourites".to_owned(),
            pokemon_ids: Vec::new(),
            zones: serde_json::json!({ "not": "zones" }),
            created_at: now,
            updated_at: now,
        };

        let error = row_to_ranking(row).expect_err("corrupt zones are refused");
        assert!(matches!(error, RankingRepositoryError::Query { .. }));
    }
}
