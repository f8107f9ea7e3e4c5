//! PostgreSQL-backed `BoxRepository` implementation using Diesel ORM.
//!
//! Mirrors the ranking adapter: every mutation pairs the box write with the
//! owner's `box_ids` array inside one transaction, with the
//! `(owner_id, name)` unique index as the commit-time uniqueness backstop.
//! The favorite operation additionally bumps the source's counter with an
//! atomic SQL increment so concurrent favoriters cannot lose updates.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::boxes::{BoxChanges, BoxName, NewBox, PokemonBox};
use crate::domain::naming::resolve_copy_name;
use crate::domain::ports::{BoxRepository, BoxRepositoryError, FavoriteOutcome};
use crate::domain::user::UserId;

use super::diesel_helpers::{
    array_append, array_remove, map_basic_diesel_error, map_basic_pool_error,
    unique_violation_constraint, TxError,
};
use super::models::{BoxRow, BoxUpdate, NewBoxRow};
use super::pool::{DbPool, PoolError};
use super::schema::{boxes, users};

/// Diesel-backed implementation of the `BoxRepository` port.
#[derive(Clone)]
pub struct DieselBoxRepository {
    pool: DbPool,
}

impl DieselBoxRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to box repository errors.
fn map_pool_error(error: PoolError) -> BoxRepositoryError {
    map_basic_pool_error(error, |message| BoxRepositoryError::connection(message))
}

/// Map Diesel errors to box repository errors.
fn map_diesel_error(error: diesel::result::Error) -> BoxRepositoryError {
    map_basic_diesel_error(
        error,
        |message| BoxRepositoryError::query(message),
        |message| BoxRepositoryError::connection(message),
    )
}

/// Map Diesel errors on a named write, catching the unique-index backstop.
fn map_write_error(error: diesel::result::Error, name: &str) -> BoxRepositoryError {
    if let Some(constraint) = unique_violation_constraint(&error) {
        debug!(constraint, "unique violation on box write");
        return BoxRepositoryError::duplicate_name(name);
    }
    map_diesel_error(error)
}

/// Convert a database row to a domain box.
fn row_to_box(row: BoxRow) -> Result<PokemonBox, BoxRepositoryError> {
    let name = BoxName::new(row.name)
        .map_err(|err| BoxRepositoryError::query(format!("stored name rejected: {err}")))?;
    let favorite_count = u64::try_from(row.favorite_count)
        .map_err(|_| BoxRepositoryError::query("negative favorite count"))?;

    Ok(PokemonBox {
        id: row.id,
        owner: UserId::from_uuid(row.owner_id),
        name,
        is_public: row.is_public,
        pokemon: row.pokemon_ids.into_iter().collect(),
        favorite_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl BoxRepository for DieselBoxRepository {
    async fn insert(&self, new_box: &NewBox) -> Result<PokemonBox, BoxRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id = Uuid::new_v4();
        let owner = *new_box.owner.as_uuid();
        let name = new_box.name.as_ref();
        let pokemon: Vec<Uuid> = new_box.pokemon.iter().copied().collect();
        let now = Utc::now();

        let result: Result<(), TxError<BoxRepositoryError>> = conn
            .transaction(|conn| {
                let pokemon = pokemon.clone();
                async move {
                    let owner_exists: bool = diesel::select(diesel::dsl::exists(
                        users::table.filter(users::id.eq(owner)),
                    ))
                    .get_result(conn)
                    .await?;
                    if !owner_exists {
                        return Err(TxError::Domain(BoxRepositoryError::owner_missing(owner)));
                    }

                    let duplicate: bool = diesel::select(diesel::dsl::exists(
                        boxes::table
                            .filter(boxes::owner_id.eq(owner))
                            .filter(boxes::name.eq(name)),
                    ))
                    .get_result(conn)
                    .await?;
                    if duplicate {
                        return Err(TxError::Domain(BoxRepositoryError::duplicate_name(name)));
                    }

                    let row = NewBoxRow {
                        id,
                        owner_id: owner,
                        name,
                        is_public: new_box.is_public,
                        pokemon_ids: pokemon,
                        favorite_count: 0,
                        created_at: now,
                        updated_at: now,
                    };
                    diesel::insert_into(boxes::table)
                        .values(&row)
                        .execute(conn)
                        .await?;

                    diesel::update(users::table.filter(users::id.eq(owner)))
                        .set(users::box_ids.eq(array_append(users::box_ids, id)))
                        .execute(conn)
                        .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(()) => Ok(PokemonBox {
                id,
                owner: new_box.owner,
                name: new_box.name.clone(),
                is_public: new_box.is_public,
                pokemon: new_box.pokemon.clone(),
                favorite_count: 0,
                created_at: now,
                updated_at: now,
            }),
            Err(error) => Err(error.unwrap_or_map(|db| map_write_error(db, name))),
        }
    }

    async fn update(
        &self,
        id: Uuid,
        requester: UserId,
        changes: &BoxChanges,
    ) -> Result<PokemonBox, BoxRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let requester_id = *requester.as_uuid();
        let now = Utc::now();
        let pokemon_patch: Option<Vec<Uuid>> = changes
            .pokemon
            .as_ref()
            .map(|set| set.iter().copied().collect());

        let result: Result<PokemonBox, TxError<BoxRepositoryError>> = conn
            .transaction(|conn| {
                let pokemon_patch = pokemon_patch.clone();
                async move {
                    let row: Option<BoxRow> = boxes::table
                        .find(id)
                        .select(BoxRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Err(TxError::Domain(BoxRepositoryError::not_found(id)));
                    };
                    if row.owner_id != requester_id {
                        return Err(TxError::Domain(BoxRepositoryError::not_owner(id)));
                    }

                    if let Some(new_name) = changes.name.as_ref() {
                        // Renaming to one's own current name succeeds.
                        if new_name.as_ref() != row.name {
                            let duplicate: bool = diesel::select(diesel::dsl::exists(
                                boxes::table
                                    .filter(boxes::owner_id.eq(row.owner_id))
                                    .filter(boxes::name.eq(new_name.as_ref()))
                                    .filter(boxes::id.ne(id)),
                            ))
                            .get_result(conn)
                            .await?;
                            if duplicate {
                                return Err(TxError::Domain(
                                    BoxRepositoryError::duplicate_name(new_name.as_ref()),
                                ));
                            }
                        }
                    }

                    let update = BoxUpdate {
                        name: changes.name.as_ref().map(AsRef::as_ref),
                        is_public: changes.is_public,
                        pokemon_ids: pokemon_patch.clone(),
                        updated_at: now,
                    };
                    diesel::update(boxes::table.find(id))
                        .set(&update)
                        .execute(conn)
                        .await?;

                    let name = match changes.name.clone() {
                        Some(name) => name,
                        None => BoxName::new(row.name).map_err(|err| {
                            TxError::Domain(BoxRepositoryError::query(format!(
                                "stored name rejected: {err}"
                            )))
                        })?,
                    };
                    let favorite_count = u64::try_from(row.favorite_count).map_err(|_| {
                        TxError::Domain(BoxRepositoryError::query("negative favorite count"))
                    })?;
                    let pokemon: BTreeSet<Uuid> = pokemon_patch
                        .map_or(row.pokemon_ids, |patch| patch)
                        .into_iter()
                        .collect();

                    Ok(PokemonBox {
                        id,
                        owner: UserId::from_uuid(row.owner_id),
                        name,
                        is_public: changes.is_public.unwrap_or(row.is_public),
                        pokemon,
                        favorite_count,
                        created_at: row.created_at,
                        updated_at: now,
                    })
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| {
            let fallback = changes.name.as_ref().map_or("box name", AsRef::as_ref);
            error.unwrap_or_map(|db| map_write_error(db, fallback))
        })
    }

    async fn delete(&self, id: Uuid, requester: UserId) -> Result<(), BoxRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let requester_id = *requester.as_uuid();

        let result: Result<(), TxError<BoxRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let owner: Option<Uuid> = boxes::table
                        .find(id)
                        .select(boxes::owner_id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(owner) = owner else {
                        return Err(TxError::Domain(BoxRepositoryError::not_found(id)));
                    };
                    if owner != requester_id {
                        return Err(TxError::Domain(BoxRepositoryError::not_owner(id)));
                    }

                    diesel::delete(boxes::table.find(id)).execute(conn).await?;

                    diesel::update(users::table.filter(users::id.eq(owner)))
                        .set(users::box_ids.eq(array_remove(users::box_ids, id)))
                        .execute(conn)
                        .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| error.unwrap_or_map(map_diesel_error))
    }

    async fn favorite(
        &self,
        source_id: Uuid,
        requester: UserId,
    ) -> Result<FavoriteOutcome, BoxRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let requester_id = *requester.as_uuid();
        let copy_id = Uuid::new_v4();
        let now = Utc::now();

        let result: Result<FavoriteOutcome, TxError<BoxRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let source: Option<BoxRow> = boxes::table
                        .find(source_id)
                        .select(BoxRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    // Missing and private sources are indistinguishable to
                    // the requester.
                    let Some(source) = source.filter(|row| row.is_public) else {
                        return Err(TxError::Domain(BoxRepositoryError::source_unavailable(
                            source_id,
                        )));
                    };
                    if source.owner_id == requester_id {
                        return Err(TxError::Domain(BoxRepositoryError::self_favorite(
                            source_id,
                        )));
                    }

                    let requester_exists: bool = diesel::select(diesel::dsl::exists(
                        users::table.filter(users::id.eq(requester_id)),
                    ))
                    .get_result(conn)
                    .await?;
                    if !requester_exists {
                        return Err(TxError::Domain(BoxRepositoryError::owner_missing(
                            requester_id,
                        )));
                    }

                    let taken: HashSet<String> = boxes::table
                        .filter(boxes::owner_id.eq(requester_id))
                        .select(boxes::name)
                        .load::<String>(conn)
                        .await?
                        .into_iter()
                        .collect();
                    let copy_name =
                        resolve_copy_name(&source.name, |candidate| taken.contains(candidate))
                            .map_err(|err| {
                                TxError::Domain(BoxRepositoryError::copy_name_exhausted(err.base))
                            })?;

                    let row = NewBoxRow {
                        id: copy_id,
                        owner_id: requester_id,
                        name: &copy_name,
                        is_public: false,
                        pokemon_ids: source.pokemon_ids.clone(),
                        favorite_count: 0,
                        created_at: now,
                        updated_at: now,
                    };
                    diesel::insert_into(boxes::table)
                        .values(&row)
                        .execute(conn)
                        .await
                        .map_err(|err| match unique_violation_constraint(&err) {
                            // Lost a commit race on the probed name; the
                            // caller retries the whole favorite.
                            Some(_) => TxError::Domain(BoxRepositoryError::duplicate_name(
                                copy_name.clone(),
                            )),
                            None => TxError::Db(err),
                        })?;

                    diesel::update(users::table.filter(users::id.eq(requester_id)))
                        .set(users::box_ids.eq(array_append(users::box_ids, copy_id)))
                        .execute(conn)
                        .await?;

                    let new_count: i64 = diesel::update(boxes::table.find(source_id))
                        .set(boxes::favorite_count.eq(boxes::favorite_count + 1_i64))
                        .returning(boxes::favorite_count)
                        .get_result(conn)
                        .await?;
                    let source_favorite_count = u64::try_from(new_count).map_err(|_| {
                        TxError::Domain(BoxRepositoryError::query("negative favorite count"))
                    })?;

                    let copy_box_name = BoxName::new(copy_name).map_err(|err| {
                        TxError::Domain(BoxRepositoryError::query(format!(
                            "generated name rejected: {err}"
                        )))
                    })?;

                    Ok(FavoriteOutcome {
                        copy: PokemonBox {
                            id: copy_id,
                            owner: requester,
                            name: copy_box_name,
                            is_public: false,
                            pokemon: source.pokemon_ids.into_iter().collect(),
                            favorite_count: 0,
                            created_at: now,
                            updated_at: now,
                        },
                        source_favorite_count,
                    })
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| error.unwrap_or_map(map_diesel_error))
    }

    async fn find(&self, id: Uuid) -> Result<Option<PokemonBox>, BoxRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<BoxRow> = boxes::table
            .find(id)
            .select(BoxRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_box).transpose()
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<PokemonBox>, BoxRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<BoxRow> = boxes::table
            .filter(boxes::owner_id.eq(owner.as_uuid()))
            .order(boxes::created_at.desc())
            .select(BoxRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_box).collect()
    }
}
