//! PostgreSQL-backed `RankedStatsRepository` implementation.
//!
//! Reads ranking sizes via SQL `array_length` so the tracker never pulls
//! full Pokémon arrays, and persists the derived aggregate on the user row.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{RankedStatsRepository, RankedStatsRepositoryError};
use crate::domain::user::UserId;

use super::diesel_helpers::{array_length, map_basic_diesel_error, map_basic_pool_error};
use super::pool::{DbPool, PoolError};
use super::schema::{rankings, users};

/// Diesel-backed implementation of the `RankedStatsRepository` port.
#[derive(Clone)]
pub struct DieselRankedStatsRepository {
    pool: DbPool,
}

impl DieselRankedStatsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to ranked-stats repository errors.
fn map_pool_error(error: PoolError) -> RankedStatsRepositoryError {
    map_basic_pool_error(error, |message| {
        RankedStatsRepositoryError::connection(message)
    })
}

/// Map Diesel errors to ranked-stats repository errors.
fn map_diesel_error(error: diesel::result::Error) -> RankedStatsRepositoryError {
    map_basic_diesel_error(
        error,
        |message| RankedStatsRepositoryError::query(message),
        |message| RankedStatsRepositoryError::connection(message),
    )
}

/// Convert an `array_length` result to a domain count.
///
/// PostgreSQL reports `NULL` for empty arrays; anything negative would mean
/// corrupt data and is clamped through the error path.
fn length_to_count(length: Option<i32>) -> Result<u32, RankedStatsRepositoryError> {
    match length {
        None => Ok(0),
        Some(value) => u32::try_from(value)
            .map_err(|_| RankedStatsRepositoryError::query("negative array length")),
    }
}

#[async_trait]
impl RankedStatsRepository for DieselRankedStatsRepository {
    async fn pokemon_counts(
        &self,
        owner: UserId,
    ) -> Result<Vec<u32>, RankedStatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let lengths: Vec<Option<i32>> = rankings::table
            .filter(rankings::owner_id.eq(owner.as_uuid()))
            .select(array_length(rankings::pokemon_ids, 1))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        lengths.into_iter().map(length_to_count).collect()
    }

    async fn stored_highest(&self, owner: UserId) -> Result<u32, RankedStatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored: Option<i32> = users::table
            .find(owner.as_uuid())
            .select(users::highest_ranked_count)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some(stored) = stored else {
            return Err(RankedStatsRepositoryError::owner_missing(*owner.as_uuid()));
        };
        u32::try_from(stored)
            .map_err(|_| RankedStatsRepositoryError::query("negative stored aggregate"))
    }

    async fn store_highest(
        &self,
        owner: UserId,
        value: u32,
    ) -> Result<(), RankedStatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let value = i32::try_from(value)
            .map_err(|_| RankedStatsRepositoryError::query("aggregate overflows storage"))?;

        let updated: usize = diesel::update(users::table.find(owner.as_uuid()))
            .set(users::highest_ranked_count.eq(value))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(RankedStatsRepositoryError::owner_missing(*owner.as_uuid()));
        }
        Ok(())
    }
}
