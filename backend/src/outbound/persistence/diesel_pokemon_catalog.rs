//! PostgreSQL-backed read adapter over the Pokémon catalog.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{PokemonCatalog, PokemonCatalogError};

use super::diesel_helpers::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::{DbPool, PoolError};
use super::schema::pokemon;

/// Diesel-backed implementation of the `PokemonCatalog` port.
#[derive(Clone)]
pub struct DieselPokemonCatalog {
    pool: DbPool,
}

impl DieselPokemonCatalog {
    /// Create a new catalog adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to catalog errors.
fn map_pool_error(error: PoolError) -> PokemonCatalogError {
    map_basic_pool_error(error, |message| PokemonCatalogError::connection(message))
}

#[async_trait]
impl PokemonCatalog for DieselPokemonCatalog {
    async fn all_pokemon(&self) -> Result<Vec<Uuid>, PokemonCatalogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        pokemon::table
            .order(pokemon::dex_number.asc())
            .select(pokemon::id)
            .load(&mut conn)
            .await
            .map_err(|error| {
                map_basic_diesel_error(
                    error,
                    |message| PokemonCatalogError::query(message),
                    |message| PokemonCatalogError::connection(message),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::build("bad url"));
        assert!(matches!(error, PokemonCatalogError::Connection { .. }));
        assert!(error.to_string().contains("bad url"));
    }
}
