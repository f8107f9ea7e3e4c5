//! PostgreSQL persistence adapters for the domain's driven ports.
//!
//! One Diesel-backed repository per port, all sharing the [`pool::DbPool`]
//! wrapper. Transactional semantics live in the repository files; shared
//! error mapping and the array SQL functions live in `diesel_helpers`.

mod diesel_box_repository;
mod diesel_helpers;
mod diesel_pokemon_catalog;
mod diesel_ranked_stats_repository;
mod diesel_ranking_repository;
mod models;
pub mod pool;
pub mod schema;

pub use diesel_box_repository::DieselBoxRepository;
pub use diesel_pokemon_catalog::DieselPokemonCatalog;
pub use diesel_ranked_stats_repository::DieselRankedStatsRepository;
pub use diesel_ranking_repository::DieselRankingRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
