//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod box_repository;
mod boxes_command;
mod boxes_query;
mod leaderboard_cache;
mod pokemon_catalog;
mod ranked_stats_repository;
mod ranking_repository;
mod rankings_command;
mod rankings_query;

#[cfg(test)]
pub use box_repository::MockBoxRepository;
pub use box_repository::{
    BoxRepository, BoxRepositoryError, FavoriteOutcome, FixtureBoxRepository,
};
#[cfg(test)]
pub use boxes_command::MockBoxesCommand;
pub use boxes_command::{
    BoxesCommand, CreateBoxRequest, DeleteBoxRequest, FavoriteBoxRequest, FavoriteBoxResponse,
    FixtureBoxesCommand, UpdateBoxRequest,
};
#[cfg(test)]
pub use boxes_query::MockBoxesQuery;
pub use boxes_query::{BoxesQuery, FixtureBoxesQuery};
#[cfg(test)]
pub use leaderboard_cache::MockLeaderboardCache;
pub use leaderboard_cache::{
    LeaderboardCache, LeaderboardCacheError, NoOpLeaderboardCache, LEADERBOARD_CACHE_KEY,
};
#[cfg(test)]
pub use pokemon_catalog::MockPokemonCatalog;
pub use pokemon_catalog::{FixturePokemonCatalog, PokemonCatalog, PokemonCatalogError};
#[cfg(test)]
pub use ranked_stats_repository::MockRankedStatsRepository;
pub use ranked_stats_repository::{
    FixtureRankedStatsRepository, RankedStatsRepository, RankedStatsRepositoryError,
};
#[cfg(test)]
pub use ranking_repository::MockRankingRepository;
pub use ranking_repository::{
    FixtureRankingRepository, RankingRepository, RankingRepositoryError,
};
#[cfg(test)]
pub use rankings_command::MockRankingsCommand;
pub use rankings_command::{
    CreateRankingRequest, DeleteRankingRequest, FixtureRankingsCommand, RankingsCommand,
    UpdateRankingRequest,
};
#[cfg(test)]
pub use rankings_query::MockRankingsQuery;
pub use rankings_query::{FixtureRankingsQuery, RankingsQuery};
