//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed collection entities and the services that
//! mutate them, keeping persistence and caching behind the ports in
//! [`ports`]. Types are immutable where practical and document their
//! invariants and serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`] — transport-agnostic error payload.
//! - [`User`], [`Ranking`], [`PokemonBox`] — the owned aggregates.
//! - [`RankingsService`], [`BoxesService`], [`RankedStatsTracker`] — the
//!   driving-port implementations.

pub mod boxes;
pub mod boxes_service;
pub mod error;
pub mod naming;
pub mod ports;
pub mod ranked_stats;
pub mod ranking;
pub mod rankings_service;
pub mod user;
pub mod zones;

pub use self::boxes::{BoxKey, BoxName, BoxView, PokemonBox};
pub use self::boxes_service::BoxesService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ranked_stats::RankedStatsTracker;
pub use self::ranking::{Ranking, RankingChanges, RankingTitle};
pub use self::rankings_service::RankingsService;
pub use self::user::{DisplayName, User, UserId};
pub use self::zones::{validate_zones, Zone, ZoneColor, ZoneValidationError};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use backend::domain::{DomainResult, Error};
///
/// fn guard(allowed: bool) -> DomainResult<()> {
///     if allowed { Ok(()) } else { Err(Error::forbidden("nope")) }
/// }
/// assert!(guard(false).is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
