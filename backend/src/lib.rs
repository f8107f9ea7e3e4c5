//! Collection-ranking backend core.
//!
//! Users own rankings (ordered, zoned Pokémon lists) and boxes (named,
//! favoritable Pokémon sets). This crate is the consistency subsystem
//! governing them: per-owner name uniqueness, zone-interval validation,
//! paired user-array maintenance, and the derived highest-ranked-count
//! aggregate — all behind hexagonal ports with PostgreSQL and Redis
//! adapters. Transport, auth, and presentation live elsewhere.

pub mod domain;
pub mod outbound;

#[cfg(feature = "test-support")]
pub mod test_support;
