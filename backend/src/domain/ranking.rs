//! Ranking aggregate and its value types.
//!
//! A ranking is an ordered Pokémon list owned by exactly one user, divided
//! into coloured zones. Position in `pokemon` is the rank, 1-indexed. The
//! title is unique among the owner's rankings; the repository enforces the
//! uniqueness inside each write transaction with the database index as the
//! commit-time backstop.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;
use super::zones::Zone;

/// Maximum allowed length for a ranking title, in characters.
pub const RANKING_TITLE_MAX: usize = 100;

/// Validation errors raised by ranking value-type constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
}

impl fmt::Display for RankingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "ranking title must not be empty"),
            Self::TitleTooLong { max } => {
                write!(f, "ranking title must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for RankingValidationError {}

/// Ranking title, unique per owner, 1–100 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RankingTitle(String);

impl RankingTitle {
    /// Validate and construct a title.
    pub fn new(title: impl Into<String>) -> Result<Self, RankingValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(RankingValidationError::EmptyTitle);
        }
        if title.chars().count() > RANKING_TITLE_MAX {
            return Err(RankingValidationError::TitleTooLong {
                max: RANKING_TITLE_MAX,
            });
        }
        Ok(Self(title))
    }
}

impl AsRef<str> for RankingTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RankingTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<RankingTitle> for String {
    fn from(value: RankingTitle) -> Self {
        value.0
    }
}

impl TryFrom<String> for RankingTitle {
    type Error = RankingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// An ordered, zoned Pokémon ranking owned by one user.
///
/// ## Invariants
/// - `owner` never changes after creation.
/// - `title` is unique among the owner's rankings.
/// - `zones` satisfy [`crate::domain::zones::validate_zones`] against
///   `pokemon.len()` at every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning user; immutable after creation.
    pub owner: UserId,
    /// Title, unique per owner.
    pub title: RankingTitle,
    /// Ranked Pokémon; position is the rank, 1-indexed.
    pub pokemon: Vec<Uuid>,
    /// Coloured position ranges laid over the list.
    pub zones: Vec<Zone>,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Ranking {
    /// Number of ranked positions currently held.
    pub fn pokemon_count(&self) -> usize {
        self.pokemon.len()
    }
}

/// Input for creating a ranking; the repository mints nothing from it until
/// zones have been validated by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRanking {
    /// Owning user.
    pub owner: UserId,
    /// Title, unique per owner.
    pub title: RankingTitle,
    /// Initial ranked Pokémon.
    pub pokemon: Vec<Uuid>,
    /// Initial zones; validated against `pokemon.len()`.
    pub zones: Vec<Zone>,
}

/// Partial update to a ranking; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingChanges {
    /// Replacement title, if any.
    pub title: Option<RankingTitle>,
    /// Replacement Pokémon order, if any.
    pub pokemon: Option<Vec<Uuid>>,
    /// Replacement zone set, if any.
    pub zones: Option<Vec<Zone>>,
}

impl RankingChanges {
    /// Whether the patch can change the ranking's Pokémon count.
    ///
    /// Drives the ranked-stats recompute: title and zone edits never move
    /// the aggregate, so they skip the tracker entirely.
    pub const fn affects_pokemon_count(&self) -> bool {
        self.pokemon.is_some()
    }

    /// Whether the patch carries no changes at all.
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.pokemon.is_none() && self.zones.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Kanto starters", true)]
    #[case("", false)]
    #[case("  ", false)]
    fn title_validation(#[case] input: &str, #[case] accepted: bool) {
        assert_eq!(RankingTitle::new(input).is_ok(), accepted);
    }

    #[test]
    fn title_accepts_exactly_one_hundred_characters() {
        assert!(RankingTitle::new("x".repeat(RANKING_TITLE_MAX)).is_ok());
        assert_eq!(
            RankingTitle::new("x".repeat(RANKING_TITLE_MAX + 1)),
            Err(RankingValidationError::TitleTooLong {
                max: RANKING_TITLE_MAX
            })
        );
    }

    #[test]
    fn empty_changes_report_themselves() {
        let changes = RankingChanges::default();
        assert!(changes.is_empty());
        assert!(!changes.affects_pokemon_count());
    }

    #[test]
    fn pokemon_patch_affects_the_count() {
        let changes = RankingChanges {
            pokemon: Some(vec![Uuid::new_v4()]),
            ..RankingChanges::default()
        };
        assert!(changes.affects_pokemon_count());
        assert!(!changes.is_empty());
    }
}
