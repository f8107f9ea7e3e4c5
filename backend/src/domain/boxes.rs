//! Box aggregate, the default-box synthesis, and their value types.
//!
//! A box is a named, ownable Pokémon set. Public boxes can be copied
//! ("favorited") by other users; each copy bumps the source's monotone
//! `favorite_count`. Listings additionally surface a virtual "default" box
//! holding every catalog Pokémon — it is computed on read, never stored, and
//! sits outside every uniqueness and ownership invariant.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Maximum allowed length for a box name, in characters.
pub const BOX_NAME_MAX: usize = 100;

/// Fixed label of the synthesized default box.
pub const DEFAULT_BOX_NAME: &str = "All Pokémon";

/// Sentinel identifier of the synthesized default box.
const DEFAULT_BOX_KEY: &str = "default";

/// Validation errors raised by box value-type constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxValidationError {
    EmptyName,
    NameTooLong { max: usize },
    UnknownKey { value: String },
}

impl fmt::Display for BoxValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "box name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "box name must be at most {max} characters")
            }
            Self::UnknownKey { value } => {
                write!(f, "box key must be \"default\" or a UUID, got {value:?}")
            }
        }
    }
}

impl std::error::Error for BoxValidationError {}

/// Box name, unique per owner, 1–100 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoxName(String);

impl BoxName {
    /// Validate and construct a name.
    pub fn new(name: impl Into<String>) -> Result<Self, BoxValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BoxValidationError::EmptyName);
        }
        if name.chars().count() > BOX_NAME_MAX {
            return Err(BoxValidationError::NameTooLong { max: BOX_NAME_MAX });
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for BoxName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BoxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<BoxName> for String {
    fn from(value: BoxName) -> Self {
        value.0
    }
}

impl TryFrom<String> for BoxName {
    type Error = BoxValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Identifier of a box as surfaced by listings.
///
/// Stored boxes carry their UUID; the virtual default box carries the
/// `"default"` sentinel. Serialises as a plain string either way, so stored
/// boxes can never collide with the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BoxKey {
    /// The synthesized, never-persisted default box.
    Default,
    /// A persisted box.
    Stored(Uuid),
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str(DEFAULT_BOX_KEY),
            Self::Stored(id) => id.fmt(f),
        }
    }
}

impl From<BoxKey> for String {
    fn from(value: BoxKey) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for BoxKey {
    type Error = BoxValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == DEFAULT_BOX_KEY {
            return Ok(Self::Default);
        }
        Uuid::parse_str(&value)
            .map(Self::Stored)
            .map_err(|_| BoxValidationError::UnknownKey { value })
    }
}

/// A named, ownable Pokémon set, optionally public and favoritable.
///
/// ## Invariants
/// - `name` is unique among the owner's boxes.
/// - `favorite_count` only ever grows, by exactly 1 per favorite, through an
///   atomic increment in the favorite transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonBox {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning user.
    pub owner: UserId,
    /// Name, unique per owner.
    pub name: BoxName,
    /// Whether other users may see and favorite this box.
    pub is_public: bool,
    /// Unordered Pokémon membership.
    pub pokemon: BTreeSet<Uuid>,
    /// How many times this box has been favorited.
    pub favorite_count: u64,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a box.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBox {
    /// Owning user.
    pub owner: UserId,
    /// Name, unique per owner.
    pub name: BoxName,
    /// Whether the box is visible to other users.
    pub is_public: bool,
    /// Initial Pokémon membership.
    pub pokemon: BTreeSet<Uuid>,
}

/// Partial update to a box; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxChanges {
    /// Replacement name, if any.
    pub name: Option<BoxName>,
    /// Replacement visibility, if any.
    pub is_public: Option<bool>,
    /// Replacement membership, if any.
    pub pokemon: Option<BTreeSet<Uuid>>,
}

impl BoxChanges {
    /// Whether the patch carries no changes at all.
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_public.is_none() && self.pokemon.is_none()
    }
}

/// A box as surfaced by the listing read, stored or synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxView {
    /// Listing identifier; `default` for the synthesized box.
    pub key: BoxKey,
    /// Display name.
    pub name: String,
    /// Whether other users may see and favorite this box.
    pub is_public: bool,
    /// Pokémon membership.
    pub pokemon: BTreeSet<Uuid>,
    /// Favorite counter; always 0 for the synthesized box.
    pub favorite_count: u64,
}

impl BoxView {
    /// Synthesize the virtual default box over the full catalog.
    ///
    /// The result is excluded from every uniqueness and ownership check: it
    /// is never created, never uniquely named, and never deleted.
    pub fn default_box(catalog: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            key: BoxKey::Default,
            name: DEFAULT_BOX_NAME.to_owned(),
            is_public: false,
            pokemon: catalog.into_iter().collect(),
            favorite_count: 0,
        }
    }
}

impl From<PokemonBox> for BoxView {
    fn from(value: PokemonBox) -> Self {
        Self {
            key: BoxKey::Stored(value.id),
            name: value.name.into(),
            is_public: value.is_public,
            pokemon: value.pokemon,
            favorite_count: value.favorite_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Water", true)]
    #[case("", false)]
    #[case("  ", false)]
    fn name_validation(#[case] input: &str, #[case] accepted: bool) {
        assert_eq!(BoxName::new(input).is_ok(), accepted);
    }

    #[test]
    fn name_accepts_exactly_one_hundred_characters() {
        assert!(BoxName::new("x".repeat(BOX_NAME_MAX)).is_ok());
        assert!(BoxName::new("x".repeat(BOX_NAME_MAX + 1)).is_err());
    }

    #[test]
    fn box_key_serialises_the_sentinel_as_a_plain_string() {
        let value = serde_json::to_value(BoxKey::Default).expect("serializes");
        assert_eq!(value, serde_json::json!("default"));
    }

    #[test]
    fn box_key_round_trips_stored_ids() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(BoxKey::Stored(id)).expect("serializes");
        let back: BoxKey = serde_json::from_value(value).expect("deserializes");
        assert_eq!(back, BoxKey::Stored(id));
    }

    #[test]
    fn box_key_rejects_arbitrary_strings() {
        let result: Result<BoxKey, _> = serde_json::from_value(serde_json::json!("not-a-key"));
        assert!(result.is_err());
    }

    #[test]
    fn default_box_spans_the_catalog_and_never_counts_favorites() {
        let catalog = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let view = BoxView::default_box(catalog.clone());

        assert_eq!(view.key, BoxKey::Default);
        assert_eq!(view.name, DEFAULT_BOX_NAME);
        assert_eq!(view.pokemon.len(), catalog.len());
        assert_eq!(view.favorite_count, 0);
    }
}
