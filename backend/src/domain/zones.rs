//! Ranking zones and their interval validation.
//!
//! A zone is a named, coloured, contiguous range of ranking positions,
//! embedded in a ranking as a value type with no identity of its own. Zones
//! are validated as a set at ranking write time: every create or update that
//! changes the effective zones or the effective Pokémon count re-runs
//! [`validate_zones`], because a shrinking Pokémon list can invalidate a
//! previously valid bounded zone.

use serde::{Deserialize, Serialize};

/// Validation errors raised by zone construction and [`validate_zones`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneValidationError {
    /// A colour value was not a 6-hex-digit string.
    InvalidColor { value: String },
    /// A zone started before position 1.
    InvalidStart { zone_name: String },
    /// A bounded zone ended before it started.
    InvalidInterval { zone_name: String, start: u32, end: u32 },
    /// A bounded zone reached past the ranking's Pokémon count.
    ZoneExceedsCapacity {
        zone_name: String,
        end: u32,
        total_positions: u32,
    },
    /// Two zones claimed a common position.
    OverlappingZones {
        first: String,
        second: String,
        end: u32,
        start: u32,
    },
    /// A zone followed an unbounded zone; an unbounded zone must be last.
    ZoneAfterUnbounded { zone_name: String },
}

impl std::fmt::Display for ZoneValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColor { value } => {
                write!(f, "zone colour must be a 6-hex-digit string, got {value:?}")
            }
            Self::InvalidStart { zone_name } => {
                write!(f, "zone {zone_name:?} must start at position 1 or later")
            }
            Self::InvalidInterval {
                zone_name,
                start,
                end,
            } => write!(
                f,
                "zone {zone_name:?} ends at {end} before its start {start}"
            ),
            Self::ZoneExceedsCapacity {
                zone_name,
                end,
                total_positions,
            } => write!(
                f,
                "zone {zone_name:?} ends at {end} but the ranking holds {total_positions} Pokémon"
            ),
            Self::OverlappingZones {
                first,
                second,
                end,
                start,
            } => write!(
                f,
                "zone {first:?} ending at {end} overlaps zone {second:?} starting at {start}"
            ),
            Self::ZoneAfterUnbounded { zone_name } => {
                write!(f, "zone {zone_name:?} follows an unbounded zone")
            }
        }
    }
}

impl std::error::Error for ZoneValidationError {}

/// Hex colour rendered for a zone, stored without a leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneColor(String);

impl ZoneColor {
    /// Validate and construct a colour from a 6-hex-digit string.
    pub fn new(value: impl Into<String>) -> Result<Self, ZoneValidationError> {
        let value = value.into();
        if value.len() != 6 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ZoneValidationError::InvalidColor { value });
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for ZoneColor {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ZoneColor> for String {
    fn from(value: ZoneColor) -> Self {
        value.0
    }
}

impl TryFrom<String> for ZoneColor {
    type Error = ZoneValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A named, coloured, contiguous range of ranking positions.
///
/// Positions are 1-indexed. `end` of `None` means the zone runs to the end
/// of the list, whatever its current length; such a zone must be the last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Label shown beside the range.
    pub name: String,
    /// First position covered (1-based).
    pub start: u32,
    /// Last position covered, or `None` for "to the end of the list".
    pub end: Option<u32>,
    /// Colour rendered behind the range.
    pub color: ZoneColor,
}

/// Validate a set of zones against a ranking's current Pokémon count.
///
/// Checks, in order:
/// - every `start` is at least 1, and every bounded `end` is not before its
///   `start`;
/// - every bounded `end` fits within `total_positions`;
/// - sorted by `start` (stable, so equal starts keep input order — any such
///   pair necessarily overlaps, so tie order cannot change the verdict),
///   no zone begins at or before its predecessor's end, and nothing at all
///   may follow an unbounded zone.
///
/// Empty and single-zone inputs pass trivially.
///
/// # Examples
/// ```
/// use backend::domain::zones::{validate_zones, Zone, ZoneColor};
///
/// let zones = vec![Zone {
///     name: "top tier".into(),
///     start: 1,
///     end: Some(3),
///     color: ZoneColor::new("ff0000").expect("valid colour"),
/// }];
/// assert!(validate_zones(&zones, 6).is_ok());
/// assert!(validate_zones(&zones, 2).is_err());
/// ```
pub fn validate_zones(zones: &[Zone], total_positions: u32) -> Result<(), ZoneValidationError> {
    for zone in zones {
        if zone.start < 1 {
            return Err(ZoneValidationError::InvalidStart {
                zone_name: zone.name.clone(),
            });
        }
        if let Some(end) = zone.end {
            if end < zone.start {
                return Err(ZoneValidationError::InvalidInterval {
                    zone_name: zone.name.clone(),
                    start: zone.start,
                    end,
                });
            }
            if end > total_positions {
                return Err(ZoneValidationError::ZoneExceedsCapacity {
                    zone_name: zone.name.clone(),
                    end,
                    total_positions,
                });
            }
        }
    }

    let mut ordered: Vec<&Zone> = zones.iter().collect();
    ordered.sort_by_key(|zone| zone.start);

    for pair in ordered.windows(2) {
        let (Some(previous), Some(next)) = (pair.first(), pair.get(1)) else {
            continue;
        };
        match previous.end {
            None => {
                return Err(ZoneValidationError::ZoneAfterUnbounded {
                    zone_name: next.name.clone(),
                });
            }
            Some(end) if end >= next.start => {
                return Err(ZoneValidationError::OverlappingZones {
                    first: previous.name.clone(),
                    second: next.name.clone(),
                    end,
                    start: next.start,
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}
