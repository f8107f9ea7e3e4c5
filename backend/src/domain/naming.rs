//! Collision-avoiding copy names for favorited boxes.
//!
//! When a user favorites a box they already own a name for, the copy takes
//! the first free `"{base} (n)"` candidate. The probe is a best-effort
//! optimisation: the per-owner unique index still decides at commit time, so
//! a concurrent insert of the same candidate surfaces as a duplicate-name
//! conflict and the caller retries the whole operation. Repositories run the
//! probe inside the favorite transaction against the requester's current box
//! names.

/// Upper bound on copy-name candidates tried before giving up.
///
/// Caps worst-case latency against pathological data (a user owning
/// "Box (2)" through "Box (100)"): beyond this the resolver fails instead of
/// probing further.
pub const MAX_COPY_NAME_ATTEMPTS: u32 = 100;

/// Failure raised when every copy-name candidate is taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no free copy name for {base:?} within {attempts} attempts")]
pub struct CopyNameExhausted {
    /// The name the probe started from.
    pub base: String,
    /// How many candidates were tried.
    pub attempts: u32,
}

/// Resolve a free name for a copy of `base`.
///
/// Returns `base` unchanged when `is_taken` rejects it, otherwise probes
/// `"{base} (2)"`, `"{base} (3)"`, … and returns the first candidate that is
/// free. Fails with [`CopyNameExhausted`] after [`MAX_COPY_NAME_ATTEMPTS`]
/// candidates.
///
/// # Examples
/// ```
/// use std::collections::HashSet;
/// use backend::domain::naming::resolve_copy_name;
///
/// let taken: HashSet<&str> = ["Water", "Water (2)"].into();
/// let name = resolve_copy_name("Water", |candidate| taken.contains(candidate))
///     .expect("candidates remain");
/// assert_eq!(name, "Water (3)");
/// ```
pub fn resolve_copy_name(
    base: &str,
    mut is_taken: impl FnMut(&str) -> bool,
) -> Result<String, CopyNameExhausted> {
    if !is_taken(base) {
        return Ok(base.to_owned());
    }

    for suffix in 2..=MAX_COPY_NAME_ATTEMPTS {
        let candidate = format!("{base} ({suffix})");
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(CopyNameExhausted {
        base: base.to_owned(),
        attempts: MAX_COPY_NAME_ATTEMPTS,
    })
}
