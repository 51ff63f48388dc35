//! Name derivation for dashboard tree nodes.
//!
//! # Responsibility
//! - Turn free-form titles into file-safe slugs.
//! - Build row/panel names from their position or id plus title.
//! - Match a requested name against a child, by exact name or numeric prefix.
//!
//! # Invariants
//! - Slugs contain only lowercase alphanumerics separated by single `-`.
//! - Row names start with the 1-based row position, panel names with the panel id.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Lowercases `text` and collapses every non-alphanumeric run into one `-`.
pub fn slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Builds `"{number}-{slug(title)}"`, or just the number for an empty title.
pub fn numbered_name(number: u64, title: &str) -> String {
    let slugged = slug(title);
    if slugged.is_empty() {
        number.to_string()
    } else {
        format!("{number}-{slugged}")
    }
}

/// Leading decimal number of a child name, e.g. `3` for `3-cpu-load`.
pub fn numeric_prefix(name: &str) -> Option<u64> {
    let digits = name.split('-').next()?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Index of the sibling addressed by `requested` among `(name, number)` pairs.
///
/// An exact name match anywhere among the siblings wins; only when there is
/// none is the numeric prefix of `requested` compared to each sibling number,
/// so renamed children stay addressable by position or id.
pub fn resolve_index(requested: &str, siblings: &[(String, u64)]) -> Option<usize> {
    siblings
        .iter()
        .position(|(name, _)| name == requested)
        .or_else(|| {
            let number = numeric_prefix(requested)?;
            siblings.iter().position(|(_, sibling)| *sibling == number)
        })
}
