// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Stint Contributors

//! Record identifiers.
//!
//! UUID v7 embeds a timestamp, so ids sort by creation time and stay unique
//! across devices without coordination.

use uuid::Uuid;

/// Generates a new time-ordered record id.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Returns true if `s` is a well-formed record id.
pub fn is_valid_id(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

/// Resolves a possibly abbreviated id against a set of candidates.
///
/// Exact matches win; otherwise a unique prefix match is returned.
pub fn resolve_prefix<'a, I>(prefix: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut found: Option<&str> = None;
    let mut ambiguous = false;
    for candidate in candidates {
        if candidate == prefix {
            return Some(candidate.to_string());
        }
        if candidate.starts_with(prefix) {
            ambiguous |= found.is_some();
            found = Some(candidate);
        }
    }
    if ambiguous {
        return None;
    }
    found.map(str::to_string)
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
