// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::StudyError;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static INVALID_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-zA-Z0-9_(),& -]+").expect("invalid-character pattern is a valid regex")
});

/// Derives the identifier of an area, cluster, district or binding constraint from its name.
///
/// Every run of characters outside `[a-zA-Z0-9_(),& -]` is replaced by a single
/// space and the result is trimmed.
///
/// # Arguments
///
/// * `name` - The display name
/// * `lower` - Whether the identifier is lower-cased
#[must_use]
pub fn transform_name_to_id(name: &str, lower: bool) -> String {
    let replaced = INVALID_CHARS.replace_all(name, " ");
    let trimmed: &str = replaced.trim();
    if lower {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Returns whether a name only uses characters allowed in identifiers.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !INVALID_CHARS.is_match(name) && !transform_name_to_id(name, true).is_empty()
}

/// Validates a user-supplied name.
///
/// # Errors
///
/// Returns an error if:
/// - The name contains characters outside the allowed set
/// - The name produces an empty identifier
pub fn validate_name(kind: &str, name: &str) -> Result<(), StudyError> {
    if INVALID_CHARS.is_match(name) {
        return Err(StudyError::InvalidName {
            kind: kind.to_string(),
            name: name.to_string(),
            reason: String::from(
                "only letters, digits, spaces and the characters '_', '(', ')', ',', '&', '-' are allowed",
            ),
        });
    }
    if transform_name_to_id(name, true).is_empty() {
        return Err(StudyError::InvalidName {
            kind: kind.to_string(),
            name: name.to_string(),
            reason: String::from("name must not be empty"),
        });
    }
    Ok(())
}
