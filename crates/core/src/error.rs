// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use antares_study::{StudyError, TreeError};

/// Errors raised while building, extracting, reverting or diffing commands.
///
/// Expected domain failures during `apply` (duplicate or missing entities) are
/// not errors: they are reported through [`CommandOutput`](crate::CommandOutput).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A command argument is invalid (bad name, mutually exclusive fields, ...).
    Validation {
        /// The action being built.
        action: String,
        /// A human-readable description of the violation.
        reason: String,
    },
    /// A matrix argument has the wrong shape, contains NaN or is an unknown id.
    InvalidMatrix {
        /// A human-readable description of the problem.
        reason: String,
    },
    /// The arguments of a DTO could not be decoded.
    InvalidArguments {
        /// The action being decoded.
        action: String,
        /// The decoding error.
        reason: String,
    },
    /// The DTO action does not name a known command.
    NotImplemented(String),
    /// An entity referenced by an extraction does not exist in the study config.
    EntityNotFound {
        /// The kind of entity (area, link, ...).
        kind: String,
        /// The entity identifier.
        id: String,
    },
    /// A tree operation failed.
    Tree(TreeError),
    /// A study rule was violated.
    Study(StudyError),
}

impl CommandError {
    /// Whether this error means "the target does not exist".
    ///
    /// The reverter turns these into an empty revert.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EntityNotFound { .. } | Self::Tree(TreeError::ChildNotFound { .. })
        )
    }

    pub(crate) fn validation(action: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn entity_not_found(kind: &str, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            kind: kind.to_string(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { action, reason } => {
                write!(f, "Invalid '{action}' command: {reason}")
            }
            Self::InvalidMatrix { reason } => write!(f, "Invalid matrix: {reason}"),
            Self::InvalidArguments { action, reason } => {
                write!(f, "Invalid arguments for '{action}': {reason}")
            }
            Self::NotImplemented(action) => write!(f, "Command '{action}' is not implemented"),
            Self::EntityNotFound { kind, id } => write!(f, "The {kind} '{id}' does not exist"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Study(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<TreeError> for CommandError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<StudyError> for CommandError {
    fn from(err: StudyError) -> Self {
        match err {
            StudyError::Tree(tree) => Self::Tree(tree),
            other => Self::Study(other),
        }
    }
}
