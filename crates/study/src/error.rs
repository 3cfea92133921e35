// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors raised by a [`StudyTree`](crate::StudyTree) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The requested path does not exist in the tree.
    ChildNotFound {
        /// The `/`-joined path that could not be resolved.
        path: String,
    },
    /// A path segment resolved to a leaf where a folder was expected.
    NotAFolder {
        /// The `/`-joined path of the offending leaf.
        path: String,
    },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChildNotFound { path } => write!(f, "Path '{path}' not found in study tree"),
            Self::NotAFolder { path } => write!(f, "Path '{path}' is not a folder"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Errors raised by a [`MatrixService`](crate::MatrixService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// No matrix is stored under this id.
    NotFound(String),
}

impl std::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Matrix '{id}' not found"),
        }
    }
}

impl std::error::Error for MatrixError {}

/// Errors that can occur while validating study data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyError {
    /// A name contains forbidden characters or is empty.
    InvalidName {
        /// The kind of object being named (area, cluster, ...).
        kind: String,
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },
    /// The study version is not one this engine knows about.
    UnknownVersion(u32),
    /// A tree operation failed.
    Tree(TreeError),
    /// A matrix operation failed.
    Matrix(MatrixError),
}

impl std::fmt::Display for StudyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName { kind, name, reason } => {
                write!(f, "Invalid {kind} name '{name}': {reason}")
            }
            Self::UnknownVersion(version) => write!(f, "Unknown study version {version}"),
            Self::Tree(err) => write!(f, "Tree error: {err}"),
            Self::Matrix(err) => write!(f, "Matrix error: {err}"),
        }
    }
}

impl std::error::Error for StudyError {}

impl From<TreeError> for StudyError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<MatrixError> for StudyError {
    fn from(err: MatrixError) -> Self {
        Self::Matrix(err)
    }
}
