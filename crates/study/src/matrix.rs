// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A 2-D numeric matrix, stored row by row.
pub type Matrix = Vec<Vec<f64>>;

/// Marker prefixed to matrix ids while they live in a study tree or a command.
pub const MATRIX_PROTOCOL_PREFIX: &str = "matrix://";

/// A reference to a matrix held by a [`MatrixService`].
///
/// The reference only stores the bare content id: it renders as
/// `matrix://<id>` and serializes as `<id>`, so the protocol prefix never
/// reaches a persisted command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatrixRef(String);

impl MatrixRef {
    /// Creates a reference from an id, with or without the protocol prefix.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self(id.strip_prefix(MATRIX_PROTOCOL_PREFIX).unwrap_or(id).to_string())
    }

    /// Parses a tree link. Returns `None` if `value` is not a `matrix://` link.
    #[must_use]
    pub fn from_link(value: &str) -> Option<Self> {
        value
            .strip_prefix(MATRIX_PROTOCOL_PREFIX)
            .filter(|id| !id.is_empty())
            .map(|id| Self(id.to_string()))
    }

    /// The bare content id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }

    /// The `matrix://<id>` form stored in study trees.
    #[must_use]
    pub fn link(&self) -> String {
        format!("{MATRIX_PROTOCOL_PREFIX}{}", self.0)
    }
}

impl std::fmt::Display for MatrixRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{MATRIX_PROTOCOL_PREFIX}{}", self.0)
    }
}

/// Content-addressed storage for 2-D numeric matrices.
///
/// Implementations are shared across every command and study and must accept
/// concurrent calls.
pub trait MatrixService: Send + Sync + std::fmt::Debug {
    /// Stores `data` and returns its content id. Storing identical content twice returns the same id.
    fn create(&self, data: &Matrix) -> String;

    /// Fetches a matrix by id.
    fn get(&self, id: &str) -> Option<Matrix>;

    /// Checks if a matrix is stored under `id`.
    fn exists(&self, id: &str) -> bool;

    /// Removes a matrix. Removing an unknown id is a no-op.
    fn delete(&self, id: &str);
}

/// Computes the content id of a matrix: the SHA-256 of its shape and values.
#[must_use]
pub fn content_id(data: &Matrix) -> String {
    let mut hasher = Sha256::new();
    hasher.update((data.len() as u64).to_le_bytes());
    for row in data {
        hasher.update((row.len() as u64).to_le_bytes());
        for value in row {
            hasher.update(value.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// A [`MatrixService`] keeping every matrix in memory.
#[derive(Debug, Default)]
pub struct InMemoryMatrixService {
    matrices: RwLock<HashMap<String, Arc<Matrix>>>,
}

impl InMemoryMatrixService {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with matrices keyed by id.
    #[must_use]
    pub fn with_matrices(matrices: BTreeMap<String, Matrix>) -> Self {
        let stored: HashMap<String, Arc<Matrix>> = matrices
            .into_iter()
            .map(|(id, data)| (id, Arc::new(data)))
            .collect();
        Self {
            matrices: RwLock::new(stored),
        }
    }

    /// Number of stored matrices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matrices.read().len()
    }

    /// Checks if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matrices.read().is_empty()
    }

    /// Copies every stored matrix, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Matrix> {
        self.matrices
            .read()
            .iter()
            .map(|(id, data)| (id.clone(), data.as_ref().clone()))
            .collect()
    }
}

impl MatrixService for InMemoryMatrixService {
    fn create(&self, data: &Matrix) -> String {
        let id: String = content_id(data);
        self.matrices
            .write()
            .entry(id.clone())
            .or_insert_with(|| Arc::new(data.clone()));
        id
    }

    fn get(&self, id: &str) -> Option<Matrix> {
        self.matrices
            .read()
            .get(id)
            .map(|data| data.as_ref().clone())
    }

    fn exists(&self, id: &str) -> bool {
        self.matrices.read().contains_key(id)
    }

    fn delete(&self, id: &str) {
        self.matrices.write().remove(id);
    }
}
