// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::TreeError;
use serde_json::{Map, Value};

/// Splits a `/`-separated tree path into its segments.
///
/// Empty segments are dropped, so `"input//areas/"` and `"input/areas"` are the same path.
#[must_use]
pub fn url(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A nested key-path store representing a study's on-disk configuration.
///
/// Folders and ini sections are JSON objects, matrices are either a
/// `matrix://<id>` link or a literal array of rows, raw files are strings.
/// The empty path designates the root.
pub trait StudyTree: Send + Sync + std::fmt::Debug {
    /// Reads the node at `url`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::ChildNotFound` if any segment of the path is absent.
    fn get(&self, url: &[&str]) -> Result<Value, TreeError>;

    /// Writes `data` at `url`, creating intermediate folders.
    ///
    /// # Errors
    ///
    /// Returns an error if an intermediate segment is a leaf.
    fn save(&mut self, data: Value, url: &[&str]) -> Result<(), TreeError>;

    /// Removes the node at `url`.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::ChildNotFound` if the node does not exist.
    fn delete(&mut self, url: &[&str]) -> Result<(), TreeError>;

    /// Checks if a node exists at `url`.
    fn exists(&self, url: &[&str]) -> bool {
        self.get(url).is_ok()
    }
}

/// In-memory [`StudyTree`] backed by a single JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonTree {
    root: Value,
}

impl JsonTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Wraps an existing document. Anything other than an object is replaced by an empty root.
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        if root.is_object() {
            Self { root }
        } else {
            Self::new()
        }
    }

    /// Returns the underlying document.
    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    /// Consumes the tree and returns the underlying document.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.root
    }
}

impl Default for JsonTree {
    fn default() -> Self {
        Self::new()
    }
}

fn joined(url: &[&str], upto: usize) -> String {
    url[..upto].join("/")
}

impl StudyTree for JsonTree {
    fn get(&self, url: &[&str]) -> Result<Value, TreeError> {
        let mut node: &Value = &self.root;
        for (depth, key) in url.iter().enumerate() {
            node = node
                .as_object()
                .and_then(|folder| folder.get(*key))
                .ok_or_else(|| TreeError::ChildNotFound {
                    path: joined(url, depth + 1),
                })?;
        }
        Ok(node.clone())
    }

    fn save(&mut self, data: Value, url: &[&str]) -> Result<(), TreeError> {
        let Some((last, parents)) = url.split_last() else {
            self.root = data;
            return Ok(());
        };

        let mut node: &mut Value = &mut self.root;
        for (depth, key) in parents.iter().enumerate() {
            let folder: &mut Map<String, Value> =
                node.as_object_mut().ok_or_else(|| TreeError::NotAFolder {
                    path: joined(url, depth),
                })?;
            node = folder
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let folder: &mut Map<String, Value> =
            node.as_object_mut().ok_or_else(|| TreeError::NotAFolder {
                path: joined(url, parents.len()),
            })?;
        folder.insert((*last).to_string(), data);
        Ok(())
    }

    fn delete(&mut self, url: &[&str]) -> Result<(), TreeError> {
        let Some((last, parents)) = url.split_last() else {
            self.root = Value::Object(Map::new());
            return Ok(());
        };

        let mut node: &mut Value = &mut self.root;
        for (depth, key) in parents.iter().enumerate() {
            node = node
                .as_object_mut()
                .and_then(|folder| folder.get_mut(*key))
                .ok_or_else(|| TreeError::ChildNotFound {
                    path: joined(url, depth + 1),
                })?;
        }

        node.as_object_mut()
            .and_then(|folder| folder.remove(*last))
            .map(|_| ())
            .ok_or_else(|| TreeError::ChildNotFound {
                path: url.join("/"),
            })
    }
}
