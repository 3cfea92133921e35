// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::config::StudyConfig;
use crate::tree::{JsonTree, StudyTree};
use crate::version::StudyVersion;

/// A materialized study: its config index and its tree.
///
/// Commands mutate both halves together.
#[derive(Debug)]
pub struct FileStudy {
    pub config: StudyConfig,
    pub tree: Box<dyn StudyTree>,
}

impl FileStudy {
    /// Wraps a config and a tree.
    #[must_use]
    pub fn new(config: StudyConfig, tree: impl StudyTree + 'static) -> Self {
        Self {
            config,
            tree: Box::new(tree),
        }
    }

    /// Creates a study with no area, backed by an in-memory tree.
    #[must_use]
    pub fn empty(version: StudyVersion) -> Self {
        Self::new(StudyConfig::new(version), JsonTree::new())
    }

    /// The study's schema version.
    #[must_use]
    pub const fn version(&self) -> StudyVersion {
        self.config.version
    }
}
