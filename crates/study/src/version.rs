// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::StudyError;
use serde::{Deserialize, Serialize};

/// The schema version of a study, encoded the way Antares does (`870` for 8.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StudyVersion(u32);

const KNOWN_VERSIONS: [u32; 14] = [
    600, 650, 700, 710, 720, 800, 810, 820, 830, 840, 850, 860, 870, 880,
];

impl StudyVersion {
    pub const V6_0: Self = Self(600);
    /// Hydro credit modulations, inflow pattern and water values matrices.
    pub const V6_5: Self = Self(650);
    pub const V7_0: Self = Self(700);
    /// Renewable clusters.
    pub const V8_1: Self = Self(810);
    /// Link parameters split from the transmission capacities.
    pub const V8_2: Self = Self(820);
    /// Short-term storages and hydro `mingen` series.
    pub const V8_6: Self = Self(860);
    /// Binding-constraint term matrices and constraint groups.
    pub const V8_7: Self = Self(870);
    pub const V8_8: Self = Self(880);

    /// The most recent version handled by the engine.
    pub const LATEST: Self = Self::V8_8;

    /// Parses a numeric version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is not a known Antares version.
    pub fn parse(value: u32) -> Result<Self, StudyError> {
        if KNOWN_VERSIONS.contains(&value) {
            Ok(Self(value))
        } else {
            Err(StudyError::UnknownVersion(value))
        }
    }

    /// Returns the numeric value (e.g. `870`).
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Default for StudyVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl TryFrom<u32> for StudyVersion {
    type Error = StudyError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StudyVersion> for u32 {
    fn from(version: StudyVersion) -> Self {
        version.0
    }
}

impl std::fmt::Display for StudyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.0 / 100, (self.0 % 100) / 10)
    }
}
