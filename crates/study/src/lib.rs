// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod config;
mod constants;
mod error;
mod matrix;
mod naming;
mod study;
mod tree;
mod version;

#[cfg(test)]
mod tests;

pub use config::{
    ALL_FILTERING, Area, BindingConstraintFrequency, BindingConstraintSummary, ClusterRef,
    DistrictSet, EnrModelling, Link, StudyConfig,
};
pub use constants::MatrixConstants;
pub use error::{MatrixError, StudyError, TreeError};
pub use matrix::{
    InMemoryMatrixService, MATRIX_PROTOCOL_PREFIX, Matrix, MatrixRef, MatrixService, content_id,
};
pub use naming::{is_valid_name, transform_name_to_id, validate_name};
pub use study::FileStudy;
pub use tree::{JsonTree, StudyTree, url};
pub use version::StudyVersion;
