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

//! The variant command engine.
//!
//! A variant study is a base study plus an ordered list of [`Command`]s. This
//! crate builds commands from their persisted [`CommandDto`] form, applies
//! them, rebuilds them from a study ([`CommandExtractor`]), computes their
//! inverse ([`CommandReverter`]) and diffs two command lists
//! ([`VariantCommandsExtractor`]).

mod command;
mod context;
mod diff;
mod dto;
mod error;
mod extractor;
mod factory;
mod generator;
mod output;
mod reverter;

#[cfg(test)]
mod tests;

pub use command::{
    BindingConstraintOperator, BindingConstraintProperties, COMMAND_VERSION, Command,
    ConstraintMatrixInputs, CreateArea, CreateBindingConstraint, CreateCluster, CreateDistrict, CreateLink, CreateRenewablesCluster,
    CreateStStorage, DistrictBaseFilter, MATCH_SIGNATURE_SEPARATOR, MatrixInput, RemoveArea,
    RemoveBindingConstraint, RemoveCluster, RemoveDistrict, RemoveLink, RemoveRenewablesCluster,
    RemoveStStorage, ReplaceMatrix, UpdateBindingConstraint, UpdateComments, UpdateConfig,
    UpdateDistrict, UpdatePlaylist, UpdateRawFile, UpdateScenarioBuilder,
};
pub use context::CommandContext;
pub use diff::VariantCommandsExtractor;
pub use dto::{CommandArgs, CommandDto, CommandName};
pub use error::CommandError;
pub use extractor::CommandExtractor;
pub use factory::CommandFactory;
pub use generator::{CommandResultDetail, FailurePolicy, GenerationResult, VariantCommandGenerator};
pub use output::CommandOutput;
pub use reverter::CommandReverter;
