// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CommandError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// The closed set of command kinds.
///
/// The string tags are persisted in variant histories and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandName {
    CreateArea,
    RemoveArea,
    CreateDistrict,
    RemoveDistrict,
    UpdateDistrict,
    CreateLink,
    RemoveLink,
    CreateBindingConstraint,
    UpdateBindingConstraint,
    RemoveBindingConstraint,
    CreateCluster,
    RemoveCluster,
    CreateRenewablesCluster,
    RemoveRenewablesCluster,
    CreateStStorage,
    RemoveStStorage,
    ReplaceMatrix,
    UpdateConfig,
    UpdateComments,
    UpdateRawFile,
    UpdatePlaylist,
    UpdateScenarioBuilder,
}

impl CommandName {
    /// Every command kind.
    pub const ALL: [Self; 22] = [
        Self::CreateArea,
        Self::RemoveArea,
        Self::CreateDistrict,
        Self::RemoveDistrict,
        Self::UpdateDistrict,
        Self::CreateLink,
        Self::RemoveLink,
        Self::CreateBindingConstraint,
        Self::UpdateBindingConstraint,
        Self::RemoveBindingConstraint,
        Self::CreateCluster,
        Self::RemoveCluster,
        Self::CreateRenewablesCluster,
        Self::RemoveRenewablesCluster,
        Self::CreateStStorage,
        Self::RemoveStStorage,
        Self::ReplaceMatrix,
        Self::UpdateConfig,
        Self::UpdateComments,
        Self::UpdateRawFile,
        Self::UpdatePlaylist,
        Self::UpdateScenarioBuilder,
    ];

    /// The persisted action tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateArea => "create_area",
            Self::RemoveArea => "remove_area",
            Self::CreateDistrict => "create_district",
            Self::RemoveDistrict => "remove_district",
            Self::UpdateDistrict => "update_district",
            Self::CreateLink => "create_link",
            Self::RemoveLink => "remove_link",
            Self::CreateBindingConstraint => "create_binding_constraint",
            Self::UpdateBindingConstraint => "update_binding_constraint",
            Self::RemoveBindingConstraint => "remove_binding_constraint",
            Self::CreateCluster => "create_cluster",
            Self::RemoveCluster => "remove_cluster",
            Self::CreateRenewablesCluster => "create_renewables_cluster",
            Self::RemoveRenewablesCluster => "remove_renewables_cluster",
            Self::CreateStStorage => "create_st_storage",
            Self::RemoveStStorage => "remove_st_storage",
            Self::ReplaceMatrix => "replace_matrix",
            Self::UpdateConfig => "update_config",
            Self::UpdateComments => "update_comments",
            Self::UpdateRawFile => "update_file",
            Self::UpdatePlaylist => "update_playlist",
            Self::UpdateScenarioBuilder => "update_scenario_builder",
        }
    }

    /// Whether the command brings a new entity into the study.
    ///
    /// The diff engine schedules these after every removal and structural update.
    #[must_use]
    pub const fn is_creation(&self) -> bool {
        matches!(
            self,
            Self::CreateArea
                | Self::CreateDistrict
                | Self::CreateLink
                | Self::CreateBindingConstraint
                | Self::CreateCluster
                | Self::CreateRenewablesCluster
                | Self::CreateStStorage
        )
    }
}

impl FromStr for CommandName {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|name| name.as_str() == s)
            .copied()
            .ok_or_else(|| CommandError::NotImplemented(s.to_string()))
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arguments of a DTO: one mapping, or a batch of mappings producing one command each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArgs {
    Single(Map<String, Value>),
    Batch(Vec<Map<String, Value>>),
}

impl CommandArgs {
    /// Returns the mappings in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Map<String, Value>> {
        match self {
            Self::Single(args) => vec![args],
            Self::Batch(batch) => batch,
        }
    }
}

fn default_version() -> u32 {
    1
}

/// The persisted form of a command: `{"action", "args", "version"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDto {
    pub action: String,
    pub args: CommandArgs,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl CommandDto {
    /// Creates a single-command DTO.
    #[must_use]
    pub fn new(action: CommandName, args: Map<String, Value>, version: u32) -> Self {
        Self {
            action: action.as_str().to_string(),
            args: CommandArgs::Single(args),
            version,
        }
    }
}
