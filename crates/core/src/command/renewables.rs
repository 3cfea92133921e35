// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{decode, delete_if_exists, object, save};
use super::raw::UpdateConfig;
use super::thermal::{cluster_section, is_enabled};
use super::{Command, CommandOps};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{
    ClusterRef, EnrModelling, FileStudy, StudyTree, StudyVersion, transform_name_to_id,
    validate_name,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Creates a renewable cluster in an area.
///
/// Only valid when the study models renewables as clusters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateRenewablesCluster {
    area_id: String,
    cluster_name: String,
    #[serde(default)]
    parameters: Map<String, Value>,
}

impl CreateRenewablesCluster {
    /// Builds the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster name contains forbidden characters.
    pub fn new(
        area_id: &str,
        cluster_name: &str,
        parameters: Map<String, Value>,
    ) -> Result<Self, CommandError> {
        validate_name("renewable cluster", cluster_name)?;
        Ok(Self {
            area_id: area_id.to_string(),
            cluster_name: cluster_name.to_string(),
            parameters,
        })
    }

    /// The area holding the cluster.
    #[must_use]
    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    /// The cluster id derived from its name.
    #[must_use]
    pub fn cluster_id(&self) -> String {
        transform_name_to_id(&self.cluster_name, true)
    }

    fn list_path(&self) -> String {
        format!(
            "input/renewables/clusters/{}/list/{}",
            self.area_id,
            self.cluster_id()
        )
    }
}

impl CommandOps for CreateRenewablesCluster {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: Self = decode(CommandName::CreateRenewablesCluster, args)?;
        validate_name("renewable cluster", &raw.cluster_name)?;
        Ok(raw)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "area_id": self.area_id,
            "cluster_name": self.cluster_name,
            "parameters": self.parameters,
        }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.area_id.clone(), self.cluster_id()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        if study.config.enr_modelling != EnrModelling::Clusters {
            return Ok(CommandOutput::failure(format!(
                "Renewable clusters require the 'clusters' renewable generation modelling, study uses '{}'",
                study.config.enr_modelling.as_str()
            )));
        }

        let cluster_id: String = self.cluster_id();
        let Some(area) = study.config.areas.get(&self.area_id) else {
            return Ok(CommandOutput::failure(format!(
                "Area '{}' does not exist",
                self.area_id
            )));
        };
        if area.has_renewable(&cluster_id) {
            return Ok(CommandOutput::failure(format!(
                "Renewable cluster '{cluster_id}' already exists in the area '{}'",
                self.area_id
            )));
        }

        let tree: &mut dyn StudyTree = study.tree.as_mut();
        save(
            tree,
            cluster_section(&self.cluster_name, &self.parameters),
            &self.list_path(),
        )?;
        save(
            tree,
            Value::String(ctx.constants().null_matrix.link()),
            &format!(
                "input/renewables/series/{}/{cluster_id}/series",
                self.area_id
            ),
        )?;

        if let Some(area) = study.config.areas.get_mut(&self.area_id) {
            area.renewables.push(ClusterRef::new(
                &cluster_id,
                &self.cluster_name,
                is_enabled(&self.parameters),
            ));
        }

        Ok(CommandOutput::success(format!(
            "Renewable cluster '{cluster_id}' added to area '{}'",
            self.area_id
        )))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        if self == other {
            return Vec::new();
        }
        vec![
            UpdateConfig::new(
                &other.list_path(),
                cluster_section(&other.cluster_name, &other.parameters),
            )
            .into(),
        ]
    }
}

/// Removes a renewable cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveRenewablesCluster {
    area_id: String,
    cluster_id: String,
}

impl RemoveRenewablesCluster {
    /// Builds the command.
    #[must_use]
    pub fn new(area_id: &str, cluster_id: &str) -> Self {
        Self {
            area_id: area_id.to_string(),
            cluster_id: cluster_id.to_string(),
        }
    }

    /// The area holding the cluster.
    #[must_use]
    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    /// The cluster id.
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }
}

impl CommandOps for RemoveRenewablesCluster {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::RemoveRenewablesCluster, args)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "area_id": self.area_id, "cluster_id": self.cluster_id }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.area_id.clone(), self.cluster_id.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let (area_id, cluster_id): (&str, &str) = (&self.area_id, &self.cluster_id);
        let Some(area) = study.config.areas.get(area_id) else {
            return Ok(CommandOutput::failure(format!(
                "Area '{area_id}' does not exist"
            )));
        };
        if !area.has_renewable(cluster_id) {
            return Ok(CommandOutput::failure(format!(
                "Renewable cluster '{cluster_id}' does not exist in the area '{area_id}'"
            )));
        }

        let tree: &mut dyn StudyTree = study.tree.as_mut();
        delete_if_exists(
            tree,
            &format!("input/renewables/clusters/{area_id}/list/{cluster_id}"),
        )?;
        delete_if_exists(
            tree,
            &format!("input/renewables/series/{area_id}/{cluster_id}"),
        )?;

        if let Some(area) = study.config.areas.get_mut(area_id) {
            area.renewables.retain(|c| c.id != cluster_id);
        }

        Ok(CommandOutput::success(format!(
            "Renewable cluster '{cluster_id}' removed from area '{area_id}'"
        )))
    }

    fn create_diff(
        &self,
        _other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        Vec::new()
    }
}
