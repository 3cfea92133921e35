// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{decode, delete_if_exists, object, remove_binding_constraints, save};
use super::raw::UpdateConfig;
use super::validation::{MatrixInput, resolve_optional};
use super::{Command, CommandOps, ReplaceMatrix};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{
    ClusterRef, FileStudy, MatrixRef, StudyTree, StudyVersion, transform_name_to_id,
    validate_name,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// The ini section of a cluster: its name followed by the user parameters.
pub(crate) fn cluster_section(name: &str, parameters: &Map<String, Value>) -> Value {
    let mut section: Map<String, Value> = parameters.clone();
    section.insert("name".to_string(), Value::String(name.to_string()));
    Value::Object(section)
}

/// The `enabled` flag of a cluster section, `true` when absent.
pub(crate) fn is_enabled(parameters: &Map<String, Value>) -> bool {
    parameters
        .get("enabled")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

#[derive(Debug, Deserialize)]
struct CreateClusterArgs {
    area_id: String,
    cluster_name: String,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default)]
    prepro: Option<MatrixInput>,
    #[serde(default)]
    modulation: Option<MatrixInput>,
}

/// Creates a thermal cluster in an area.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCluster {
    area_id: String,
    cluster_name: String,
    parameters: Map<String, Value>,
    prepro: Option<MatrixRef>,
    modulation: Option<MatrixRef>,
}

impl CreateCluster {
    /// Builds the command with default prepro and modulation matrices.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster name contains forbidden characters.
    pub fn new(
        area_id: &str,
        cluster_name: &str,
        parameters: Map<String, Value>,
    ) -> Result<Self, CommandError> {
        validate_name("cluster", cluster_name)?;
        Ok(Self {
            area_id: area_id.to_string(),
            cluster_name: cluster_name.to_string(),
            parameters,
            prepro: None,
            modulation: None,
        })
    }

    /// Sets the prepro and modulation matrices.
    #[must_use]
    pub fn with_matrices(mut self, prepro: Option<MatrixRef>, modulation: Option<MatrixRef>) -> Self {
        self.prepro = prepro;
        self.modulation = modulation;
        self
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
            "input/thermal/clusters/{}/list/{}",
            self.area_id,
            self.cluster_id()
        )
    }

    fn prepro_path(&self, name: &str) -> String {
        format!(
            "input/thermal/prepro/{}/{}/{name}",
            self.area_id,
            self.cluster_id()
        )
    }
}

impl CommandOps for CreateCluster {
    fn from_args(args: Map<String, Value>, ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: CreateClusterArgs = decode(CommandName::CreateCluster, args)?;
        let prepro: Option<MatrixRef> = resolve_optional(raw.prepro, ctx)?;
        let modulation: Option<MatrixRef> = resolve_optional(raw.modulation, ctx)?;
        Ok(Self::new(&raw.area_id, &raw.cluster_name, raw.parameters)?
            .with_matrices(prepro, modulation))
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "area_id": self.area_id,
            "cluster_name": self.cluster_name,
            "parameters": self.parameters,
            "prepro": self.prepro,
            "modulation": self.modulation,
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
        let cluster_id: String = self.cluster_id();
        let Some(area) = study.config.areas.get(&self.area_id) else {
            return Ok(CommandOutput::failure(format!(
                "Area '{}' does not exist",
                self.area_id
            )));
        };
        if area.has_thermal(&cluster_id) {
            return Ok(CommandOutput::failure(format!(
                "Thermal cluster '{cluster_id}' already exists in the area '{}'",
                self.area_id
            )));
        }

        let prepro: &MatrixRef = self
            .prepro
            .as_ref()
            .unwrap_or(&ctx.constants().thermal_prepro_data);
        let modulation: &MatrixRef = self
            .modulation
            .as_ref()
            .unwrap_or(&ctx.constants().thermal_prepro_modulation);

        let tree: &mut dyn StudyTree = study.tree.as_mut();
        save(
            tree,
            cluster_section(&self.cluster_name, &self.parameters),
            &self.list_path(),
        )?;
        save(tree, Value::String(prepro.link()), &self.prepro_path("data"))?;
        save(
            tree,
            Value::String(modulation.link()),
            &self.prepro_path("modulation"),
        )?;
        save(
            tree,
            Value::String(ctx.constants().null_matrix.link()),
            &format!(
                "input/thermal/series/{}/{cluster_id}/series",
                self.area_id
            ),
        )?;

        if let Some(area) = study.config.areas.get_mut(&self.area_id) {
            area.thermals.push(ClusterRef::new(
                &cluster_id,
                &self.cluster_name,
                is_enabled(&self.parameters),
            ));
        }

        Ok(CommandOutput::success(format!(
            "Thermal cluster '{cluster_id}' added to area '{}'",
            self.area_id
        )))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        ctx: &CommandContext,
    ) -> Vec<Command> {
        let mut commands: Vec<Command> = Vec::new();
        if self.cluster_name != other.cluster_name || self.parameters != other.parameters {
            commands.push(
                UpdateConfig::new(
                    &other.list_path(),
                    cluster_section(&other.cluster_name, &other.parameters),
                )
                .into(),
            );
        }
        if self.prepro != other.prepro {
            let matrix: MatrixRef = other
                .prepro
                .clone()
                .unwrap_or_else(|| ctx.constants().thermal_prepro_data.clone());
            commands.push(ReplaceMatrix::new(&other.prepro_path("data"), matrix).into());
        }
        if self.modulation != other.modulation {
            let matrix: MatrixRef = other
                .modulation
                .clone()
                .unwrap_or_else(|| ctx.constants().thermal_prepro_modulation.clone());
            commands.push(ReplaceMatrix::new(&other.prepro_path("modulation"), matrix).into());
        }
        commands
    }

    fn inner_matrices(&self) -> Vec<String> {
        [&self.prepro, &self.modulation]
            .into_iter()
            .flatten()
            .map(|m| m.id().to_string())
            .collect()
    }
}

/// Removes a thermal cluster and the binding constraints referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveCluster {
    area_id: String,
    cluster_id: String,
}

impl RemoveCluster {
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

impl CommandOps for RemoveCluster {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::RemoveCluster, args)
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
        if !area.has_thermal(cluster_id) {
            return Ok(CommandOutput::failure(format!(
                "Thermal cluster '{cluster_id}' does not exist in the area '{area_id}'"
            )));
        }

        let constraints: Vec<String> = study
            .config
            .bindings_referencing_cluster(area_id, cluster_id);
        remove_binding_constraints(study, &constraints)?;

        let tree: &mut dyn StudyTree = study.tree.as_mut();
        delete_if_exists(
            tree,
            &format!("input/thermal/clusters/{area_id}/list/{cluster_id}"),
        )?;
        delete_if_exists(tree, &format!("input/thermal/prepro/{area_id}/{cluster_id}"))?;
        delete_if_exists(tree, &format!("input/thermal/series/{area_id}/{cluster_id}"))?;

        if let Some(area) = study.config.areas.get_mut(area_id) {
            area.thermals.retain(|c| c.id != cluster_id);
        }

        Ok(CommandOutput::success(format!(
            "Thermal cluster '{cluster_id}' removed from area '{area_id}'"
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
