// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{decode, delete_if_exists, object, save};
use super::raw::UpdateConfig;
use super::thermal::is_enabled;
use super::validation::{MatrixInput, check_exact_shape, resolve_matrix_with};
use super::{Command, CommandOps, ReplaceMatrix};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{
    ClusterRef, FileStudy, MatrixConstants, MatrixRef, StudyTree, StudyVersion,
    transform_name_to_id, validate_name,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

const HOURS_IN_YEAR: usize = 8760;

/// Names of the series of a short-term storage, with their defaults.
pub(crate) fn st_storage_defaults(constants: &MatrixConstants) -> [(&'static str, MatrixRef); 5] {
    [
        ("pmax_injection", constants.st_storage_pmax.clone()),
        ("pmax_withdrawal", constants.st_storage_pmax.clone()),
        ("lower_rule_curve", constants.st_storage_lower_rule_curve.clone()),
        ("upper_rule_curve", constants.st_storage_upper_rule_curve.clone()),
        ("inflows", constants.st_storage_inflows.clone()),
    ]
}

#[derive(Debug, Deserialize)]
struct CreateStStorageArgs {
    area_id: String,
    parameters: Map<String, Value>,
    #[serde(default)]
    pmax_injection: Option<MatrixInput>,
    #[serde(default)]
    pmax_withdrawal: Option<MatrixInput>,
    #[serde(default)]
    lower_rule_curve: Option<MatrixInput>,
    #[serde(default)]
    upper_rule_curve: Option<MatrixInput>,
    #[serde(default)]
    inflows: Option<MatrixInput>,
}

/// Creates a short-term storage in an area.
///
/// Every series is resolved when the command is built; absent series use the
/// default matrices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStStorage {
    area_id: String,
    parameters: Map<String, Value>,
    pmax_injection: MatrixRef,
    pmax_withdrawal: MatrixRef,
    lower_rule_curve: MatrixRef,
    upper_rule_curve: MatrixRef,
    inflows: MatrixRef,
}

fn storage_name(parameters: &Map<String, Value>) -> Result<String, CommandError> {
    let name: &str = parameters
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CommandError::validation(
                CommandName::CreateStStorage.as_str(),
                "the parameters must contain a 'name'",
            )
        })?;
    validate_name("short-term storage", name)?;
    Ok(name.to_string())
}

fn resolve_series(
    input: Option<MatrixInput>,
    default: &MatrixRef,
    ctx: &CommandContext,
) -> Result<MatrixRef, CommandError> {
    input.map_or_else(
        || Ok(default.clone()),
        |m| resolve_matrix_with(m, ctx, |data| check_exact_shape(data, HOURS_IN_YEAR, 1)),
    )
}

impl CreateStStorage {
    /// Builds the command with default series.
    ///
    /// # Errors
    ///
    /// Returns an error if `parameters` has no valid `name`.
    pub fn new(
        area_id: &str,
        parameters: Map<String, Value>,
        ctx: &CommandContext,
    ) -> Result<Self, CommandError> {
        storage_name(&parameters)?;
        let constants: &MatrixConstants = ctx.constants();
        Ok(Self {
            area_id: area_id.to_string(),
            parameters,
            pmax_injection: constants.st_storage_pmax.clone(),
            pmax_withdrawal: constants.st_storage_pmax.clone(),
            lower_rule_curve: constants.st_storage_lower_rule_curve.clone(),
            upper_rule_curve: constants.st_storage_upper_rule_curve.clone(),
            inflows: constants.st_storage_inflows.clone(),
        })
    }

    /// Replaces one series by name. Unknown names are ignored.
    #[must_use]
    pub fn with_series(mut self, name: &str, reference: MatrixRef) -> Self {
        match name {
            "pmax_injection" => self.pmax_injection = reference,
            "pmax_withdrawal" => self.pmax_withdrawal = reference,
            "lower_rule_curve" => self.lower_rule_curve = reference,
            "upper_rule_curve" => self.upper_rule_curve = reference,
            "inflows" => self.inflows = reference,
            _ => {}
        }
        self
    }

    /// The area holding the storage.
    #[must_use]
    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    /// The storage name from its parameters.
    #[must_use]
    pub fn storage_name(&self) -> String {
        self.parameters
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// The storage id derived from its name.
    #[must_use]
    pub fn storage_id(&self) -> String {
        transform_name_to_id(&self.storage_name(), true)
    }

    fn series(&self) -> [(&'static str, &MatrixRef); 5] {
        [
            ("pmax_injection", &self.pmax_injection),
            ("pmax_withdrawal", &self.pmax_withdrawal),
            ("lower_rule_curve", &self.lower_rule_curve),
            ("upper_rule_curve", &self.upper_rule_curve),
            ("inflows", &self.inflows),
        ]
    }

    fn list_path(&self) -> String {
        format!(
            "input/st-storage/clusters/{}/list/{}",
            self.area_id,
            self.storage_id()
        )
    }

    fn series_path(&self, name: &str) -> String {
        format!(
            "input/st-storage/series/{}/{}/{name}",
            self.area_id,
            self.storage_id()
        )
    }
}

impl CommandOps for CreateStStorage {
    fn from_args(args: Map<String, Value>, ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: CreateStStorageArgs = decode(CommandName::CreateStStorage, args)?;
        let constants: &MatrixConstants = ctx.constants();
        storage_name(&raw.parameters)?;
        Ok(Self {
            pmax_injection: resolve_series(raw.pmax_injection, &constants.st_storage_pmax, ctx)?,
            pmax_withdrawal: resolve_series(raw.pmax_withdrawal, &constants.st_storage_pmax, ctx)?,
            lower_rule_curve: resolve_series(
                raw.lower_rule_curve,
                &constants.st_storage_lower_rule_curve,
                ctx,
            )?,
            upper_rule_curve: resolve_series(
                raw.upper_rule_curve,
                &constants.st_storage_upper_rule_curve,
                ctx,
            )?,
            inflows: resolve_series(raw.inflows, &constants.st_storage_inflows, ctx)?,
            area_id: raw.area_id,
            parameters: raw.parameters,
        })
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "area_id": self.area_id,
            "parameters": self.parameters,
            "pmax_injection": self.pmax_injection,
            "pmax_withdrawal": self.pmax_withdrawal,
            "lower_rule_curve": self.lower_rule_curve,
            "upper_rule_curve": self.upper_rule_curve,
            "inflows": self.inflows,
        }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.area_id.clone(), self.storage_id()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let version: StudyVersion = study.version();
        if version < StudyVersion::V8_6 {
            return Ok(CommandOutput::failure(format!(
                "Short-term storages require version 8.6 or later, study is {version}"
            )));
        }

        let storage_id: String = self.storage_id();
        let Some(area) = study.config.areas.get(&self.area_id) else {
            return Ok(CommandOutput::failure(format!(
                "Area '{}' does not exist",
                self.area_id
            )));
        };
        if area.has_st_storage(&storage_id) {
            return Ok(CommandOutput::failure(format!(
                "Short-term storage '{storage_id}' already exists in the area '{}'",
                self.area_id
            )));
        }

        let tree: &mut dyn StudyTree = study.tree.as_mut();
        save(
            tree,
            Value::Object(self.parameters.clone()),
            &self.list_path(),
        )?;
        for (name, reference) in self.series() {
            save(tree, Value::String(reference.link()), &self.series_path(name))?;
        }

        if let Some(area) = study.config.areas.get_mut(&self.area_id) {
            area.st_storages.push(ClusterRef::new(
                &storage_id,
                &self.storage_name(),
                is_enabled(&self.parameters),
            ));
        }

        Ok(CommandOutput::success(format!(
            "Short-term storage '{storage_id}' added to area '{}'",
            self.area_id
        )))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        let mut commands: Vec<Command> = Vec::new();
        if self.parameters != other.parameters {
            commands.push(
                UpdateConfig::new(&other.list_path(), Value::Object(other.parameters.clone()))
                    .into(),
            );
        }
        for ((name, mine), (_, theirs)) in self.series().into_iter().zip(other.series()) {
            if mine != theirs {
                commands.push(ReplaceMatrix::new(&other.series_path(name), theirs.clone()).into());
            }
        }
        commands
    }

    fn inner_matrices(&self) -> Vec<String> {
        self.series()
            .iter()
            .map(|(_, reference)| reference.id().to_string())
            .collect()
    }
}

/// Removes a short-term storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveStStorage {
    area_id: String,
    storage_id: String,
}

impl RemoveStStorage {
    /// Builds the command.
    #[must_use]
    pub fn new(area_id: &str, storage_id: &str) -> Self {
        Self {
            area_id: area_id.to_string(),
            storage_id: storage_id.to_string(),
        }
    }

    /// The area holding the storage.
    #[must_use]
    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    /// The storage id.
    #[must_use]
    pub fn storage_id(&self) -> &str {
        &self.storage_id
    }
}

impl CommandOps for RemoveStStorage {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::RemoveStStorage, args)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "area_id": self.area_id, "storage_id": self.storage_id }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.area_id.clone(), self.storage_id.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let version: StudyVersion = study.version();
        if version < StudyVersion::V8_6 {
            return Ok(CommandOutput::failure(format!(
                "Short-term storages require version 8.6 or later, study is {version}"
            )));
        }

        let (area_id, storage_id): (&str, &str) = (&self.area_id, &self.storage_id);
        let Some(area) = study.config.areas.get(area_id) else {
            return Ok(CommandOutput::failure(format!(
                "Area '{area_id}' does not exist"
            )));
        };
        if !area.has_st_storage(storage_id) {
            return Ok(CommandOutput::failure(format!(
                "Short-term storage '{storage_id}' does not exist in the area '{area_id}'"
            )));
        }

        let tree: &mut dyn StudyTree = study.tree.as_mut();
        delete_if_exists(
            tree,
            &format!("input/st-storage/clusters/{area_id}/list/{storage_id}"),
        )?;
        delete_if_exists(
            tree,
            &format!("input/st-storage/series/{area_id}/{storage_id}"),
        )?;

        if let Some(area) = study.config.areas.get_mut(area_id) {
            area.st_storages.retain(|c| c.id != storage_id);
        }

        Ok(CommandOutput::success(format!(
            "Short-term storage '{storage_id}' removed from area '{area_id}'"
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
