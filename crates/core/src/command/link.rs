// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{
    all_filters, decode, delete_if_exists, object, parse_filters, remove_binding_constraints,
    save, sorted_pair,
};
use super::raw::UpdateConfig;
use super::validation::{MatrixInput, resolve_optional};
use super::{Command, CommandOps, ReplaceMatrix};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{FileStudy, Link, MatrixConstants, MatrixRef, StudyTree, StudyVersion};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Default properties of a link section.
pub(crate) fn default_link_properties() -> Map<String, Value> {
    object(json!({
        "hurdles-cost": false,
        "loop-flow": false,
        "use-phase-shifter": false,
        "transmission-capacities": "enabled",
        "asset-type": "ac",
        "link-style": "plain",
        "link-width": 1,
        "colorr": 112,
        "colorg": 112,
        "colorb": 112,
        "display-comments": true,
        "filter-synthesis": all_filters(),
        "filter-year-by-year": all_filters(),
    }))
}

/// The link properties with `parameters` merged over the defaults.
pub(crate) fn link_properties(parameters: &Map<String, Value>) -> Map<String, Value> {
    let mut properties: Map<String, Value> = default_link_properties();
    for (key, value) in parameters {
        properties.insert(key.clone(), value.clone());
    }
    properties
}

/// Which link matrix a path holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkMatrix {
    Series,
    Direct,
    Indirect,
}

/// Tree paths of the matrices of a link, with their defaults.
pub(crate) fn link_matrix_paths(
    version: StudyVersion,
    area1: &str,
    area2: &str,
    constants: &MatrixConstants,
) -> Vec<(LinkMatrix, String, MatrixRef)> {
    if version < StudyVersion::V8_2 {
        vec![(
            LinkMatrix::Series,
            format!("input/links/{area1}/{area2}"),
            constants.link_v7.clone(),
        )]
    } else {
        vec![
            (
                LinkMatrix::Series,
                format!("input/links/{area1}/{area2}_parameters"),
                constants.link_v8.clone(),
            ),
            (
                LinkMatrix::Direct,
                format!("input/links/{area1}/capacities/{area2}_direct"),
                constants.link_capacity.clone(),
            ),
            (
                LinkMatrix::Indirect,
                format!("input/links/{area1}/capacities/{area2}_indirect"),
                constants.link_capacity.clone(),
            ),
        ]
    }
}

/// Deletes the properties and matrices of a link, whatever the version.
pub(crate) fn delete_link_files(
    tree: &mut dyn StudyTree,
    area1: &str,
    area2: &str,
) -> Result<(), CommandError> {
    for path in [
        format!("input/links/{area1}/properties/{area2}"),
        format!("input/links/{area1}/{area2}"),
        format!("input/links/{area1}/{area2}_parameters"),
        format!("input/links/{area1}/capacities/{area2}_direct"),
        format!("input/links/{area1}/capacities/{area2}_indirect"),
    ] {
        delete_if_exists(tree, &path)?;
    }
    Ok(())
}

fn filters(properties: &Map<String, Value>, key: &str) -> Vec<String> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .map_or_else(|| parse_filters(&all_filters()), parse_filters)
}

#[derive(Debug, Deserialize)]
struct CreateLinkArgs {
    area1: String,
    area2: String,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
    #[serde(default)]
    series: Option<MatrixInput>,
    #[serde(default)]
    direct: Option<MatrixInput>,
    #[serde(default)]
    indirect: Option<MatrixInput>,
}

/// Creates a link between two areas.
///
/// The areas are stored in alphabetical order: `fr`/`de` and `de`/`fr` are the
/// same link, owned by `de`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateLink {
    area1: String,
    area2: String,
    parameters: Map<String, Value>,
    series: Option<MatrixRef>,
    direct: Option<MatrixRef>,
    indirect: Option<MatrixRef>,
}

impl CreateLink {
    /// Builds a link with default properties and matrices.
    #[must_use]
    pub fn new(area1: &str, area2: &str) -> Self {
        let (area1, area2): (String, String) = sorted_pair(area1, area2);
        Self {
            area1,
            area2,
            parameters: Map::new(),
            series: None,
            direct: None,
            indirect: None,
        }
    }

    /// Replaces the link properties overriding the defaults.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Sets the link parameters matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is invalid.
    pub fn with_series(
        mut self,
        series: MatrixInput,
        ctx: &CommandContext,
    ) -> Result<Self, CommandError> {
        self.series = resolve_optional(Some(series), ctx)?;
        Ok(self)
    }

    /// The alphabetically first area.
    #[must_use]
    pub fn area1(&self) -> &str {
        &self.area1
    }

    /// The alphabetically second area.
    #[must_use]
    pub fn area2(&self) -> &str {
        &self.area2
    }

    /// The user-supplied properties.
    #[must_use]
    pub const fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    fn matrix(&self, kind: LinkMatrix) -> Option<&MatrixRef> {
        match kind {
            LinkMatrix::Series => self.series.as_ref(),
            LinkMatrix::Direct => self.direct.as_ref(),
            LinkMatrix::Indirect => self.indirect.as_ref(),
        }
    }

    /// Sets one of the link matrices.
    pub(crate) fn set_matrix(&mut self, kind: LinkMatrix, reference: MatrixRef) {
        match kind {
            LinkMatrix::Series => self.series = Some(reference),
            LinkMatrix::Direct => self.direct = Some(reference),
            LinkMatrix::Indirect => self.indirect = Some(reference),
        }
    }
}

impl CommandOps for CreateLink {
    fn from_args(args: Map<String, Value>, ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: CreateLinkArgs = decode(CommandName::CreateLink, args)?;
        let mut command: Self =
            Self::new(&raw.area1, &raw.area2).with_parameters(raw.parameters.unwrap_or_default());
        command.series = resolve_optional(raw.series, ctx)?;
        command.direct = resolve_optional(raw.direct, ctx)?;
        command.indirect = resolve_optional(raw.indirect, ctx)?;
        Ok(command)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "area1": self.area1,
            "area2": self.area2,
            "parameters": self.parameters,
            "series": self.series,
            "direct": self.direct,
            "indirect": self.indirect,
        }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.area1.clone(), self.area2.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let (area1, area2): (&str, &str) = (&self.area1, &self.area2);
        let version: StudyVersion = study.version();

        if area1 == area2 {
            return Ok(CommandOutput::failure(format!(
                "Cannot create a link that goes from and to the same area: '{area1}'"
            )));
        }
        for area in [area1, area2] {
            if !study.config.areas.contains_key(area) {
                return Ok(CommandOutput::failure(format!(
                    "The area '{area}' does not exist"
                )));
            }
        }
        if study.config.has_link(area1, area2) {
            return Ok(CommandOutput::failure(format!(
                "Link between '{area1}' and '{area2}' already exists"
            )));
        }
        if version < StudyVersion::V8_2 && (self.direct.is_some() || self.indirect.is_some()) {
            return Ok(CommandOutput::failure(format!(
                "Direct and indirect capacities require version 8.2 or later, study is {version}"
            )));
        }

        let properties: Map<String, Value> = link_properties(&self.parameters);
        let link: Link = Link {
            filters_synthesis: filters(&properties, "filter-synthesis"),
            filters_year: filters(&properties, "filter-year-by-year"),
        };
        save(
            study.tree.as_mut(),
            Value::Object(properties),
            &format!("input/links/{area1}/properties/{area2}"),
        )?;

        for (kind, path, default) in link_matrix_paths(version, area1, area2, ctx.constants()) {
            let reference: &MatrixRef = self.matrix(kind).unwrap_or(&default);
            save(study.tree.as_mut(), Value::String(reference.link()), &path)?;
        }

        if let Some(owner) = study.config.areas.get_mut(area1) {
            owner.links.insert(area2.to_string(), link);
        }

        Ok(CommandOutput::success(format!(
            "Link between '{area1}' and '{area2}' created"
        )))
    }

    fn create_diff(
        &self,
        other: &Self,
        version: StudyVersion,
        ctx: &CommandContext,
    ) -> Vec<Command> {
        let mut commands: Vec<Command> = Vec::new();
        if self.parameters != other.parameters {
            commands.push(
                UpdateConfig::new(
                    &format!("input/links/{}/properties/{}", other.area1, other.area2),
                    Value::Object(link_properties(&other.parameters)),
                )
                .into(),
            );
        }
        for (kind, path, default) in
            link_matrix_paths(version, &other.area1, &other.area2, ctx.constants())
        {
            if self.matrix(kind) != other.matrix(kind) {
                let target: MatrixRef = other.matrix(kind).cloned().unwrap_or(default);
                commands.push(ReplaceMatrix::new(&path, target).into());
            }
        }
        commands
    }

    fn inner_matrices(&self) -> Vec<String> {
        [&self.series, &self.direct, &self.indirect]
            .into_iter()
            .flatten()
            .map(|m| m.id().to_string())
            .collect()
    }
}

/// Removes a link and the binding constraints referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLink {
    area1: String,
    area2: String,
}

#[derive(Debug, Deserialize)]
struct RemoveLinkArgs {
    area1: String,
    area2: String,
}

impl RemoveLink {
    /// Builds the command; the areas are sorted.
    #[must_use]
    pub fn new(area1: &str, area2: &str) -> Self {
        let (area1, area2): (String, String) = sorted_pair(area1, area2);
        Self { area1, area2 }
    }

    /// The alphabetically first area.
    #[must_use]
    pub fn area1(&self) -> &str {
        &self.area1
    }

    /// The alphabetically second area.
    #[must_use]
    pub fn area2(&self) -> &str {
        &self.area2
    }
}

impl CommandOps for RemoveLink {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: RemoveLinkArgs = decode(CommandName::RemoveLink, args)?;
        Ok(Self::new(&raw.area1, &raw.area2))
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "area1": self.area1, "area2": self.area2 }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.area1.clone(), self.area2.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let (area1, area2): (&str, &str) = (&self.area1, &self.area2);

        for area in [area1, area2] {
            if !study.config.areas.contains_key(area) {
                return Ok(CommandOutput::failure(format!(
                    "The area '{area}' does not exist"
                )));
            }
        }
        if !study.config.has_link(area1, area2) {
            return Ok(CommandOutput::failure(format!(
                "Link between '{area1}' and '{area2}' does not exist"
            )));
        }

        let constraints: Vec<String> = study.config.bindings_referencing_link(area1, area2);
        remove_binding_constraints(study, &constraints)?;
        delete_link_files(study.tree.as_mut(), area1, area2)?;
        if let Some(owner) = study.config.areas.get_mut(area1) {
            owner.links.remove(area2);
        }

        Ok(CommandOutput::success(format!(
            "Link between '{area1}' and '{area2}' removed"
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
