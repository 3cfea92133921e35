// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Binding constraint commands.
//!
//! A constraint is a section of the `bindingconstraints` index (keyed by its
//! position, not its id) plus its second-member matrices: one stacked
//! `(rows, 3)` matrix named after the id before 8.7, and one matrix per
//! operator side (`<id>_lt`, `<id>_eq`, `<id>_gt`) from 8.7.

use super::common::{
    all_filters, decode, delete_if_exists, object, read_constraint_sections,
    remove_binding_constraints, save, section_id, sorted_pair, write_constraint_sections,
};
use super::validation::{MatrixInput, check_exact_shape, check_rows, resolve_matrix_with};
use super::{Command, CommandOps};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{
    BindingConstraintFrequency, BindingConstraintSummary, FileStudy, MatrixConstants, MatrixRef,
    StudyConfig, StudyTree, StudyVersion, transform_name_to_id, validate_name,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// The comparison applied by a binding constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingConstraintOperator {
    Less,
    Greater,
    Both,
    Equal,
}

impl BindingConstraintOperator {
    /// The ini value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Less => "less",
            Self::Greater => "greater",
            Self::Both => "both",
            Self::Equal => "equal",
        }
    }

    /// Parses an ini value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "less" => Some(Self::Less),
            "greater" => Some(Self::Greater),
            "both" => Some(Self::Both),
            "equal" => Some(Self::Equal),
            _ => None,
        }
    }

    /// Suffixes of the term matrices used from 8.7.
    #[must_use]
    pub const fn matrix_suffixes(&self) -> &'static [&'static str] {
        match self {
            Self::Less => &["_lt"],
            Self::Greater => &["_gt"],
            Self::Both => &["_lt", "_gt"],
            Self::Equal => &["_eq"],
        }
    }
}

/// Scalar properties of a binding constraint. `None` means "unset" on
/// creation (a default applies) and "unchanged" on update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BindingConstraintProperties {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub time_step: Option<BindingConstraintFrequency>,
    #[serde(default)]
    pub operator: Option<BindingConstraintOperator>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub filter_year_by_year: Option<String>,
    #[serde(default)]
    pub filter_synthesis: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl BindingConstraintProperties {
    /// Fills every unset property with its creation default.
    fn with_defaults(&self, version: StudyVersion) -> Self {
        Self {
            enabled: Some(self.enabled.unwrap_or(true)),
            time_step: Some(self.time_step.unwrap_or_default()),
            operator: Some(self.operator.unwrap_or(BindingConstraintOperator::Equal)),
            comments: Some(self.comments.clone().unwrap_or_default()),
            filter_year_by_year: Some(
                self.filter_year_by_year.clone().unwrap_or_else(all_filters),
            ),
            filter_synthesis: Some(self.filter_synthesis.clone().unwrap_or_else(all_filters)),
            group: if version >= StudyVersion::V8_7 {
                Some(self.group.clone().unwrap_or_else(|| "default".to_string()))
            } else {
                None
            },
        }
    }

    /// Writes the set properties into an index section.
    fn write(&self, section: &mut Map<String, Value>, version: StudyVersion) {
        if let Some(enabled) = self.enabled {
            section.insert("enabled".to_string(), json!(enabled));
        }
        if let Some(time_step) = self.time_step {
            section.insert("type".to_string(), json!(time_step.as_str()));
        }
        if let Some(operator) = self.operator {
            section.insert("operator".to_string(), json!(operator.as_str()));
        }
        if let Some(comments) = &self.comments {
            section.insert("comments".to_string(), json!(comments));
        }
        if let Some(filter) = &self.filter_year_by_year {
            section.insert("filter-year-by-year".to_string(), json!(filter));
        }
        if let Some(filter) = &self.filter_synthesis {
            section.insert("filter-synthesis".to_string(), json!(filter));
        }
        if version >= StudyVersion::V8_7
            && let Some(group) = &self.group
        {
            section.insert("group".to_string(), json!(group));
        }
    }

    /// Reads the properties of an index section.
    pub(crate) fn from_section(section: &Map<String, Value>, version: StudyVersion) -> Self {
        let text = |key: &str| section.get(key).and_then(Value::as_str).map(ToString::to_string);
        Self {
            enabled: section.get("enabled").and_then(Value::as_bool),
            time_step: section
                .get("type")
                .and_then(Value::as_str)
                .and_then(BindingConstraintFrequency::parse),
            operator: section
                .get("operator")
                .and_then(Value::as_str)
                .and_then(BindingConstraintOperator::parse),
            comments: text("comments"),
            filter_year_by_year: text("filter-year-by-year"),
            filter_synthesis: text("filter-synthesis"),
            group: if version >= StudyVersion::V8_7 {
                text("group")
            } else {
                None
            },
        }
    }
}

/// Whether an index key is a term (`a%b` link or `area.cluster`).
pub(crate) fn is_term(key: &str) -> bool {
    key.contains('%') || key.contains('.')
}

/// Parses a term value: `w` or `"w%offset"`.
pub(crate) fn parse_term(value: &Value) -> Option<Vec<f64>> {
    match value {
        Value::Number(number) => number.as_f64().map(|w| vec![w]),
        Value::String(text) => text
            .split('%')
            .map(|part| part.trim().parse::<f64>().ok())
            .collect::<Option<Vec<f64>>>(),
        _ => None,
    }
}

fn term_value(coefficients: &[f64]) -> Value {
    match coefficients {
        [weight] => json!(weight),
        [weight, offset] => json!(format!("{weight}%{offset}")),
        _ => Value::Null,
    }
}

fn normalize_term(key: &str) -> String {
    match key.split_once('%') {
        Some((area1, area2)) => {
            let (area1, area2): (String, String) = sorted_pair(area1.trim(), area2.trim());
            format!("{area1}%{area2}")
        }
        None => key.trim().to_string(),
    }
}

fn normalize_coeffs(
    coeffs: BTreeMap<String, Vec<f64>>,
) -> Result<BTreeMap<String, Vec<f64>>, CommandError> {
    coeffs
        .into_iter()
        .map(|(key, values)| {
            if !is_term(&key) {
                return Err(CommandError::validation(
                    "binding_constraint",
                    format!("'{key}' is neither a link nor a cluster term"),
                ));
            }
            if values.is_empty() || values.len() > 2 || values.iter().any(|v| v.is_nan()) {
                return Err(CommandError::validation(
                    "binding_constraint",
                    format!("the coefficient of '{key}' must be one or two numbers"),
                ));
            }
            Ok((normalize_term(&key), values))
        })
        .collect()
}

fn write_terms(section: &mut Map<String, Value>, coeffs: &BTreeMap<String, Vec<f64>>) {
    section.retain(|key, _| !is_term(key));
    for (key, values) in coeffs {
        section.insert(key.clone(), term_value(values));
    }
}

/// Returns a failure message if a term references an unknown link or cluster.
fn check_terms(config: &StudyConfig, coeffs: &BTreeMap<String, Vec<f64>>) -> Option<String> {
    coeffs.keys().find_map(|key| {
        if let Some((area1, area2)) = key.split_once('%') {
            (!config.has_link(area1, area2))
                .then(|| format!("Link '{area1}%{area2}' does not exist"))
        } else {
            let (area, cluster) = key.split_once('.')?;
            let exists: bool = config
                .areas
                .get(area)
                .is_some_and(|a| a.has_thermal(cluster));
            (!exists).then(|| format!("Cluster '{area}.{cluster}' does not exist"))
        }
    })
}

fn split_terms(coeffs: &BTreeMap<String, Vec<f64>>) -> (BTreeSet<String>, BTreeSet<String>) {
    coeffs.keys().cloned().partition(|key| key.contains('%'))
}

/// Second-member matrices of a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ConstraintMatrices {
    pub(crate) values: Option<MatrixRef>,
    pub(crate) less_term_matrix: Option<MatrixRef>,
    pub(crate) equal_term_matrix: Option<MatrixRef>,
    pub(crate) greater_term_matrix: Option<MatrixRef>,
}

impl ConstraintMatrices {
    fn term(&self, suffix: &str) -> Option<&MatrixRef> {
        match suffix {
            "_lt" => self.less_term_matrix.as_ref(),
            "_eq" => self.equal_term_matrix.as_ref(),
            "_gt" => self.greater_term_matrix.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn set_term(&mut self, suffix: &str, reference: MatrixRef) {
        match suffix {
            "_lt" => self.less_term_matrix = Some(reference),
            "_eq" => self.equal_term_matrix = Some(reference),
            "_gt" => self.greater_term_matrix = Some(reference),
            _ => self.values = Some(reference),
        }
    }

    fn has_terms(&self) -> bool {
        self.less_term_matrix.is_some()
            || self.equal_term_matrix.is_some()
            || self.greater_term_matrix.is_some()
    }

    /// A failure message if the matrices do not fit the study version.
    fn version_mismatch(&self, version: StudyVersion) -> Option<String> {
        if version >= StudyVersion::V8_7 && self.values.is_some() {
            Some(format!(
                "The 'values' matrix is replaced by term matrices from version 8.7, study is {version}"
            ))
        } else if version < StudyVersion::V8_7 && self.has_terms() {
            Some(format!(
                "Term matrices require version 8.7 or later, study is {version}"
            ))
        } else {
            None
        }
    }

    fn references(&self) -> Vec<String> {
        [
            &self.values,
            &self.less_term_matrix,
            &self.equal_term_matrix,
            &self.greater_term_matrix,
        ]
        .into_iter()
        .flatten()
        .map(|m| m.id().to_string())
        .collect()
    }

    fn to_args(&self, args: &mut Map<String, Value>) {
        args.insert("values".to_string(), json!(self.values));
        args.insert("less_term_matrix".to_string(), json!(self.less_term_matrix));
        args.insert("equal_term_matrix".to_string(), json!(self.equal_term_matrix));
        args.insert(
            "greater_term_matrix".to_string(),
            json!(self.greater_term_matrix),
        );
    }
}

/// Second-member matrices given to a constraint command.
///
/// `values` is the stacked matrix used before 8.7, the term matrices replace
/// it from 8.7.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ConstraintMatrixInputs {
    #[serde(default)]
    pub values: Option<MatrixInput>,
    #[serde(default)]
    pub less_term_matrix: Option<MatrixInput>,
    #[serde(default)]
    pub equal_term_matrix: Option<MatrixInput>,
    #[serde(default)]
    pub greater_term_matrix: Option<MatrixInput>,
}

impl ConstraintMatrixInputs {
    /// Validates and stores the matrices.
    ///
    /// The shape is checked against `time_step` when it is known.
    fn resolve(
        self,
        action: CommandName,
        time_step: Option<BindingConstraintFrequency>,
        version: StudyVersion,
        ctx: &CommandContext,
    ) -> Result<ConstraintMatrices, CommandError> {
        let has_terms: bool = self.less_term_matrix.is_some()
            || self.equal_term_matrix.is_some()
            || self.greater_term_matrix.is_some();
        if version >= StudyVersion::V8_7 && self.values.is_some() {
            return Err(CommandError::validation(
                action.as_str(),
                format!("'values' is not accepted from version 8.7 (study version {version}), use the term matrices"),
            ));
        }
        if version < StudyVersion::V8_7 && has_terms {
            return Err(CommandError::validation(
                action.as_str(),
                format!("term matrices require version 8.7 or later (study version {version})"),
            ));
        }

        let rows: Option<usize> = time_step.map(|t| t.matrix_rows());
        let stacked = |input: MatrixInput| {
            resolve_matrix_with(input, ctx, |data| {
                rows.map_or(Ok(()), |rows| check_exact_shape(data, rows, 3))
            })
        };
        let term = |input: MatrixInput| {
            resolve_matrix_with(input, ctx, |data| {
                rows.map_or(Ok(()), |rows| check_rows(data, rows))
            })
        };

        Ok(ConstraintMatrices {
            values: self.values.map(stacked).transpose()?,
            less_term_matrix: self.less_term_matrix.map(term).transpose()?,
            equal_term_matrix: self.equal_term_matrix.map(term).transpose()?,
            greater_term_matrix: self.greater_term_matrix.map(term).transpose()?,
        })
    }
}

/// Writes the matrices of a constraint, using defaults for absent ones.
fn write_matrices(
    tree: &mut dyn StudyTree,
    id: &str,
    version: StudyVersion,
    time_step: BindingConstraintFrequency,
    suffixes: &[&str],
    matrices: &ConstraintMatrices,
    constants: &MatrixConstants,
) -> Result<(), CommandError> {
    let default: &MatrixRef = constants.binding_constraint(time_step, version);
    if version < StudyVersion::V8_7 {
        let reference: &MatrixRef = matrices.values.as_ref().unwrap_or(default);
        save(
            tree,
            Value::String(reference.link()),
            &format!("input/bindingconstraints/{id}"),
        )?;
    } else {
        for suffix in suffixes {
            let reference: &MatrixRef = matrices.term(suffix).unwrap_or(default);
            save(
                tree,
                Value::String(reference.link()),
                &format!("input/bindingconstraints/{id}{suffix}"),
            )?;
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CreateBindingConstraintArgs {
    name: String,
    #[serde(flatten)]
    properties: BindingConstraintProperties,
    #[serde(default)]
    coeffs: BTreeMap<String, Vec<f64>>,
    #[serde(flatten)]
    matrices: ConstraintMatrixInputs,
    #[serde(default)]
    study_version: Option<StudyVersion>,
}

/// Creates a binding constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateBindingConstraint {
    name: String,
    properties: BindingConstraintProperties,
    coeffs: BTreeMap<String, Vec<f64>>,
    matrices: ConstraintMatrices,
    study_version: StudyVersion,
}

impl CreateBindingConstraint {
    /// Builds a constraint with default matrices.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or a coefficient is malformed.
    pub fn new(
        name: &str,
        properties: BindingConstraintProperties,
        coeffs: BTreeMap<String, Vec<f64>>,
        study_version: StudyVersion,
    ) -> Result<Self, CommandError> {
        validate_name("binding constraint", name)?;
        Ok(Self {
            name: name.to_string(),
            properties,
            coeffs: normalize_coeffs(coeffs)?,
            matrices: ConstraintMatrices::default(),
            study_version,
        })
    }

    pub(crate) fn with_matrices(mut self, matrices: ConstraintMatrices) -> Self {
        self.matrices = matrices;
        self
    }

    /// Validates and stores the second-member matrices.
    ///
    /// Shapes are checked against the time step, hourly when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a matrix contains NaN, has the wrong shape, names
    /// an unknown id, or does not fit the study version.
    pub fn with_matrix_inputs(
        mut self,
        inputs: ConstraintMatrixInputs,
        ctx: &CommandContext,
    ) -> Result<Self, CommandError> {
        self.matrices = inputs.resolve(
            CommandName::CreateBindingConstraint,
            Some(self.properties.time_step.unwrap_or_default()),
            self.study_version,
            ctx,
        )?;
        Ok(self)
    }

    /// The constraint id derived from its name.
    #[must_use]
    pub fn constraint_id(&self) -> String {
        transform_name_to_id(&self.name, true)
    }

    /// The constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scalar properties.
    #[must_use]
    pub const fn properties(&self) -> &BindingConstraintProperties {
        &self.properties
    }

    /// The term coefficients, keyed by `a%b` or `area.cluster`.
    #[must_use]
    pub const fn coeffs(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.coeffs
    }

    /// The equivalent update of an existing constraint: every field is set.
    #[must_use]
    pub fn to_update(&self) -> UpdateBindingConstraint {
        UpdateBindingConstraint {
            id: self.constraint_id(),
            properties: self.properties.with_defaults(self.study_version),
            coeffs: Some(self.coeffs.clone()),
            matrices: self.matrices.clone(),
            study_version: self.study_version,
        }
    }
}

impl CommandOps for CreateBindingConstraint {
    fn from_args(args: Map<String, Value>, ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: CreateBindingConstraintArgs =
            decode(CommandName::CreateBindingConstraint, args)?;
        let study_version: StudyVersion = raw.study_version.unwrap_or_default();
        Self::new(&raw.name, raw.properties, raw.coeffs, study_version)?
            .with_matrix_inputs(raw.matrices, ctx)
    }

    fn to_args(&self) -> Map<String, Value> {
        let mut args: Map<String, Value> = object(json!(self.properties));
        args.insert("name".to_string(), json!(self.name));
        args.insert("coeffs".to_string(), json!(self.coeffs));
        args.insert("study_version".to_string(), json!(self.study_version));
        self.matrices.to_args(&mut args);
        args
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.constraint_id()]
    }

    /// Strict matching treats an unset property as its creation default.
    fn matches(&self, other: &Self, equal: bool) -> bool {
        if !equal {
            return self.signature_keys() == other.signature_keys();
        }
        self.name == other.name
            && self.coeffs == other.coeffs
            && self.matrices == other.matrices
            && self.study_version == other.study_version
            && self.properties.with_defaults(self.study_version)
                == other.properties.with_defaults(other.study_version)
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let version: StudyVersion = study.version();
        let id: String = self.constraint_id();

        if study.config.binding(&id).is_some() {
            return Ok(CommandOutput::failure(format!(
                "Binding constraint '{id}' already exists"
            )));
        }
        if let Some(message) = self.matrices.version_mismatch(version) {
            return Ok(CommandOutput::failure(message));
        }
        if let Some(message) = check_terms(&study.config, &self.coeffs) {
            return Ok(CommandOutput::failure(message));
        }

        let properties: BindingConstraintProperties = self.properties.with_defaults(version);
        let time_step: BindingConstraintFrequency = properties.time_step.unwrap_or_default();
        let operator: BindingConstraintOperator = properties
            .operator
            .unwrap_or(BindingConstraintOperator::Equal);

        let mut section: Map<String, Value> = object(json!({ "name": self.name, "id": id }));
        properties.write(&mut section, version);
        write_terms(&mut section, &self.coeffs);

        let mut sections: Vec<Map<String, Value>> = read_constraint_sections(study.tree.as_ref())?;
        sections.push(section);
        write_constraint_sections(study.tree.as_mut(), sections)?;
        write_matrices(
            study.tree.as_mut(),
            &id,
            version,
            time_step,
            operator.matrix_suffixes(),
            &self.matrices,
            ctx.constants(),
        )?;

        let (links, clusters): (BTreeSet<String>, BTreeSet<String>) = split_terms(&self.coeffs);
        study.config.bindings.push(BindingConstraintSummary {
            id: id.clone(),
            links,
            clusters,
            time_step,
            group: properties.group,
        });

        Ok(CommandOutput::success(format!(
            "Binding constraint '{id}' created"
        )))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        vec![other.to_update().into()]
    }

    fn inner_matrices(&self) -> Vec<String> {
        self.matrices.references()
    }
}

#[derive(Debug, Deserialize)]
struct UpdateBindingConstraintArgs {
    id: String,
    #[serde(flatten)]
    properties: BindingConstraintProperties,
    #[serde(default)]
    coeffs: Option<BTreeMap<String, Vec<f64>>>,
    #[serde(flatten)]
    matrices: ConstraintMatrixInputs,
    #[serde(default)]
    study_version: Option<StudyVersion>,
}

/// Updates an existing binding constraint. Unset fields are left unchanged.
///
/// Changing the time step or the operator without giving matrices resets the
/// matrices to their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBindingConstraint {
    id: String,
    properties: BindingConstraintProperties,
    coeffs: Option<BTreeMap<String, Vec<f64>>>,
    matrices: ConstraintMatrices,
    study_version: StudyVersion,
}

impl UpdateBindingConstraint {
    /// Builds an update of the given properties.
    ///
    /// # Errors
    ///
    /// Returns an error if a coefficient is malformed.
    pub fn new(
        id: &str,
        properties: BindingConstraintProperties,
        coeffs: Option<BTreeMap<String, Vec<f64>>>,
        study_version: StudyVersion,
    ) -> Result<Self, CommandError> {
        Ok(Self {
            id: id.to_string(),
            properties,
            coeffs: coeffs.map(normalize_coeffs).transpose()?,
            matrices: ConstraintMatrices::default(),
            study_version,
        })
    }

    /// Validates and stores the second-member matrices.
    ///
    /// Shapes are only checked when the update sets the time step.
    ///
    /// # Errors
    ///
    /// Returns an error if a matrix contains NaN, has the wrong shape, names
    /// an unknown id, or does not fit the study version.
    pub fn with_matrix_inputs(
        mut self,
        inputs: ConstraintMatrixInputs,
        ctx: &CommandContext,
    ) -> Result<Self, CommandError> {
        self.matrices = inputs.resolve(
            CommandName::UpdateBindingConstraint,
            self.properties.time_step,
            self.study_version,
            ctx,
        )?;
        Ok(self)
    }

    /// The constraint id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The properties being changed.
    #[must_use]
    pub const fn properties(&self) -> &BindingConstraintProperties {
        &self.properties
    }

    /// The new coefficients, if they change.
    #[must_use]
    pub const fn coeffs(&self) -> Option<&BTreeMap<String, Vec<f64>>> {
        self.coeffs.as_ref()
    }

    fn update_matrices(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
        previous: (BindingConstraintFrequency, BindingConstraintOperator),
        current: (BindingConstraintFrequency, BindingConstraintOperator),
    ) -> Result<(), CommandError> {
        let version: StudyVersion = study.version();
        let tree: &mut dyn StudyTree = study.tree.as_mut();
        let id: &str = &self.id;
        let time_step_changed: bool = previous.0 != current.0;
        let default: &MatrixRef = ctx.constants().binding_constraint(current.0, version);

        if version < StudyVersion::V8_7 {
            let reference: Option<&MatrixRef> = self
                .matrices
                .values
                .as_ref()
                .or_else(|| time_step_changed.then_some(default));
            if let Some(reference) = reference {
                save(
                    tree,
                    Value::String(reference.link()),
                    &format!("input/bindingconstraints/{id}"),
                )?;
            }
            return Ok(());
        }

        let old_suffixes: &[&str] = previous.1.matrix_suffixes();
        let new_suffixes: &[&str] = current.1.matrix_suffixes();
        for suffix in old_suffixes {
            if !new_suffixes.contains(suffix) {
                delete_if_exists(tree, &format!("input/bindingconstraints/{id}{suffix}"))?;
            }
        }
        for suffix in new_suffixes {
            let reference: Option<&MatrixRef> = self.matrices.term(suffix).or_else(|| {
                (time_step_changed || !old_suffixes.contains(suffix)).then_some(default)
            });
            if let Some(reference) = reference {
                save(
                    tree,
                    Value::String(reference.link()),
                    &format!("input/bindingconstraints/{id}{suffix}"),
                )?;
            }
        }
        Ok(())
    }
}

impl CommandOps for UpdateBindingConstraint {
    fn from_args(args: Map<String, Value>, ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: UpdateBindingConstraintArgs =
            decode(CommandName::UpdateBindingConstraint, args)?;
        let study_version: StudyVersion = raw.study_version.unwrap_or_default();
        Self::new(&raw.id, raw.properties, raw.coeffs, study_version)?
            .with_matrix_inputs(raw.matrices, ctx)
    }

    fn to_args(&self) -> Map<String, Value> {
        let mut args: Map<String, Value> = object(json!(self.properties));
        args.insert("id".to_string(), json!(self.id));
        args.insert("coeffs".to_string(), json!(self.coeffs));
        args.insert("study_version".to_string(), json!(self.study_version));
        self.matrices.to_args(&mut args);
        args
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let version: StudyVersion = study.version();
        let id: &str = &self.id;

        let Some(summary) = study.config.binding(id).cloned() else {
            return Ok(CommandOutput::failure(format!(
                "Binding constraint '{id}' does not exist"
            )));
        };
        if let Some(message) = self.matrices.version_mismatch(version) {
            return Ok(CommandOutput::failure(message));
        }
        if let Some(message) = self
            .coeffs
            .as_ref()
            .and_then(|coeffs| check_terms(&study.config, coeffs))
        {
            return Ok(CommandOutput::failure(message));
        }

        let mut sections: Vec<Map<String, Value>> = read_constraint_sections(study.tree.as_ref())?;
        let Some(section) = sections.iter_mut().find(|s| section_id(s) == Some(id)) else {
            return Ok(CommandOutput::failure(format!(
                "Binding constraint '{id}' is missing from the constraint index"
            )));
        };

        let existing: BindingConstraintProperties =
            BindingConstraintProperties::from_section(section, version);
        let previous_operator: BindingConstraintOperator = existing
            .operator
            .unwrap_or(BindingConstraintOperator::Equal);
        let previous: (BindingConstraintFrequency, BindingConstraintOperator) = (
            existing.time_step.unwrap_or(summary.time_step),
            previous_operator,
        );
        let current: (BindingConstraintFrequency, BindingConstraintOperator) = (
            self.properties.time_step.unwrap_or(previous.0),
            self.properties.operator.unwrap_or(previous.1),
        );

        self.properties.write(section, version);
        if let Some(coeffs) = &self.coeffs {
            write_terms(section, coeffs);
        }
        write_constraint_sections(study.tree.as_mut(), sections)?;
        self.update_matrices(study, ctx, previous, current)?;

        if let Some(binding) = study.config.bindings.iter_mut().find(|b| b.id == id) {
            binding.time_step = current.0;
            if version >= StudyVersion::V8_7 && self.properties.group.is_some() {
                binding.group.clone_from(&self.properties.group);
            }
            if let Some(coeffs) = &self.coeffs {
                let (links, clusters): (BTreeSet<String>, BTreeSet<String>) = split_terms(coeffs);
                binding.links = links;
                binding.clusters = clusters;
            }
        }

        Ok(CommandOutput::success(format!(
            "Binding constraint '{id}' updated"
        )))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        vec![other.clone().into()]
    }

    fn inner_matrices(&self) -> Vec<String> {
        self.matrices.references()
    }
}

/// Removes a binding constraint and its matrices.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveBindingConstraint {
    id: String,
}

impl RemoveBindingConstraint {
    /// Builds the command.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    /// The constraint id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl CommandOps for RemoveBindingConstraint {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::RemoveBindingConstraint, args)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "id": self.id }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        if study.config.binding(&self.id).is_none() {
            return Ok(CommandOutput::failure(format!(
                "Binding constraint '{}' does not exist",
                self.id
            )));
        }
        remove_binding_constraints(study, std::slice::from_ref(&self.id))?;
        Ok(CommandOutput::success(format!(
            "Binding constraint '{}' removed",
            self.id
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
