// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{decode, delete_if_exists, object, read_section, save};
use super::{Command, CommandOps};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{
    DistrictSet, FileStudy, StudyConfig, StudyVersion, transform_name_to_id, validate_name,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// How the area list of a district is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistrictBaseFilter {
    /// Every area, minus the listed ones.
    #[serde(rename = "add-all")]
    AddAll,
    /// Only the listed areas.
    #[default]
    #[serde(rename = "remove-all")]
    RemoveAll,
}

impl DistrictBaseFilter {
    /// The ini value of `apply-filter`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddAll => "add-all",
            Self::RemoveAll => "remove-all",
        }
    }

    /// Parses an `apply-filter` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add-all" => Some(Self::AddAll),
            "remove-all" => Some(Self::RemoveAll),
            _ => None,
        }
    }

    pub(crate) const fn from_inverted(inverted_set: bool) -> Self {
        if inverted_set {
            Self::AddAll
        } else {
            Self::RemoveAll
        }
    }

    pub(crate) const fn list_key(self) -> &'static str {
        match self {
            Self::AddAll => "-",
            Self::RemoveAll => "+",
        }
    }
}

const fn default_output() -> bool {
    true
}

fn unknown_areas(config: &StudyConfig, items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|item| !config.areas.contains_key(item.as_str()))
        .cloned()
        .collect()
}

fn district_section(
    caption: &str,
    base_filter: DistrictBaseFilter,
    items: &[String],
    output: bool,
    comments: &str,
) -> Value {
    let mut section: Map<String, Value> = object(json!({
        "caption": caption,
        "comments": comments,
        "output": output,
        "apply-filter": base_filter.as_str(),
    }));
    section.insert(base_filter.list_key().to_string(), json!(items));
    Value::Object(section)
}

/// Creates a district: a named set of areas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateDistrict {
    name: String,
    #[serde(default)]
    base_filter: DistrictBaseFilter,
    #[serde(default)]
    filter_items: Vec<String>,
    #[serde(default = "default_output")]
    output: bool,
    #[serde(default)]
    comments: String,
}

impl CreateDistrict {
    /// Builds the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the name contains forbidden characters.
    pub fn new(
        name: &str,
        base_filter: DistrictBaseFilter,
        filter_items: Vec<String>,
        output: bool,
        comments: &str,
    ) -> Result<Self, CommandError> {
        validate_name("district", name)?;
        Ok(Self {
            name: name.to_string(),
            base_filter,
            filter_items,
            output,
            comments: comments.to_string(),
        })
    }

    /// The district id derived from the name.
    #[must_use]
    pub fn district_id(&self) -> String {
        transform_name_to_id(&self.name, true)
    }

    /// The equivalent update of an existing district.
    #[must_use]
    pub fn to_update(&self) -> UpdateDistrict {
        UpdateDistrict {
            id: self.district_id(),
            base_filter: Some(self.base_filter),
            filter_items: Some(self.filter_items.clone()),
            output: Some(self.output),
            comments: Some(self.comments.clone()),
        }
    }
}

impl CommandOps for CreateDistrict {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: Self = decode(CommandName::CreateDistrict, args)?;
        validate_name("district", &raw.name)?;
        Ok(raw)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "name": self.name,
            "base_filter": self.base_filter,
            "filter_items": self.filter_items,
            "output": self.output,
            "comments": self.comments,
        }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.district_id()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let id: String = self.district_id();

        if study.config.sets.contains_key(&id) {
            return Ok(CommandOutput::failure(format!(
                "District '{id}' already exists and could not be created"
            )));
        }
        let unknown: Vec<String> = unknown_areas(&study.config, &self.filter_items);
        if !unknown.is_empty() {
            return Ok(CommandOutput::failure(format!(
                "Area(s) '{}' do not exist",
                unknown.join("', '")
            )));
        }

        save(
            study.tree.as_mut(),
            district_section(
                &self.name,
                self.base_filter,
                &self.filter_items,
                self.output,
                &self.comments,
            ),
            &format!("input/areas/sets/{id}"),
        )?;
        study.config.sets.insert(
            id.clone(),
            DistrictSet::new(
                &self.name,
                self.base_filter == DistrictBaseFilter::AddAll,
                self.filter_items.clone(),
                self.output,
            ),
        );

        Ok(CommandOutput::success(format!("District '{id}' created")))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        vec![other.to_update().into()]
    }
}

/// Removes a district.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveDistrict {
    id: String,
}

impl RemoveDistrict {
    /// Builds the command.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    /// The district id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl CommandOps for RemoveDistrict {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::RemoveDistrict, args)
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
        if study.config.sets.remove(&self.id).is_none() {
            return Ok(CommandOutput::failure(format!(
                "District '{}' does not exist",
                self.id
            )));
        }
        delete_if_exists(
            study.tree.as_mut(),
            &format!("input/areas/sets/{}", self.id),
        )?;
        Ok(CommandOutput::success(format!(
            "District '{}' deleted",
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

/// Updates some fields of an existing district.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateDistrict {
    id: String,
    #[serde(default)]
    base_filter: Option<DistrictBaseFilter>,
    #[serde(default)]
    filter_items: Option<Vec<String>>,
    #[serde(default)]
    output: Option<bool>,
    #[serde(default)]
    comments: Option<String>,
}

impl UpdateDistrict {
    /// Builds an update that changes nothing yet.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            base_filter: None,
            filter_items: None,
            output: None,
            comments: None,
        }
    }

    /// Sets the base filter and the listed areas.
    #[must_use]
    pub fn with_filter(mut self, base_filter: DistrictBaseFilter, items: Vec<String>) -> Self {
        self.base_filter = Some(base_filter);
        self.filter_items = Some(items);
        self
    }

    /// Sets the output flag.
    #[must_use]
    pub const fn with_output(mut self, output: bool) -> Self {
        self.output = Some(output);
        self
    }

    /// Sets the comments.
    #[must_use]
    pub fn with_comments(mut self, comments: &str) -> Self {
        self.comments = Some(comments.to_string());
        self
    }

    /// The district id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl CommandOps for UpdateDistrict {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::UpdateDistrict, args)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "id": self.id,
            "base_filter": self.base_filter,
            "filter_items": self.filter_items,
            "output": self.output,
            "comments": self.comments,
        }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let Some(current) = study.config.sets.get(&self.id).cloned() else {
            return Ok(CommandOutput::failure(format!(
                "District '{}' does not exist",
                self.id
            )));
        };

        let base_filter: DistrictBaseFilter = self
            .base_filter
            .unwrap_or_else(|| DistrictBaseFilter::from_inverted(current.inverted_set));
        let items: Vec<String> = self
            .filter_items
            .clone()
            .unwrap_or_else(|| current.areas.clone().unwrap_or_default());
        let unknown: Vec<String> = unknown_areas(&study.config, &items);
        if !unknown.is_empty() {
            return Ok(CommandOutput::failure(format!(
                "Area(s) '{}' do not exist",
                unknown.join("', '")
            )));
        }
        let output: bool = self.output.unwrap_or(current.output);

        let path: String = format!("input/areas/sets/{}", self.id);
        let section: Map<String, Value> = read_section(study.tree.as_ref(), &path)?;
        let comments: String = self.comments.clone().unwrap_or_else(|| {
            section
                .get("comments")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        });
        let caption: String = current.name.clone().unwrap_or_else(|| self.id.clone());

        save(
            study.tree.as_mut(),
            district_section(&caption, base_filter, &items, output, &comments),
            &path,
        )?;
        study.config.sets.insert(
            self.id.clone(),
            DistrictSet {
                inverted_set: base_filter == DistrictBaseFilter::AddAll,
                areas: Some(items),
                output,
                ..current
            },
        );

        Ok(CommandOutput::success(format!(
            "District '{}' updated",
            self.id
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
}
