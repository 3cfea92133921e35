// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{decode, object, read_section, save};
use super::{Command, CommandOps};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{EnrModelling, FileStudy, StudyVersion, url};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Path of the general settings of a study.
pub(crate) const GENERAL_DATA: &str = "settings/generaldata";

/// Path of the study comments.
pub(crate) const COMMENTS: &str = "settings/comments";

fn normalize(target: &str) -> String {
    url(target).join("/")
}

/// Refreshes the renewable modelling mode of the config from `settings/generaldata`.
pub(crate) fn refresh_enr_modelling(study: &mut FileStudy) -> Result<(), CommandError> {
    let general: Map<String, Value> = read_section(study.tree.as_ref(), GENERAL_DATA)?;
    let modelling: Option<&str> = general
        .get("other preferences")
        .and_then(|section| section.get("renewable-generation-modelling"))
        .and_then(Value::as_str);
    match modelling {
        Some("clusters") => study.config.enr_modelling = EnrModelling::Clusters,
        Some("aggregated") => study.config.enr_modelling = EnrModelling::Aggregated,
        _ => {}
    }
    Ok(())
}

/// Writes ini data at a tree path, replacing what was there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    target: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct UpdateConfigArgs {
    target: String,
    data: Value,
}

impl UpdateConfig {
    /// Builds the command; `target` is a `/`-separated tree path.
    #[must_use]
    pub fn new(target: &str, data: Value) -> Self {
        Self {
            target: normalize(target),
            data,
        }
    }

    /// The tree path being written.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The data written at the target.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Whether `other` lies strictly under this command's target.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &str) -> bool {
        other
            .strip_prefix(self.target.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl CommandOps for UpdateConfig {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: UpdateConfigArgs = decode(CommandName::UpdateConfig, args)?;
        Ok(Self::new(&raw.target, raw.data))
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "target": self.target, "data": self.data }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.target.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        if self.target.is_empty() {
            return Ok(CommandOutput::failure("The target path must not be empty"));
        }

        save(study.tree.as_mut(), self.data.clone(), &self.target)?;
        if self.target.starts_with(GENERAL_DATA) {
            refresh_enr_modelling(study)?;
        }

        Ok(CommandOutput::success(format!(
            "Configuration '{}' updated",
            self.target
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

/// Replaces the study comments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateComments {
    comments: String,
}

impl UpdateComments {
    /// Builds the command.
    #[must_use]
    pub fn new(comments: &str) -> Self {
        Self {
            comments: comments.to_string(),
        }
    }

    /// The new comments.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }
}

impl CommandOps for UpdateComments {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::UpdateComments, args)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "comments": self.comments }))
    }

    fn signature_keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        save(
            study.tree.as_mut(),
            Value::String(self.comments.clone()),
            COMMENTS,
        )?;
        Ok(CommandOutput::success("Comments updated"))
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

/// Replaces a raw (non-ini) file with text content.
///
/// The content travels base64-encoded in `b64Data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRawFile {
    target: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct UpdateRawFileArgs {
    target: String,
    #[serde(rename = "b64Data")]
    b64_data: String,
}

impl UpdateRawFile {
    /// Builds the command from plain text.
    #[must_use]
    pub fn new(target: &str, content: &str) -> Self {
        Self {
            target: normalize(target),
            content: content.to_string(),
        }
    }

    /// Builds the command from base64-encoded content.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64-encoded UTF-8.
    pub fn from_b64(target: &str, b64_data: &str) -> Result<Self, CommandError> {
        let action: &str = CommandName::UpdateRawFile.as_str();
        let bytes: Vec<u8> = STANDARD
            .decode(b64_data)
            .map_err(|e| CommandError::validation(action, format!("invalid base64 data: {e}")))?;
        let content: String = String::from_utf8(bytes)
            .map_err(|e| CommandError::validation(action, format!("invalid UTF-8 content: {e}")))?;
        Ok(Self::new(target, &content))
    }

    /// The tree path being written.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The decoded content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl CommandOps for UpdateRawFile {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: UpdateRawFileArgs = decode(CommandName::UpdateRawFile, args)?;
        Self::from_b64(&raw.target, &raw.b64_data)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "target": self.target,
            "b64Data": STANDARD.encode(self.content.as_bytes()),
        }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.target.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        if let Ok(Value::Object(_)) = study.tree.get(&url(&self.target)) {
            return Ok(CommandOutput::failure(format!(
                "'{}' is a folder and cannot be replaced by a file",
                self.target
            )));
        }

        save(
            study.tree.as_mut(),
            Value::String(self.content.clone()),
            &self.target,
        )?;
        Ok(CommandOutput::success(format!(
            "File '{}' updated",
            self.target
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
