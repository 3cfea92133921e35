// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{decode, object, save};
use super::validation::{MatrixInput, resolve_matrix};
use super::{Command, CommandOps};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{FileStudy, MatrixRef, StudyVersion, TreeError, url};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Points an existing matrix node of the tree at another matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceMatrix {
    target: String,
    matrix: MatrixRef,
}

#[derive(Debug, Deserialize)]
struct ReplaceMatrixArgs {
    target: String,
    matrix: MatrixInput,
}

impl ReplaceMatrix {
    /// Builds the command; `target` is a `/`-separated tree path.
    #[must_use]
    pub fn new(target: &str, matrix: MatrixRef) -> Self {
        Self {
            target: url(target).join("/"),
            matrix,
        }
    }

    /// The tree path of the matrix node.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The new matrix.
    #[must_use]
    pub const fn matrix(&self) -> &MatrixRef {
        &self.matrix
    }
}

impl CommandOps for ReplaceMatrix {
    fn from_args(args: Map<String, Value>, ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: ReplaceMatrixArgs = decode(CommandName::ReplaceMatrix, args)?;
        let matrix: MatrixRef = resolve_matrix(raw.matrix, ctx)?;
        Ok(Self::new(&raw.target, matrix))
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "target": self.target, "matrix": self.matrix }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.target.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        match study.tree.get(&url(&self.target)) {
            Ok(Value::Object(_)) => {
                return Ok(CommandOutput::failure(format!(
                    "'{}' is not a matrix",
                    self.target
                )));
            }
            Ok(_) => {}
            Err(TreeError::ChildNotFound { .. }) => {
                return Ok(CommandOutput::failure(format!(
                    "Path '{}' does not exist",
                    self.target
                )));
            }
            Err(err) => return Err(err.into()),
        }

        save(
            study.tree.as_mut(),
            Value::String(self.matrix.link()),
            &self.target,
        )?;
        Ok(CommandOutput::success(format!(
            "Matrix '{}' replaced",
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

    fn inner_matrices(&self) -> Vec<String> {
        vec![self.matrix.id().to_string()]
    }
}
