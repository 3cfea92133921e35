// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! JSON files exchanged by the command-line tool.
//!
//! A study archive carries a study config, its tree and every matrix the tree
//! links to. A command bundle carries a command list and the matrices its
//! commands reference, so it can be replayed against another archive.

use antares_study::{
    FileStudy, InMemoryMatrixService, JsonTree, Matrix, MatrixError, MatrixRef, MatrixService,
    StudyConfig,
};
use antares_variant::{Command, CommandContext, CommandDto};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// A materialized study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyArchive {
    pub config: StudyConfig,
    pub tree: Value,
    #[serde(default)]
    pub matrices: BTreeMap<String, Matrix>,
}

impl StudyArchive {
    /// An archive holding an empty study.
    #[cfg(test)]
    #[must_use]
    pub fn empty(config: StudyConfig) -> Self {
        Self {
            config,
            tree: Value::Object(serde_json::Map::new()),
            matrices: BTreeMap::new(),
        }
    }

    /// Builds a fresh study from the archived config and tree.
    #[must_use]
    pub fn study(&self) -> FileStudy {
        FileStudy::new(self.config.clone(), JsonTree::from_value(self.tree.clone()))
    }

    /// Snapshots `study`, copying the matrices its tree links to out of `service`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read or links to a matrix
    /// `service` does not hold.
    pub fn capture(study: &FileStudy, service: &dyn MatrixService) -> Result<Self> {
        let tree: Value = study.tree.get(&[])?;
        let mut ids: BTreeSet<String> = BTreeSet::new();
        collect_matrix_links(&tree, &mut ids);

        Ok(Self {
            config: study.config.clone(),
            tree,
            matrices: fetch_matrices(ids, service)?,
        })
    }
}

/// A command list with the matrices it references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandBundle {
    pub commands: Vec<CommandDto>,
    #[serde(default)]
    pub matrices: BTreeMap<String, Matrix>,
}

impl CommandBundle {
    /// Serializes `commands`, copying their matrices out of `service`.
    ///
    /// # Errors
    ///
    /// Returns an error if a command references a matrix `service` does not hold.
    pub fn capture(commands: &[Command], service: &dyn MatrixService) -> Result<Self> {
        let ids: BTreeSet<String> = commands
            .iter()
            .flat_map(Command::get_inner_matrices)
            .collect();
        Ok(Self {
            commands: commands.iter().map(Command::to_dto).collect(),
            matrices: fetch_matrices(ids, service)?,
        })
    }
}

fn fetch_matrices(
    ids: BTreeSet<String>,
    service: &dyn MatrixService,
) -> Result<BTreeMap<String, Matrix>, MatrixError> {
    ids.into_iter()
        .map(|id| match service.get(&id) {
            Some(data) => Ok((id, data)),
            None => Err(MatrixError::NotFound(id)),
        })
        .collect()
}

/// Adds the id of every `matrix://` link under `node` to `ids`.
fn collect_matrix_links(node: &Value, ids: &mut BTreeSet<String>) {
    match node {
        Value::String(link) => {
            if let Some(reference) = MatrixRef::from_link(link) {
                ids.insert(reference.id().to_string());
            }
        }
        Value::Object(children) => {
            for child in children.values() {
                collect_matrix_links(child, ids);
            }
        }
        _ => {}
    }
}

/// A command context over an in-memory store holding every matrix of
/// `sources` under its archived id.
#[must_use]
pub fn context_with(sources: &[&BTreeMap<String, Matrix>]) -> CommandContext {
    let mut merged: BTreeMap<String, Matrix> = BTreeMap::new();
    for source in sources {
        merged.extend(source.iter().map(|(id, data)| (id.clone(), data.clone())));
    }
    CommandContext::new(Arc::new(InMemoryMatrixService::with_matrices(merged)))
}

/// Reads a JSON document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text: String = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("Failed to parse {}", path.display()))
}

/// Writes a JSON document to `path`, or to stdout when no path is given.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or the file written.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let text: String = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => std::fs::write(path, text)
            .wrap_err_with(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antares_study::StudyVersion;
    use antares_variant::{CommandOutput, CreateArea, UpdateComments};
    use serde_json::json;

    #[test]
    fn test_capture_copies_linked_matrices() {
        let ctx: CommandContext = context_with(&[]);
        let mut study: FileStudy =
            StudyArchive::empty(StudyConfig::new(StudyVersion::LATEST)).study();
        let output: CommandOutput = Command::from(CreateArea::new("fr").unwrap()).apply(&mut study, &ctx);
        assert!(output.status, "{}", output.message);

        let archive: StudyArchive = StudyArchive::capture(&study, ctx.matrix_service()).unwrap();

        let null_matrix: &str = ctx.constants().null_matrix.id();
        assert_eq!(archive.matrices.get(null_matrix), Some(&Vec::new()));
        assert!(archive.config.areas.contains_key("fr"));
    }

    #[test]
    fn test_capture_rejects_unknown_matrix_links() {
        let ctx: CommandContext = context_with(&[]);
        let study: FileStudy = StudyArchive {
            config: StudyConfig::new(StudyVersion::LATEST),
            tree: json!({ "input": { "load": { "series": { "load_fr": "matrix://missing" } } } }),
            matrices: BTreeMap::new(),
        }
        .study();

        let err = StudyArchive::capture(&study, ctx.matrix_service()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<MatrixError>(),
            Some(&MatrixError::NotFound(String::from("missing")))
        );
    }

    #[test]
    fn test_bundle_round_trips_through_json() {
        let ctx: CommandContext = context_with(&[]);
        let commands: Vec<Command> = vec![
            CreateArea::new("fr").unwrap().into(),
            UpdateComments::new("hello").into(),
        ];

        let bundle: CommandBundle =
            CommandBundle::capture(&commands, ctx.matrix_service()).unwrap();
        let text: String = serde_json::to_string(&bundle).unwrap();
        let parsed: CommandBundle = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, bundle);
        assert_eq!(parsed.commands[1].action, "update_comments");
        assert!(parsed.matrices.is_empty());
    }

    #[test]
    fn test_context_keeps_archived_ids() {
        let archived: BTreeMap<String, Matrix> =
            BTreeMap::from([(String::from("custom"), vec![vec![1.0, 2.0]])]);

        let ctx: CommandContext = context_with(&[&archived]);

        assert_eq!(ctx.matrix_service().get("custom"), Some(vec![vec![1.0, 2.0]]));
    }
}
