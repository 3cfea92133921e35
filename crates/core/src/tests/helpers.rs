// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, CommandContext, CommandOutput, CreateArea, CreateLink};
use antares_study::{FileStudy, InMemoryMatrixService, Matrix, StudyVersion, TreeError, url};
use serde_json::{Map, Value};
use std::sync::Arc;

pub fn create_test_context() -> CommandContext {
    CommandContext::new(Arc::new(InMemoryMatrixService::new()))
}

pub fn create_test_study(version: StudyVersion) -> FileStudy {
    FileStudy::empty(version)
}

/// A study holding the areas `fr` and `de` linked together.
pub fn create_two_area_study(ctx: &CommandContext, version: StudyVersion) -> FileStudy {
    let mut study: FileStudy = create_test_study(version);
    let commands: Vec<Command> = vec![
        CreateArea::new("fr").unwrap().into(),
        CreateArea::new("de").unwrap().into(),
        CreateLink::new("fr", "de").into(),
    ];
    for output in apply_all(&commands, &mut study, ctx) {
        assert!(output.status, "{}", output.message);
    }
    study
}

pub fn apply_all(
    commands: &[Command],
    study: &mut FileStudy,
    ctx: &CommandContext,
) -> Vec<CommandOutput> {
    commands
        .iter()
        .map(|command| command.apply(study, ctx))
        .collect()
}

pub fn apply_ok(command: impl Into<Command>, study: &mut FileStudy, ctx: &CommandContext) {
    let command: Command = command.into();
    let output: CommandOutput = command.apply(study, ctx);
    assert!(output.status, "{}: {}", command.match_signature(), output.message);
}

pub fn tree_get(study: &FileStudy, path: &str) -> Result<Value, TreeError> {
    study.tree.get(&url(path))
}

pub fn tree_root(study: &FileStudy) -> Value {
    study.tree.get(&[]).unwrap()
}

pub fn filled(rows: usize, columns: usize, value: f64) -> Matrix {
    vec![vec![value; columns]; rows]
}

pub fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}
