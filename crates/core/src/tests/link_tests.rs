// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    apply_ok, args, create_test_context, create_test_study, create_two_area_study, filled,
    tree_get,
};
use crate::{
    BindingConstraintProperties, Command, CommandContext, CommandDto, CommandError,
    CommandFactory, CommandName, CommandOutput, CreateArea, CreateBindingConstraint, CreateLink,
    MatrixInput, RemoveLink, ReplaceMatrix, UpdateConfig,
};
use antares_study::{FileStudy, MatrixRef, StudyVersion};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

fn create_areas(ctx: &CommandContext, version: StudyVersion) -> FileStudy {
    let mut study: FileStudy = create_test_study(version);
    apply_ok(CreateArea::new("fr").unwrap(), &mut study, ctx);
    apply_ok(CreateArea::new("de").unwrap(), &mut study, ctx);
    study
}

#[test]
fn test_create_link_sorts_areas() {
    let command: CreateLink = CreateLink::new("fr", "de");

    assert_eq!(command.area1(), "de");
    assert_eq!(command.area2(), "fr");
    assert_eq!(Command::from(command).match_signature(), "create_link%de%fr");
}

#[test]
fn test_create_link_is_owned_by_first_area() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::LATEST);

    apply_ok(CreateLink::new("fr", "de"), &mut study, &ctx);

    assert!(study.config.areas["de"].links.contains_key("fr"));
    assert!(study.config.areas["fr"].links.is_empty());
    assert!(study.config.has_link("fr", "de"));
    let properties: Value = tree_get(&study, "input/links/de/properties/fr").unwrap();
    assert_eq!(properties["hurdles-cost"], json!(false));
    assert_eq!(properties["transmission-capacities"], json!("enabled"));
}

#[test]
fn test_create_link_writes_split_matrices_from_8_2() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::V8_2);

    apply_ok(CreateLink::new("de", "fr"), &mut study, &ctx);

    assert_eq!(
        tree_get(&study, "input/links/de/fr_parameters").unwrap(),
        json!(ctx.constants().link_v8.link())
    );
    assert_eq!(
        tree_get(&study, "input/links/de/capacities/fr_direct").unwrap(),
        json!(ctx.constants().link_capacity.link())
    );
    assert!(tree_get(&study, "input/links/de/fr").is_err());
}

#[test]
fn test_create_link_writes_single_series_before_8_2() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::V8_1);

    apply_ok(CreateLink::new("de", "fr"), &mut study, &ctx);

    assert_eq!(
        tree_get(&study, "input/links/de/fr").unwrap(),
        json!(ctx.constants().link_v7.link())
    );
    assert!(tree_get(&study, "input/links/de/capacities").is_err());
}

#[test]
fn test_create_link_rejects_capacities_before_8_2() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::V8_1);
    let dto: CommandDto = CommandDto::new(
        CommandName::CreateLink,
        args(json!({ "area1": "fr", "area2": "de", "direct": filled(8760, 1, 1.0) })),
        1,
    );
    let commands: Vec<Command> = CommandFactory::new(ctx.clone()).to_command(&dto).unwrap();

    let output: CommandOutput = commands[0].apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("8.2"));
    assert!(!study.config.has_link("de", "fr"));
}

#[test]
fn test_create_link_to_itself_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::LATEST);

    let output: CommandOutput = Command::from(CreateLink::new("fr", "fr")).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("same area"));
}

#[test]
fn test_create_link_with_unknown_area_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::LATEST);

    let output: CommandOutput = Command::from(CreateLink::new("fr", "it")).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("'it'"));
}

#[test]
fn test_create_link_twice_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);

    let output: CommandOutput = Command::from(CreateLink::new("de", "fr")).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("already exists"));
}

#[test]
fn test_create_link_rejects_nan_series() {
    let ctx: CommandContext = create_test_context();

    let result: Result<CreateLink, CommandError> = CreateLink::new("fr", "de")
        .with_series(MatrixInput::Values(vec![vec![1.0, f64::NAN]]), &ctx);

    assert!(matches!(result, Err(CommandError::InvalidMatrix { reason }) if reason.contains("NaN")));
}

#[test]
fn test_create_link_stores_literal_series() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::LATEST);
    let command: CreateLink = CreateLink::new("fr", "de")
        .with_series(MatrixInput::Values(filled(8760, 6, 2.0)), &ctx)
        .unwrap();
    let inner: Vec<String> = Command::from(command.clone()).get_inner_matrices();

    apply_ok(command, &mut study, &ctx);

    assert_eq!(inner.len(), 1);
    assert!(ctx.matrix_service().exists(&inner[0]));
    assert_eq!(
        tree_get(&study, "input/links/de/fr_parameters").unwrap(),
        json!(MatrixRef::new(&inner[0]).link())
    );
}

#[test]
fn test_remove_link_removes_referencing_constraints() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    let coeffs: BTreeMap<String, Vec<f64>> = BTreeMap::from([(String::from("de%fr"), vec![2.0])]);
    apply_ok(
        CreateBindingConstraint::new(
            "flow",
            BindingConstraintProperties::default(),
            coeffs,
            StudyVersion::LATEST,
        )
        .unwrap(),
        &mut study,
        &ctx,
    );

    apply_ok(RemoveLink::new("fr", "de"), &mut study, &ctx);

    assert!(!study.config.has_link("de", "fr"));
    assert!(study.config.bindings.is_empty());
    assert!(tree_get(&study, "input/links/de/properties/fr").is_err());
    assert!(tree_get(&study, "input/links/de/fr_parameters").is_err());
    assert!(tree_get(&study, "input/bindingconstraints/flow_eq").is_err());
}

#[test]
fn test_remove_missing_link_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_areas(&ctx, StudyVersion::LATEST);

    let output: CommandOutput = Command::from(RemoveLink::new("de", "fr")).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("does not exist"));
}

#[test]
fn test_create_link_diff_updates_properties_and_matrices() {
    let ctx: CommandContext = create_test_context();
    let mut parameters: Map<String, Value> = Map::new();
    parameters.insert(String::from("hurdles-cost"), json!(true));
    let base: Command = CreateLink::new("de", "fr").into();
    let changed: Command = CreateLink::new("de", "fr")
        .with_parameters(parameters)
        .with_series(MatrixInput::Values(filled(8760, 6, 3.0)), &ctx)
        .unwrap()
        .into();

    let diff: Vec<Command> = base.create_diff(&changed, StudyVersion::LATEST, &ctx);

    assert_eq!(diff.len(), 2);
    let update: &UpdateConfig = diff[0].as_update_config().unwrap();
    assert_eq!(update.target(), "input/links/de/properties/fr");
    assert_eq!(update.data()["hurdles-cost"], json!(true));
    assert_eq!(update.data()["loop-flow"], json!(false));
    let replace: &ReplaceMatrix = diff[1].as_replace_matrix().unwrap();
    assert_eq!(replace.target(), "input/links/de/fr_parameters");
}

#[test]
fn test_identical_links_have_empty_diff() {
    let ctx: CommandContext = create_test_context();
    let link: Command = CreateLink::new("de", "fr").into();

    assert!(link.create_diff(&link, StudyVersion::LATEST, &ctx).is_empty());
}
