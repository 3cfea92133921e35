// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    apply_all, apply_ok, args, create_test_context, create_test_study, create_two_area_study,
    filled, tree_root,
};
use crate::{
    BindingConstraintProperties, Command, CommandContext, CommandError, CommandExtractor,
    CommandOutput, CreateBindingConstraint, CreateCluster, CreateDistrict, CreateLink,
    CreateRenewablesCluster, CreateStStorage, DistrictBaseFilter, UpdateComments,
    UpdatePlaylist, UpdateScenarioBuilder,
};
use antares_study::{FileStudy, JsonTree, MatrixRef, StudyConfig, StudyVersion};
use serde_json::{Map, json};
use std::collections::BTreeMap;

/// A study touching every kind of entity the extractor handles.
fn create_rich_study(ctx: &CommandContext) -> FileStudy {
    let mut study: FileStudy = create_two_area_study(ctx, StudyVersion::LATEST);
    let commands: Vec<Command> = vec![
        CreateCluster::new("fr", "Gas", args(json!({ "unitcount": 2 })))
            .unwrap()
            .into(),
        CreateRenewablesCluster::new("de", "PV", Map::new()).unwrap().into(),
        CreateStStorage::new("de", args(json!({ "name": "Battery" })), ctx)
            .unwrap()
            .into(),
        CreateDistrict::new(
            "North",
            DistrictBaseFilter::RemoveAll,
            vec![String::from("de")],
            true,
            "north",
        )
        .unwrap()
        .into(),
        CreateBindingConstraint::new(
            "Flow",
            BindingConstraintProperties::default(),
            BTreeMap::from([
                (String::from("de%fr"), vec![1.0, 2.0]),
                (String::from("fr.gas"), vec![0.5]),
            ]),
            StudyVersion::LATEST,
        )
        .unwrap()
        .into(),
        UpdateComments::new("rich study").into(),
        UpdatePlaylist::new(true, Some(vec![1, 2]), None, false).into(),
        UpdateScenarioBuilder::new(args(json!({ "Default Ruleset": { "l,fr,0": 1 } }))).into(),
    ];
    for output in apply_all(&commands, &mut study, ctx) {
        assert!(output.status, "{}", output.message);
    }
    study
}

fn replay(commands: &[Command], version: StudyVersion, ctx: &CommandContext) -> FileStudy {
    let mut study: FileStudy = create_test_study(version);
    for (command, output) in commands.iter().zip(apply_all(commands, &mut study, ctx)) {
        assert!(output.status, "{}: {}", command.match_signature(), output.message);
    }
    study
}

#[test]
fn test_extracted_commands_rebuild_the_study() {
    let ctx: CommandContext = create_test_context();
    let study: FileStudy = create_rich_study(&ctx);

    let commands: Vec<Command> = CommandExtractor::new(ctx.clone()).extract(&study).unwrap();
    let rebuilt: FileStudy = replay(&commands, StudyVersion::LATEST, &ctx);

    assert_eq!(tree_root(&rebuilt), tree_root(&study));
    assert_eq!(rebuilt.config, study.config);
}

#[test]
fn test_extraction_follows_study_version() {
    let ctx: CommandContext = create_test_context();

    for version in [StudyVersion::V7_0, StudyVersion::V8_2, StudyVersion::V8_6] {
        let mut study: FileStudy = create_two_area_study(&ctx, version);
        apply_ok(
            CreateCluster::new("fr", "gas", Map::new()).unwrap(),
            &mut study,
            &ctx,
        );

        let commands: Vec<Command> = CommandExtractor::new(ctx.clone()).extract(&study).unwrap();
        let rebuilt: FileStudy = replay(&commands, version, &ctx);

        assert_eq!(tree_root(&rebuilt), tree_root(&study), "version {version}");
    }
}

#[test]
fn test_extract_area_includes_links_owned_by_other_areas() {
    let ctx: CommandContext = create_test_context();
    let study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);

    let commands: Vec<Command> = CommandExtractor::new(ctx)
        .extract_area(&study, "fr")
        .unwrap();

    assert_eq!(
        commands[0].as_create_area().map(|c| c.area_id()),
        Some(String::from("fr"))
    );
    let link: &CreateLink = commands
        .iter()
        .find_map(Command::as_create_link)
        .unwrap();
    assert_eq!((link.area1(), link.area2()), ("de", "fr"));
}

#[test]
fn test_extract_missing_entities_is_not_found() {
    let ctx: CommandContext = create_test_context();
    let study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    let extractor: CommandExtractor = CommandExtractor::new(ctx);

    let errors: Vec<CommandError> = vec![
        extractor.extract_area(&study, "it").unwrap_err(),
        extractor.extract_link(&study, "fr", "it").unwrap_err(),
        extractor.extract_cluster(&study, "fr", "gas").unwrap_err(),
        extractor.extract_district(&study, "north").unwrap_err(),
        extractor.extract_binding_constraint(&study, "flow").unwrap_err(),
        extractor.extract_comments(&study).unwrap_err(),
    ];

    for err in errors {
        assert!(err.is_not_found(), "{err}");
    }
}

#[test]
fn test_extract_binding_constraint_reads_terms() {
    let ctx: CommandContext = create_test_context();
    let study: FileStudy = create_rich_study(&ctx);

    let commands: Vec<Command> = CommandExtractor::new(ctx.clone())
        .extract_binding_constraint(&study, "flow")
        .unwrap();

    let command: &CreateBindingConstraint = commands[0].as_create_binding_constraint().unwrap();
    assert_eq!(command.name(), "Flow");
    assert_eq!(command.coeffs()["de%fr"], vec![1.0, 2.0]);
    assert_eq!(command.coeffs()["fr.gas"], vec![0.5]);
    assert_eq!(command.properties().group, Some(String::from("default")));
}

#[test]
fn test_extract_playlist_reads_one_based_years() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    let playlist: UpdatePlaylist =
        UpdatePlaylist::new(true, Some(vec![1, 4]), Some(BTreeMap::from([(4, 2.0)])), true);
    apply_ok(playlist.clone(), &mut study, &ctx);

    let extracted: Command = CommandExtractor::new(ctx).extract_playlist(&study).unwrap();

    assert_eq!(extracted, Command::from(playlist));
}

#[test]
fn test_generate_replace_matrix_stores_literal_matrices() {
    let ctx: CommandContext = create_test_context();
    let study: FileStudy = FileStudy::new(
        StudyConfig::new(StudyVersion::LATEST),
        JsonTree::from_value(json!({
            "input": { "load": { "series": { "load_fr": filled(3, 2, 1.5) } } }
        })),
    );

    let command: Command = CommandExtractor::new(ctx.clone())
        .generate_replace_matrix(study.tree.as_ref(), "input/load/series/load_fr", None)
        .unwrap();

    let id: String = command.get_inner_matrices().remove(0);
    assert_eq!(ctx.matrix_service().get(&id), Some(filled(3, 2, 1.5)));
}

#[test]
fn test_generate_replace_matrix_falls_back_to_default() {
    let ctx: CommandContext = create_test_context();
    let study: FileStudy = create_test_study(StudyVersion::LATEST);
    let extractor: CommandExtractor = CommandExtractor::new(ctx.clone());
    let default: MatrixRef = ctx.constants().reserves.clone();

    let command: Command = extractor
        .generate_replace_matrix(study.tree.as_ref(), "input/reserves/fr", Some(&default))
        .unwrap();
    let missing: Result<Command, CommandError> =
        extractor.generate_replace_matrix(study.tree.as_ref(), "input/reserves/fr", None);

    assert_eq!(command.as_replace_matrix().unwrap().matrix(), &default);
    assert!(matches!(missing, Err(CommandError::InvalidMatrix { .. })));
}

#[test]
fn test_generate_update_rawfile_requires_text() {
    let ctx: CommandContext = create_test_context();
    let study: FileStudy = FileStudy::new(
        StudyConfig::new(StudyVersion::LATEST),
        JsonTree::from_value(json!({ "user": { "notes.txt": "hi", "folder": {} } })),
    );
    let extractor: CommandExtractor = CommandExtractor::new(ctx.clone());

    let command: Command = extractor
        .generate_update_rawfile(study.tree.as_ref(), "user/notes.txt")
        .unwrap();
    let folder: Result<Command, CommandError> =
        extractor.generate_update_rawfile(study.tree.as_ref(), "user/folder");

    assert_eq!(command.as_update_raw_file().unwrap().content(), "hi");
    assert!(matches!(folder, Err(CommandError::Validation { .. })));

    let mut copy: FileStudy = create_test_study(StudyVersion::LATEST);
    let output: CommandOutput = command.apply(&mut copy, &ctx);
    assert!(output.status);
}
