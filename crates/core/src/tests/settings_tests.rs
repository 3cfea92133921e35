// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Raw configuration, matrices, comments, playlist and scenario builder.

use crate::tests::helpers::{
    apply_ok, args, create_test_context, create_test_study, filled, tree_get,
};
use crate::{
    Command, CommandArgs, CommandContext, CommandDto, CommandError, CommandFactory, CommandName,
    CommandOutput, CreateArea, ReplaceMatrix, UpdateComments, UpdateConfig, UpdatePlaylist,
    UpdateRawFile, UpdateScenarioBuilder,
};
use antares_study::{FileStudy, MatrixRef, StudyVersion};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

fn build(ctx: &CommandContext, action: CommandName, value: Value) -> Result<Command, CommandError> {
    let dto: CommandDto = CommandDto::new(action, args(value), 1);
    CommandFactory::new(ctx.clone())
        .to_command(&dto)
        .map(|mut commands| commands.remove(0))
}

// ============================================================================
// UpdateConfig / UpdateComments / UpdateRawFile
// ============================================================================

#[test]
fn test_update_config_normalizes_target() {
    let command: UpdateConfig = UpdateConfig::new("/settings//generaldata/", json!({}));

    assert_eq!(command.target(), "settings/generaldata");
    assert!(command.is_ancestor_of("settings/generaldata/general"));
    assert!(!command.is_ancestor_of("settings/generaldata"));
    assert!(!command.is_ancestor_of("settings/generaldata2"));
}

#[test]
fn test_update_config_replaces_node() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(
        UpdateConfig::new("settings/generaldata/general", json!({ "nbyears": 2, "mode": "Economy" })),
        &mut study,
        &ctx,
    );

    apply_ok(
        UpdateConfig::new("settings/generaldata/general", json!({ "nbyears": 5 })),
        &mut study,
        &ctx,
    );

    assert_eq!(
        tree_get(&study, "settings/generaldata/general").unwrap(),
        json!({ "nbyears": 5 })
    );
}

#[test]
fn test_update_config_with_empty_target_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);

    let output: CommandOutput = Command::from(UpdateConfig::new("/", json!(1))).apply(&mut study, &ctx);

    assert!(!output.status);
}

#[test]
fn test_update_comments() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);

    apply_ok(UpdateComments::new("a study"), &mut study, &ctx);

    assert_eq!(tree_get(&study, "settings/comments").unwrap(), json!("a study"));
    assert_eq!(
        Command::from(UpdateComments::new("x")).match_signature(),
        "update_comments"
    );
}

#[test]
fn test_update_raw_file_decodes_base64() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    let command: Command = build(
        &ctx,
        CommandName::UpdateRawFile,
        json!({ "target": "user/notes.txt", "b64Data": "aGVsbG8=" }),
    )
    .unwrap();

    apply_ok(command.clone(), &mut study, &ctx);

    assert_eq!(tree_get(&study, "user/notes.txt").unwrap(), json!("hello"));
    assert_eq!(
        command.to_dto().args,
        CommandArgs::Single(args(json!({
            "target": "user/notes.txt",
            "b64Data": "aGVsbG8=",
        })))
    );
}

#[test]
fn test_update_raw_file_rejects_invalid_base64() {
    let result: Result<UpdateRawFile, CommandError> = UpdateRawFile::from_b64("user/a", "%%%");

    assert!(matches!(result, Err(CommandError::Validation { .. })));
}

#[test]
fn test_update_raw_file_cannot_replace_folder() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(UpdateConfig::new("user/folder/file", json!("x")), &mut study, &ctx);

    let output: CommandOutput =
        Command::from(UpdateRawFile::new("user/folder", "text")).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("folder"));
}

// ============================================================================
// ReplaceMatrix
// ============================================================================

#[test]
fn test_replace_matrix_points_node_at_new_matrix() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(CreateArea::new("fr").unwrap(), &mut study, &ctx);
    let command: Command = build(
        &ctx,
        CommandName::ReplaceMatrix,
        json!({ "target": "input/load/series/load_fr", "matrix": filled(8760, 1, 3.0) }),
    )
    .unwrap();
    let id: String = command.get_inner_matrices().remove(0);

    apply_ok(command, &mut study, &ctx);

    assert_eq!(
        tree_get(&study, "input/load/series/load_fr").unwrap(),
        json!(MatrixRef::new(&id).link())
    );
    assert_eq!(ctx.matrix_service().get(&id), Some(filled(8760, 1, 3.0)));
}

#[test]
fn test_replace_matrix_on_missing_path_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    let command: ReplaceMatrix =
        ReplaceMatrix::new("input/load/series/load_fr", ctx.constants().null_matrix.clone());

    let output: CommandOutput = Command::from(command).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("does not exist"));
}

#[test]
fn test_replace_matrix_accepts_protocol_links() {
    let ctx: CommandContext = create_test_context();
    let link: String = ctx.constants().misc_gen.link();

    let command: Command = build(
        &ctx,
        CommandName::ReplaceMatrix,
        json!({ "target": "input/misc-gen/miscgen-fr", "matrix": link }),
    )
    .unwrap();

    assert_eq!(
        command.get_inner_matrices(),
        vec![ctx.constants().misc_gen.id().to_string()]
    );
    assert_eq!(
        command.to_dto().args,
        CommandArgs::Single(args(json!({
            "target": "input/misc-gen/miscgen-fr",
            "matrix": ctx.constants().misc_gen.id(),
        })))
    );
}

// ============================================================================
// Playlist
// ============================================================================

#[test]
fn test_update_playlist_writes_zero_based_years() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);

    apply_ok(
        UpdatePlaylist::new(
            true,
            Some(vec![1, 3]),
            Some(BTreeMap::from([(2, 0.5)])),
            false,
        ),
        &mut study,
        &ctx,
    );

    assert_eq!(
        tree_get(&study, "settings/generaldata/general/user-playlist").unwrap(),
        json!(true)
    );
    let playlist: Value = tree_get(&study, "settings/generaldata/playlist").unwrap();
    assert_eq!(playlist["playlist_reset"], json!(false));
    assert_eq!(playlist["playlist_year +"], json!([0, 2]));
    assert_eq!(playlist["playlist_year_weight"], json!(["1,0.5"]));
}

#[test]
fn test_update_playlist_reverse_lists_excluded_years() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);

    apply_ok(
        UpdatePlaylist::new(true, Some(vec![2]), None, true),
        &mut study,
        &ctx,
    );

    let playlist: Value = tree_get(&study, "settings/generaldata/playlist").unwrap();
    assert_eq!(playlist["playlist_reset"], json!(true));
    assert_eq!(playlist["playlist_year -"], json!([1]));
    assert!(playlist.get("playlist_year +").is_none());
}

#[test]
fn test_update_playlist_keeps_other_general_data() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(
        UpdateConfig::new("settings/generaldata/general", json!({ "nbyears": 4 })),
        &mut study,
        &ctx,
    );

    apply_ok(UpdatePlaylist::new(false, None, None, false), &mut study, &ctx);

    assert_eq!(
        tree_get(&study, "settings/generaldata/general").unwrap(),
        json!({ "nbyears": 4, "user-playlist": false })
    );
}

#[test]
fn test_update_playlist_rejects_year_zero() {
    let ctx: CommandContext = create_test_context();

    let result: Result<Command, CommandError> = build(
        &ctx,
        CommandName::UpdatePlaylist,
        json!({ "active": true, "items": [0, 1] }),
    );

    assert!(matches!(result, Err(CommandError::Validation { .. })));
}

// ============================================================================
// Scenario builder
// ============================================================================

fn rulesets(value: Value) -> Map<String, Value> {
    args(value)
}

#[test]
fn test_update_scenario_builder_merges_rules() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(
        UpdateScenarioBuilder::new(rulesets(json!({
            "Default Ruleset": { "l,fr,0": 1, "l,de,0": 2 },
            "Other": { "w,fr,0": 1 },
        }))),
        &mut study,
        &ctx,
    );

    apply_ok(
        UpdateScenarioBuilder::new(rulesets(json!({
            "Default Ruleset": { "l,fr,0": 3, "l,de,0": null },
            "Other": null,
        }))),
        &mut study,
        &ctx,
    );

    assert_eq!(
        tree_get(&study, "settings/scenariobuilder").unwrap(),
        json!({ "Default Ruleset": { "l,fr,0": 3 } })
    );
}

#[test]
fn test_update_scenario_builder_rejects_scalar_ruleset() {
    let ctx: CommandContext = create_test_context();

    let result: Result<Command, CommandError> = build(
        &ctx,
        CommandName::UpdateScenarioBuilder,
        json!({ "data": { "Default Ruleset": 3 } }),
    );

    assert!(matches!(result, Err(CommandError::Validation { .. })));
}
