// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    apply_all, apply_ok, args, create_test_context, create_test_study, create_two_area_study,
    filled,
};
use crate::{
    BindingConstraintProperties, Command, CommandContext, CommandReverter, CreateArea,
    CreateBindingConstraint, CreateCluster, CreateLink, RemoveArea, RemoveBindingConstraint,
    RemoveCluster, RemoveLink, ReplaceMatrix, UpdateBindingConstraint, UpdateComments,
    UpdateConfig, UpdatePlaylist, UpdateScenarioBuilder,
};
use antares_study::{FileStudy, JsonTree, MatrixRef, StudyConfig, StudyVersion};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

fn revert(
    ctx: &CommandContext,
    command: impl Into<Command>,
    history: &[Command],
    base: &FileStudy,
) -> Vec<Command> {
    CommandReverter::new(ctx.clone())
        .revert(&command.into(), history, base)
        .unwrap()
}

// ==========================================================================
// Creations and removals
// ==========================================================================

#[test]
fn test_revert_creations_are_removals() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_test_study(StudyVersion::LATEST);

    assert_eq!(
        revert(&ctx, CreateArea::new("FR").unwrap(), &[], &base),
        vec![Command::from(RemoveArea::new("fr"))]
    );
    assert_eq!(
        revert(&ctx, CreateLink::new("fr", "de"), &[], &base),
        vec![Command::from(RemoveLink::new("de", "fr"))]
    );
    assert_eq!(
        revert(
            &ctx,
            CreateCluster::new("fr", "Gas", Map::new()).unwrap(),
            &[],
            &base
        ),
        vec![Command::from(RemoveCluster::new("fr", "gas"))]
    );
    assert_eq!(
        revert(
            &ctx,
            CreateBindingConstraint::new(
                "Flow",
                BindingConstraintProperties::default(),
                BTreeMap::new(),
                StudyVersion::LATEST,
            )
            .unwrap(),
            &[],
            &base
        ),
        vec![Command::from(RemoveBindingConstraint::new("flow"))]
    );
}

#[test]
fn test_revert_removal_uses_last_creation_in_history() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_test_study(StudyVersion::LATEST);
    let first: Command = CreateCluster::new("fr", "gas", args(json!({ "unitcount": 1 })))
        .unwrap()
        .into();
    let second: Command = CreateCluster::new("fr", "gas", args(json!({ "unitcount": 4 })))
        .unwrap()
        .into();
    let history: Vec<Command> = vec![
        first,
        Command::from(RemoveCluster::new("fr", "gas")),
        second.clone(),
    ];

    let reverted: Vec<Command> = revert(&ctx, RemoveCluster::new("fr", "gas"), &history, &base);

    assert_eq!(reverted, vec![second]);
}

#[test]
fn test_revert_removal_extracts_from_base() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);

    let reverted: Vec<Command> = revert(&ctx, RemoveArea::new("fr"), &[], &base);

    assert_eq!(
        reverted[0].as_create_area().map(CreateArea::area_id),
        Some(String::from("fr"))
    );

    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    apply_ok(RemoveArea::new("fr"), &mut study, &ctx);
    assert!(!study.config.areas.contains_key("fr"));

    for output in apply_all(&reverted, &mut study, &ctx) {
        assert!(output.status, "{}", output.message);
    }
    assert!(study.config.areas.contains_key("fr"));
    assert!(study.config.has_link("de", "fr"));
}

#[test]
fn test_revert_removal_of_unknown_entity_is_empty() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);

    assert!(revert(&ctx, RemoveArea::new("it"), &[], &base).is_empty());
    assert!(revert(&ctx, RemoveLink::new("fr", "it"), &[], &base).is_empty());
    assert!(revert(&ctx, RemoveBindingConstraint::new("flow"), &[], &base).is_empty());
}

#[test]
fn test_revert_link_removal_extracts_link() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);

    let reverted: Vec<Command> = revert(&ctx, RemoveLink::new("fr", "de"), &[], &base);

    assert_eq!(reverted.len(), 1);
    let link: &CreateLink = reverted[0].as_create_link().unwrap();
    assert_eq!((link.area1(), link.area2()), ("de", "fr"));
}

// ==========================================================================
// Updates
// ==========================================================================

#[test]
fn test_revert_binding_constraint_update_from_creation() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_test_study(StudyVersion::LATEST);
    let create: CreateBindingConstraint = CreateBindingConstraint::new(
        "Flow",
        BindingConstraintProperties::default(),
        BTreeMap::from([(String::from("de%fr"), vec![1.0])]),
        StudyVersion::LATEST,
    )
    .unwrap();
    let update: UpdateBindingConstraint = UpdateBindingConstraint::new(
        "flow",
        BindingConstraintProperties {
            enabled: Some(false),
            ..BindingConstraintProperties::default()
        },
        None,
        StudyVersion::LATEST,
    )
    .unwrap();

    let reverted: Vec<Command> =
        revert(&ctx, update.clone(), &[create.clone().into()], &base);
    assert_eq!(reverted, vec![Command::from(create.to_update())]);

    let history: Vec<Command> = vec![create.into(), update.clone().into()];
    let reverted: Vec<Command> = revert(&ctx, update.clone(), &history, &base);
    assert_eq!(reverted, vec![Command::from(update)]);
}

#[test]
fn test_revert_update_config_replays_anchor_and_descendants() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_test_study(StudyVersion::LATEST);
    let anchor: Command =
        UpdateConfig::new("settings/generaldata", json!({ "general": { "nbyears": 2 } })).into();
    let unrelated: Command = UpdateConfig::new("settings/resources/study", json!({})).into();
    let descendant: Command =
        UpdateConfig::new("settings/generaldata/general/nbyears", json!(5)).into();
    let history: Vec<Command> = vec![anchor.clone(), unrelated, descendant.clone()];

    let reverted: Vec<Command> = revert(
        &ctx,
        UpdateConfig::new("settings/generaldata/general", json!({})),
        &history,
        &base,
    );

    assert_eq!(reverted, vec![anchor, descendant]);
}

#[test]
fn test_revert_update_config_reads_base() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = FileStudy::new(
        StudyConfig::new(StudyVersion::LATEST),
        JsonTree::from_value(json!({
            "settings": { "generaldata": { "general": { "nbyears": 3 } } }
        })),
    );

    let reverted: Vec<Command> = revert(
        &ctx,
        UpdateConfig::new("settings/generaldata/general", json!({ "nbyears": 8 })),
        &[],
        &base,
    );
    let missing: Vec<Command> = revert(
        &ctx,
        UpdateConfig::new("settings/resources/study", json!({})),
        &[],
        &base,
    );

    assert_eq!(
        reverted,
        vec![Command::from(UpdateConfig::new(
            "settings/generaldata/general",
            json!({ "nbyears": 3 })
        ))]
    );
    assert!(missing.is_empty());
}

#[test]
fn test_revert_replace_matrix_tiers() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = FileStudy::new(
        StudyConfig::new(StudyVersion::LATEST),
        JsonTree::from_value(json!({
            "input": { "load": { "series": { "load_fr": filled(2, 1, 7.0) } } }
        })),
    );
    let target: &str = "input/load/series/load_fr";
    let replacement: MatrixRef = ctx.constants().null_matrix.clone();
    let previous: Command = ReplaceMatrix::new(target, ctx.constants().reserves.clone()).into();

    let from_history: Vec<Command> = revert(
        &ctx,
        ReplaceMatrix::new(target, replacement.clone()),
        &[previous.clone()],
        &base,
    );
    let from_base: Vec<Command> =
        revert(&ctx, ReplaceMatrix::new(target, replacement.clone()), &[], &base);
    let absent: Vec<Command> = revert(
        &ctx,
        ReplaceMatrix::new("input/load/series/load_de", replacement),
        &[],
        &base,
    );

    assert_eq!(from_history, vec![previous]);
    let restored: &ReplaceMatrix = from_base[0].as_replace_matrix().unwrap();
    assert_eq!(
        ctx.matrix_service().get(restored.matrix().id()),
        Some(filled(2, 1, 7.0))
    );
    assert!(absent.is_empty());
}

#[test]
fn test_revert_comments_and_playlist() {
    let ctx: CommandContext = create_test_context();
    let base: FileStudy = create_test_study(StudyVersion::LATEST);
    let previous: Command = UpdateComments::new("first").into();

    assert_eq!(
        revert(&ctx, UpdateComments::new("second"), &[previous.clone()], &base),
        vec![previous]
    );
    assert!(revert(&ctx, UpdateComments::new("second"), &[], &base).is_empty());
    assert!(
        revert(
            &ctx,
            UpdatePlaylist::new(true, Some(vec![1]), None, false),
            &[],
            &base
        )
        .is_empty()
    );
}

#[test]
fn test_revert_scenario_builder_restores_touched_rules() {
    let ctx: CommandContext = create_test_context();
    let mut base: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(
        UpdateScenarioBuilder::new(args(json!({
            "Default Ruleset": { "l,fr,0": 1, "l,de,0": 1 }
        }))),
        &mut base,
        &ctx,
    );
    let update: UpdateScenarioBuilder = UpdateScenarioBuilder::new(args(json!({
        "Default Ruleset": { "l,fr,0": 2, "t,fr,0,gas": 3 },
        "Other": { "l,fr,0": 1 }
    })));

    let reverted: Vec<Command> = revert(&ctx, update, &[], &base);

    let data: &Map<String, Value> = reverted[0].as_update_scenario_builder().unwrap().data();
    assert_eq!(
        Value::Object(data.clone()),
        json!({
            "Default Ruleset": { "l,fr,0": 1, "l,de,0": 1, "t,fr,0,gas": null },
            "Other": null
        })
    );
}
