// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{args, create_test_context, create_test_study};
use crate::{
    COMMAND_VERSION, Command, CommandArgs, CommandContext, CommandDto, CommandError, CommandName,
    CommandResultDetail, CreateArea, CreateLink, FailurePolicy, GenerationResult, UpdateComments,
    VariantCommandGenerator,
};
use antares_study::{FileStudy, StudyVersion};
use serde_json::{Map, json};

/// Three commands where the second one fails: the link targets an unknown area.
fn commands_with_failure() -> Vec<Command> {
    vec![
        CreateArea::new("fr").unwrap().into(),
        CreateLink::new("fr", "it").into(),
        UpdateComments::new("done").into(),
    ]
}

#[test]
fn test_generate_applies_every_command() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    let commands: Vec<Command> = vec![
        CreateArea::new("fr").unwrap().into(),
        CreateArea::new("it").unwrap().into(),
        CreateLink::new("fr", "it").into(),
    ];

    let result: GenerationResult =
        VariantCommandGenerator::new(ctx).generate(&commands, &mut study, FailurePolicy::Abort);

    assert!(result.success);
    assert_eq!(result.details.len(), 3);
    assert!(result.first_failure().is_none());
    assert_eq!(result.details[2].name, "create_link");
    assert_eq!(result.details[2].signature, "create_link%fr%it");
    assert!(study.config.has_link("fr", "it"));
}

#[test]
fn test_generate_abort_stops_at_first_failure() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);

    let result: GenerationResult = VariantCommandGenerator::new(ctx).generate(
        &commands_with_failure(),
        &mut study,
        FailurePolicy::Abort,
    );

    assert!(!result.success);
    assert_eq!(result.details.len(), 2);
    let failure: &CommandResultDetail = result.first_failure().unwrap();
    assert_eq!(failure.index, 1);
    assert!(failure.message.contains("does not exist"), "{}", failure.message);
    assert!(study.tree.get(&["settings", "comments"]).is_err());
}

#[test]
fn test_generate_continue_reports_every_command() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);

    let result: GenerationResult = VariantCommandGenerator::new(ctx).generate(
        &commands_with_failure(),
        &mut study,
        FailurePolicy::Continue,
    );

    assert!(!result.success);
    let statuses: Vec<bool> = result.details.iter().map(|detail| detail.status).collect();
    assert_eq!(statuses, vec![true, false, true]);
    assert_eq!(result.first_failure().map(|detail| detail.index), Some(1));
    assert_eq!(
        study.tree.get(&["settings", "comments"]).unwrap(),
        json!("done")
    );
}

#[test]
fn test_generate_from_dtos() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    let dtos: Vec<CommandDto> = vec![
        CommandDto::new(
            CommandName::CreateArea,
            args(json!({ "area_name": "fr" })),
            COMMAND_VERSION,
        ),
        CommandDto::new(
            CommandName::UpdateComments,
            args(json!({ "comments": "hello" })),
            COMMAND_VERSION,
        ),
    ];

    let result: GenerationResult = VariantCommandGenerator::new(ctx)
        .generate_from_dtos(&dtos, &mut study, FailurePolicy::Abort)
        .unwrap();

    assert!(result.success);
    assert!(study.config.areas.contains_key("fr"));
}

#[test]
fn test_generate_from_dtos_applies_nothing_on_bad_dto() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    let dtos: Vec<CommandDto> = vec![
        CommandDto::new(
            CommandName::CreateArea,
            args(json!({ "area_name": "fr" })),
            COMMAND_VERSION,
        ),
        CommandDto {
            action: String::from("create_planet"),
            args: CommandArgs::Single(Map::new()),
            version: COMMAND_VERSION,
        },
    ];

    let result: Result<GenerationResult, CommandError> = VariantCommandGenerator::new(ctx)
        .generate_from_dtos(&dtos, &mut study, FailurePolicy::Continue);

    assert!(matches!(result, Err(CommandError::NotImplemented(_))));
    assert!(study.config.areas.is_empty());
}
