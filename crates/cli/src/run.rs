// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::archive::{CommandBundle, StudyArchive, context_with};
use antares_study::{FileStudy, Matrix};
use antares_variant::{
    Command, CommandContext, CommandExtractor, CommandFactory, FailurePolicy, GenerationResult,
    VariantCommandGenerator, VariantCommandsExtractor,
};
use color_eyre::Result;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A study after a replay, with the replay report.
#[derive(Debug, Clone, Serialize)]
pub struct Replay {
    pub report: GenerationResult,
    pub archive: StudyArchive,
}

/// One generated variant.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedVariant {
    pub name: String,
    #[serde(flatten)]
    pub replay: Replay,
}

/// The command list rebuilding the archived study.
///
/// # Errors
///
/// Returns an error if the study cannot be extracted.
pub fn extract(archive: &StudyArchive) -> Result<CommandBundle> {
    let ctx: CommandContext = context_with(&[&archive.matrices]);
    let study: FileStudy = archive.study();

    let commands: Vec<Command> = CommandExtractor::new(ctx.clone()).extract(&study)?;
    info!(count = commands.len(), "Extracted study");
    CommandBundle::capture(&commands, ctx.matrix_service())
}

/// Applies `bundle` to the archived study.
///
/// # Errors
///
/// Returns an error if a command cannot be built or the result cannot be
/// captured. Failed commands are reported, not raised.
pub fn apply(
    archive: &StudyArchive,
    bundle: &CommandBundle,
    policy: FailurePolicy,
) -> Result<Replay> {
    let ctx: CommandContext = context_with(&[&archive.matrices, &bundle.matrices]);
    replay(archive, bundle, &ctx, policy)
}

fn replay(
    archive: &StudyArchive,
    bundle: &CommandBundle,
    ctx: &CommandContext,
    policy: FailurePolicy,
) -> Result<Replay> {
    let mut study: FileStudy = archive.study();
    let report: GenerationResult = VariantCommandGenerator::new(ctx.clone()).generate_from_dtos(
        &bundle.commands,
        &mut study,
        policy,
    )?;
    if let Some(failure) = report.first_failure() {
        warn!(
            index = failure.index,
            signature = %failure.signature,
            message = %failure.message,
            "Replay failed"
        );
    }

    Ok(Replay {
        report,
        archive: StudyArchive::capture(&study, ctx.matrix_service())?,
    })
}

/// The commands turning the `base` list into the `variant` list, both
/// applying to the archived study.
///
/// # Errors
///
/// Returns an error if a command cannot be built or reverted.
pub fn diff(
    archive: &StudyArchive,
    base: &CommandBundle,
    variant: &CommandBundle,
) -> Result<CommandBundle> {
    let ctx: CommandContext =
        context_with(&[&archive.matrices, &base.matrices, &variant.matrices]);
    let study: FileStudy = archive.study();

    let factory: CommandFactory = CommandFactory::new(ctx.clone());
    let base_commands: Vec<Command> = factory.to_commands(&base.commands)?;
    let variant_commands: Vec<Command> = factory.to_commands(&variant.commands)?;

    let commands: Vec<Command> = VariantCommandsExtractor::new(ctx.clone()).diff_commands(
        &base_commands,
        &variant_commands,
        &study,
    )?;
    CommandBundle::capture(&commands, ctx.matrix_service())
}

/// Replays every variant against its own copy of the archived study.
///
/// Variants run concurrently, each on a blocking task, and share one matrix
/// store.
///
/// # Errors
///
/// Returns an error if a variant cannot be replayed or its task panics.
pub async fn generate(
    archive: StudyArchive,
    variants: Vec<(String, CommandBundle)>,
    policy: FailurePolicy,
) -> Result<Vec<GeneratedVariant>> {
    let mut sources: Vec<&BTreeMap<String, Matrix>> = vec![&archive.matrices];
    sources.extend(variants.iter().map(|(_, bundle)| &bundle.matrices));
    let ctx: CommandContext = context_with(&sources);
    let archive: Arc<StudyArchive> = Arc::new(archive);

    let handles: Vec<JoinHandle<Result<GeneratedVariant>>> = variants
        .into_iter()
        .map(|(name, bundle)| {
            let ctx: CommandContext = ctx.clone();
            let archive: Arc<StudyArchive> = archive.clone();
            tokio::task::spawn_blocking(move || {
                info!(variant = %name, commands = bundle.commands.len(), "Generating variant");
                let outcome: Replay = replay(&archive, &bundle, &ctx, policy)?;
                Ok(GeneratedVariant {
                    name,
                    replay: outcome,
                })
            })
        })
        .collect();

    let mut generated: Vec<GeneratedVariant> = Vec::with_capacity(handles.len());
    for joined in join_all(handles).await {
        generated.push(joined??);
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use antares_study::{Area, StudyConfig, StudyVersion};
    use antares_variant::{CreateArea, CreateLink, RemoveArea, UpdateComments};

    fn empty_archive() -> StudyArchive {
        StudyArchive::empty(StudyConfig::new(StudyVersion::LATEST))
    }

    fn bundle(commands: &[Command]) -> CommandBundle {
        let ctx: CommandContext = context_with(&[]);
        CommandBundle::capture(commands, ctx.matrix_service()).unwrap()
    }

    fn two_areas() -> Vec<Command> {
        vec![
            CreateArea::new("fr").unwrap().into(),
            CreateArea::new("de").unwrap().into(),
            CreateLink::new("fr", "de").into(),
        ]
    }

    #[test]
    fn test_apply_then_extract_rebuilds_the_study() {
        let built: Replay =
            apply(&empty_archive(), &bundle(&two_areas()), FailurePolicy::Abort).unwrap();
        assert!(built.report.success);

        let extracted: CommandBundle = extract(&built.archive).unwrap();
        let rebuilt: Replay =
            apply(&empty_archive(), &extracted, FailurePolicy::Abort).unwrap();

        assert!(rebuilt.report.success);
        assert_eq!(rebuilt.archive.tree, built.archive.tree);
        assert_eq!(rebuilt.archive.config, built.archive.config);
    }

    #[test]
    fn test_apply_reports_failures() {
        let commands: Vec<Command> = vec![
            CreateLink::new("fr", "de").into(),
            UpdateComments::new("after").into(),
        ];

        let outcome: Replay =
            apply(&empty_archive(), &bundle(&commands), FailurePolicy::Continue).unwrap();

        assert!(!outcome.report.success);
        assert_eq!(outcome.report.details.len(), 2);
        assert!(outcome.report.details[1].status);
    }

    #[test]
    fn test_diff_produces_replayable_bundle() {
        let base: Vec<Command> = two_areas();
        let mut variant: Vec<Command> = two_areas();
        variant.push(UpdateComments::new("variant").into());
        variant.push(RemoveArea::new("de").into());

        let computed: CommandBundle =
            diff(&empty_archive(), &bundle(&base), &bundle(&variant)).unwrap();

        let actions: Vec<&str> = computed.commands.iter().map(|dto| dto.action.as_str()).collect();
        assert_eq!(actions, vec!["update_comments", "remove_area"]);
    }

    #[tokio::test]
    async fn test_generate_runs_variants_independently() {
        let variants: Vec<(String, CommandBundle)> = vec![
            (String::from("north"), bundle(&[CreateArea::new("no").unwrap().into()])),
            (String::from("south"), bundle(&[CreateArea::new("es").unwrap().into()])),
        ];

        let generated: Vec<GeneratedVariant> =
            generate(empty_archive(), variants, FailurePolicy::Abort)
                .await
                .unwrap();

        assert_eq!(generated.len(), 2);
        assert_eq!(generated[0].name, "north");
        let north: &BTreeMap<String, Area> = &generated[0].replay.archive.config.areas;
        let south: &BTreeMap<String, Area> = &generated[1].replay.archive.config.areas;
        assert!(north.contains_key("no") && !north.contains_key("es"));
        assert!(south.contains_key("es") && !south.contains_key("no"));
    }
}
