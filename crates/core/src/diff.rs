// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Computes the commands turning one command list into another.
//!
//! The output is split in two buckets. The early bucket holds removals and
//! updates, the late bucket holds the re-creations produced by reverting base
//! commands the variant no longer has. Each bucket is ordered by a key:
//! reverts of base commands come first, later base commands undone first,
//! then modified and added commands in variant order.
//!
//! A variant command is compared with the first base command of the same
//! target only: it is unchanged when that command is strictly equal to it.

use crate::command::Command;
use crate::context::CommandContext;
use crate::dto::CommandDto;
use crate::error::CommandError;
use crate::factory::CommandFactory;
use crate::reverter::CommandReverter;
use antares_study::{FileStudy, StudyVersion};
use tracing::{debug, info};

/// A command scheduled in a bucket.
struct Scheduled {
    key: i64,
    command: Command,
}

fn position(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

/// Sorts a bucket by key, keeping the relative order of equal keys.
fn drain_sorted(mut bucket: Vec<Scheduled>) -> impl Iterator<Item = Command> {
    bucket.sort_by_key(|scheduled| scheduled.key);
    bucket.into_iter().map(|scheduled| scheduled.command)
}

/// Classification of the variant commands against the base commands.
#[derive(Debug, Default)]
struct Classification<'a> {
    /// `(variant position, base command, variant command)`
    modified: Vec<(usize, &'a Command, &'a Command)>,
    /// `(variant position, variant command)`
    added: Vec<(usize, &'a Command)>,
    /// `(base position, base command)`
    missing: Vec<(usize, &'a Command)>,
}

fn classify<'a>(base: &'a [Command], variant: &'a [Command]) -> Classification<'a> {
    let mut classification: Classification<'a> = Classification::default();

    for (index, command) in variant.iter().enumerate() {
        match base.iter().find(|b| b.matches(command, false)) {
            Some(previous) if previous.matches(command, true) => {}
            Some(previous) => classification.modified.push((index, previous, command)),
            None => classification.added.push((index, command)),
        }
    }

    for (index, command) in base.iter().enumerate() {
        if !variant.iter().any(|v| v.matches(command, false)) {
            classification.missing.push((index, command));
        }
    }

    classification
}

/// Diffs variant command lists.
#[derive(Debug, Clone)]
pub struct VariantCommandsExtractor {
    ctx: CommandContext,
    factory: CommandFactory,
    reverter: CommandReverter,
}

impl VariantCommandsExtractor {
    /// Creates a diff engine working through `ctx`.
    #[must_use]
    pub fn new(ctx: CommandContext) -> Self {
        Self {
            factory: CommandFactory::new(ctx.clone()),
            reverter: CommandReverter::new(ctx.clone()),
            ctx,
        }
    }

    /// The commands that, applied to a study already carrying `base`, yield
    /// the state `variant` produces.
    ///
    /// `base_study` is the study both lists apply to; reverts fall back to it.
    ///
    /// # Errors
    ///
    /// Returns an error if a DTO cannot be turned into a command or a revert
    /// extraction fails.
    pub fn diff(
        &self,
        base: &[CommandDto],
        variant: &[CommandDto],
        base_study: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let base_commands: Vec<Command> = self.factory.to_commands(base)?;
        let variant_commands: Vec<Command> = self.factory.to_commands(variant)?;
        self.diff_commands(&base_commands, &variant_commands, base_study)
    }

    /// [`Self::diff`] over already built commands.
    ///
    /// # Errors
    ///
    /// Returns an error if a revert extraction fails.
    pub fn diff_commands(
        &self,
        base: &[Command],
        variant: &[Command],
        base_study: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let version: StudyVersion = base_study.version();
        let classification: Classification<'_> = classify(base, variant);
        info!(
            base = base.len(),
            variant = variant.len(),
            modified = classification.modified.len(),
            added = classification.added.len(),
            missing = classification.missing.len(),
            "Classified variant commands"
        );

        let mut early: Vec<Scheduled> = Vec::new();
        let mut late: Vec<Scheduled> = Vec::new();

        for (index, command) in &classification.missing {
            let reverted: Vec<Command> =
                self.reverter
                    .revert(command, &base[..*index], base_study)?;
            debug!(
                signature = %command.match_signature(),
                count = reverted.len(),
                "Reverted missing command"
            );

            // Everything from the first creation on must wait for the removals
            let mut creating: bool = false;
            for reverted_command in reverted {
                creating = creating || reverted_command.command_name().is_creation();
                if creating {
                    late.push(Scheduled {
                        key: position(*index),
                        command: reverted_command,
                    });
                } else {
                    early.push(Scheduled {
                        key: -position(*index) - 1,
                        command: reverted_command,
                    });
                }
            }
        }

        for (index, previous, command) in &classification.modified {
            for update in previous.create_diff(command, version, &self.ctx) {
                early.push(Scheduled {
                    key: position(*index),
                    command: update,
                });
            }
        }

        for (index, command) in &classification.added {
            early.push(Scheduled {
                key: position(*index),
                command: (*command).clone(),
            });
        }

        let commands: Vec<Command> = drain_sorted(early).chain(drain_sorted(late)).collect();
        info!(count = commands.len(), "Computed variant diff");
        Ok(commands)
    }
}
