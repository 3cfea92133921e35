// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::context::CommandContext;
use crate::dto::CommandDto;
use crate::error::CommandError;
use crate::factory::CommandFactory;
use crate::output::CommandOutput;
use antares_study::FileStudy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to do when a command fails during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failed command.
    #[default]
    Abort,
    /// Apply every command and report every failure.
    Continue,
}

/// The outcome of one replayed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResultDetail {
    /// Position of the command in the replayed list.
    pub index: usize,
    /// The command action.
    pub name: String,
    /// The command match signature.
    pub signature: String,
    pub status: bool,
    pub message: String,
}

/// The outcome of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Whether every replayed command succeeded.
    pub success: bool,
    /// One entry per applied command, in order.
    pub details: Vec<CommandResultDetail>,
}

impl GenerationResult {
    /// The first failed command, if any.
    #[must_use]
    pub fn first_failure(&self) -> Option<&CommandResultDetail> {
        self.details.iter().find(|detail| !detail.status)
    }
}

/// Replays command lists against a study.
#[derive(Debug, Clone)]
pub struct VariantCommandGenerator {
    ctx: CommandContext,
}

impl VariantCommandGenerator {
    /// Creates a generator applying commands through `ctx`.
    #[must_use]
    pub const fn new(ctx: CommandContext) -> Self {
        Self { ctx }
    }

    /// Applies `commands` to `study` in order.
    ///
    /// Commands after a failure are skipped under [`FailurePolicy::Abort`].
    /// Writes of a failed command are not rolled back.
    pub fn generate(
        &self,
        commands: &[Command],
        study: &mut FileStudy,
        policy: FailurePolicy,
    ) -> GenerationResult {
        let mut result: GenerationResult = GenerationResult {
            success: true,
            details: Vec::with_capacity(commands.len()),
        };

        for (index, command) in commands.iter().enumerate() {
            let signature: String = command.match_signature();
            let output: CommandOutput = command.apply(study, &self.ctx);
            if output.status {
                debug!(index, %signature, "Command applied");
            } else {
                warn!(index, %signature, message = %output.message, "Command failed");
                result.success = false;
            }

            result.details.push(CommandResultDetail {
                index,
                name: command.command_name().as_str().to_string(),
                signature,
                status: output.status,
                message: output.message,
            });

            if !result.success && policy == FailurePolicy::Abort {
                break;
            }
        }

        info!(
            applied = result.details.len(),
            total = commands.len(),
            success = result.success,
            "Generation finished"
        );
        result
    }

    /// Builds the commands of `dtos` and applies them to `study`.
    ///
    /// # Errors
    ///
    /// Returns an error if a DTO cannot be turned into a command; nothing is
    /// applied in that case.
    pub fn generate_from_dtos(
        &self,
        dtos: &[CommandDto],
        study: &mut FileStudy,
        policy: FailurePolicy,
    ) -> Result<GenerationResult, CommandError> {
        let commands: Vec<Command> = CommandFactory::new(self.ctx.clone()).to_commands(dtos)?;
        Ok(self.generate(&commands, study, policy))
    }
}
