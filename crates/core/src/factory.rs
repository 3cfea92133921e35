// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::context::CommandContext;
use crate::dto::{CommandDto, CommandName};
use crate::error::CommandError;
use tracing::trace;

/// Turns persisted DTOs back into commands.
#[derive(Debug, Clone)]
pub struct CommandFactory {
    ctx: CommandContext,
}

impl CommandFactory {
    /// Creates a factory building commands against `ctx`.
    #[must_use]
    pub const fn new(ctx: CommandContext) -> Self {
        Self { ctx }
    }

    /// The context handed to every built command.
    #[must_use]
    pub const fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Builds the commands of one DTO; a batch DTO yields one command per mapping.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotImplemented`] for an unknown action and a
    /// validation error for invalid arguments.
    pub fn to_command(&self, dto: &CommandDto) -> Result<Vec<Command>, CommandError> {
        let name: CommandName = dto.action.parse()?;
        trace!(action = %name, "Building command from DTO");
        dto.args
            .clone()
            .into_vec()
            .into_iter()
            .map(|args| Command::from_args(name, args, &self.ctx))
            .collect()
    }

    /// Builds the commands of a DTO list, in order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Self::to_command`].
    pub fn to_commands(&self, dtos: &[CommandDto]) -> Result<Vec<Command>, CommandError> {
        let mut commands: Vec<Command> = Vec::with_capacity(dtos.len());
        for dto in dtos {
            commands.extend(self.to_command(dto)?);
        }
        Ok(commands)
    }
}
