// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Concrete study commands and the [`Command`] sum type over them.

pub(crate) mod area;
pub(crate) mod binding_constraint;
pub(crate) mod common;
pub(crate) mod district;
pub(crate) mod link;
mod matrix;
pub(crate) mod raw;
mod renewables;
pub(crate) mod settings;
pub(crate) mod st_storage;
mod thermal;
pub(crate) mod validation;

pub use area::{CreateArea, RemoveArea};
pub use binding_constraint::{
    BindingConstraintOperator, BindingConstraintProperties, ConstraintMatrixInputs,
    CreateBindingConstraint, RemoveBindingConstraint, UpdateBindingConstraint,
};
pub use district::{CreateDistrict, DistrictBaseFilter, RemoveDistrict, UpdateDistrict};
pub use link::{CreateLink, RemoveLink};
pub use matrix::ReplaceMatrix;
pub use raw::{UpdateComments, UpdateConfig, UpdateRawFile};
pub use renewables::{CreateRenewablesCluster, RemoveRenewablesCluster};
pub use settings::{UpdatePlaylist, UpdateScenarioBuilder};
pub use st_storage::{CreateStStorage, RemoveStStorage};
pub use thermal::{CreateCluster, RemoveCluster};
pub use validation::MatrixInput;

use crate::context::CommandContext;
use crate::dto::{CommandDto, CommandName};
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reverter::CommandReverter;
use antares_study::{FileStudy, StudyVersion};
use serde_json::{Map, Value};
use tracing::debug;

/// Separator between the parts of a match signature.
pub const MATCH_SIGNATURE_SEPARATOR: &str = "%";

/// Schema version of the argument shape of every command kind.
pub const COMMAND_VERSION: u32 = 1;

/// Behavior shared by every concrete command.
///
/// The [`Command`] enum dispatches to these methods.
pub(crate) trait CommandOps: Sized + PartialEq {
    /// Builds the command from its DTO arguments, resolving matrices through `ctx`.
    fn from_args(args: Map<String, Value>, ctx: &CommandContext) -> Result<Self, CommandError>;

    /// Serializes the arguments; matrices are written as bare ids.
    fn to_args(&self) -> Map<String, Value>;

    /// The key fields identifying the command's target.
    fn signature_keys(&self) -> Vec<String>;

    /// Loose matching compares targets, strict matching compares every field.
    fn matches(&self, other: &Self, equal: bool) -> bool {
        if equal {
            self == other
        } else {
            self.signature_keys() == other.signature_keys()
        }
    }

    /// Mutates the study config and tree together.
    fn apply(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError>;

    /// Commands that, applied after `self` to a study of `version`, produce the effect of `other`.
    fn create_diff(
        &self,
        other: &Self,
        version: StudyVersion,
        ctx: &CommandContext,
    ) -> Vec<Command>;

    /// Bare ids of the matrices referenced by the command.
    fn inner_matrices(&self) -> Vec<String> {
        Vec::new()
    }
}

macro_rules! command_set {
    ($($variant:ident),+ $(,)?) => {
        /// A serializable, replayable study mutation.
        ///
        /// The variants are closed over [`CommandName`]: adding a command kind
        /// without wiring its factory, reverter and extractor handling is a
        /// compile error.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Command {
            $(
                #[allow(missing_docs)]
                $variant($variant),
            )+
        }

        $(
            impl From<$variant> for Command {
                fn from(command: $variant) -> Self {
                    Self::$variant(command)
                }
            }
        )+

        impl Command {
            /// The command kind.
            #[must_use]
            pub const fn command_name(&self) -> CommandName {
                match self {
                    $(Self::$variant(_) => CommandName::$variant,)+
                }
            }

            pub(crate) fn from_args(
                name: CommandName,
                args: Map<String, Value>,
                ctx: &CommandContext,
            ) -> Result<Self, CommandError> {
                match name {
                    $(CommandName::$variant => $variant::from_args(args, ctx).map(Self::$variant),)+
                }
            }

            fn args(&self) -> Map<String, Value> {
                match self {
                    $(Self::$variant(command) => command.to_args(),)+
                }
            }

            fn signature_keys(&self) -> Vec<String> {
                match self {
                    $(Self::$variant(command) => command.signature_keys(),)+
                }
            }

            fn apply_inner(
                &self,
                study: &mut FileStudy,
                ctx: &CommandContext,
            ) -> Result<CommandOutput, CommandError> {
                match self {
                    $(Self::$variant(command) => command.apply(study, ctx),)+
                }
            }

            /// Checks whether `other` targets the same entity, or with `equal`, is identical.
            #[must_use]
            pub fn matches(&self, other: &Self, equal: bool) -> bool {
                match (self, other) {
                    $((Self::$variant(left), Self::$variant(right)) => left.matches(right, equal),)+
                    _ => false,
                }
            }

            /// The commands that, applied after `self`, produce the effect of `other`.
            ///
            /// `other` must match `self`; otherwise the diff is empty.
            #[must_use]
            pub fn create_diff(
                &self,
                other: &Self,
                version: StudyVersion,
                ctx: &CommandContext,
            ) -> Vec<Self> {
                match (self, other) {
                    $((Self::$variant(left), Self::$variant(right)) => left.create_diff(right, version, ctx),)+
                    _ => Vec::new(),
                }
            }

            /// Bare ids of the matrices referenced by this command.
            #[must_use]
            pub fn get_inner_matrices(&self) -> Vec<String> {
                match self {
                    $(Self::$variant(command) => command.inner_matrices(),)+
                }
            }

            pastey::paste! {
                $(
                    #[doc = "Returns the inner `" $variant "` if this command is one."]
                    #[must_use]
                    pub const fn [<as_ $variant:snake>](&self) -> Option<&$variant> {
                        match self {
                            Self::$variant(command) => Some(command),
                            _ => None,
                        }
                    }
                )+
            }
        }
    };
}

command_set!(
    CreateArea,
    RemoveArea,
    CreateDistrict,
    RemoveDistrict,
    UpdateDistrict,
    CreateLink,
    RemoveLink,
    CreateBindingConstraint,
    UpdateBindingConstraint,
    RemoveBindingConstraint,
    CreateCluster,
    RemoveCluster,
    CreateRenewablesCluster,
    RemoveRenewablesCluster,
    CreateStStorage,
    RemoveStStorage,
    ReplaceMatrix,
    UpdateConfig,
    UpdateComments,
    UpdateRawFile,
    UpdatePlaylist,
    UpdateScenarioBuilder,
);

impl Command {
    /// The argument schema version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        COMMAND_VERSION
    }

    /// A key identifying the command's logical target, e.g. `create_area%area 1`.
    ///
    /// Two commands of the same kind targeting the same entity share a signature.
    #[must_use]
    pub fn match_signature(&self) -> String {
        std::iter::once(self.command_name().as_str().to_string())
            .chain(self.signature_keys())
            .collect::<Vec<String>>()
            .join(MATCH_SIGNATURE_SEPARATOR)
    }

    /// Serializes the command; matrix references are written as bare ids.
    #[must_use]
    pub fn to_dto(&self) -> CommandDto {
        CommandDto::new(self.command_name(), self.args(), self.version())
    }

    /// Applies the command to a study.
    ///
    /// Domain failures and unexpected tree errors are both reported through a
    /// failed [`CommandOutput`].
    pub fn apply(&self, study: &mut FileStudy, ctx: &CommandContext) -> CommandOutput {
        debug!(signature = %self.match_signature(), "Applying command");
        match self.apply_inner(study, ctx) {
            Ok(output) => output,
            Err(err) => CommandOutput::failure(err.to_string()),
        }
    }

    /// The commands undoing this command, given the commands applied before it.
    ///
    /// # Errors
    ///
    /// Returns an error if a command rebuilt from the base study is invalid.
    pub fn revert(
        &self,
        history: &[Self],
        base: &FileStudy,
        ctx: &CommandContext,
    ) -> Result<Vec<Self>, CommandError> {
        CommandReverter::new(ctx.clone()).revert(self, history, base)
    }
}
