// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Computes the commands undoing a command.
//!
//! Resolution goes through three tiers: the matching command found in the
//! history preceding the reverted command, then an extraction from the base
//! study, then nothing when the base study does not contain the target.
//!
//! Reverting an area or cluster removal does not rebuild the binding
//! constraints the removal deleted with it.

use crate::command::settings::merge_rulesets;
use crate::command::{
    Command, CreateArea, CreateBindingConstraint, CreateCluster, CreateDistrict, CreateLink,
    CreateRenewablesCluster, CreateStStorage, RemoveArea, RemoveBindingConstraint, RemoveCluster,
    RemoveDistrict, RemoveLink, RemoveRenewablesCluster, RemoveStStorage, ReplaceMatrix,
    UpdateBindingConstraint, UpdateConfig, UpdateDistrict, UpdateRawFile, UpdateScenarioBuilder,
};
use crate::context::CommandContext;
use crate::error::CommandError;
use crate::extractor::CommandExtractor;
use antares_study::{FileStudy, StudyTree, url};
use serde_json::{Map, Value};
use tracing::trace;

/// Turns a not-found extraction into an empty revert.
fn or_empty(result: Result<Vec<Command>, CommandError>) -> Result<Vec<Command>, CommandError> {
    match result {
        Err(err) if err.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}

fn single(result: Result<Command, CommandError>) -> Result<Vec<Command>, CommandError> {
    or_empty(result.map(|command| vec![command]))
}

/// The last command of `history` selected by `pick`.
fn last_match<'a, T: 'a>(
    history: &'a [Command],
    pick: impl Fn(&'a Command) -> Option<&'a T>,
) -> Option<&'a T> {
    history.iter().rev().find_map(pick)
}

/// Computes revert commands.
#[derive(Debug, Clone)]
pub struct CommandReverter {
    extractor: CommandExtractor,
}

impl CommandReverter {
    /// Creates a reverter extracting from base studies through `ctx`.
    #[must_use]
    pub const fn new(ctx: CommandContext) -> Self {
        Self {
            extractor: CommandExtractor::new(ctx),
        }
    }

    /// The commands undoing `command`.
    ///
    /// `history` holds the commands applied before `command`, on top of `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if an extraction from `base` fails for a reason other
    /// than the target being absent.
    pub fn revert(
        &self,
        command: &Command,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        trace!(
            signature = %command.match_signature(),
            history = history.len(),
            "Reverting command"
        );
        match command {
            Command::CreateArea(create) => Ok(vec![RemoveArea::new(&create.area_id()).into()]),
            Command::RemoveArea(remove) => self.revert_remove_area(remove, history, base),
            Command::CreateDistrict(create) => {
                Ok(vec![RemoveDistrict::new(&create.district_id()).into()])
            }
            Command::RemoveDistrict(remove) => self.revert_remove_district(remove, history, base),
            Command::UpdateDistrict(update) => self.revert_update_district(update, history, base),
            Command::CreateLink(create) => {
                Ok(vec![RemoveLink::new(create.area1(), create.area2()).into()])
            }
            Command::RemoveLink(remove) => self.revert_remove_link(remove, history, base),
            Command::CreateBindingConstraint(create) => {
                Ok(vec![RemoveBindingConstraint::new(&create.constraint_id()).into()])
            }
            Command::UpdateBindingConstraint(update) => {
                self.revert_update_binding_constraint(update, history, base)
            }
            Command::RemoveBindingConstraint(remove) => {
                self.revert_remove_binding_constraint(remove, history, base)
            }
            Command::CreateCluster(create) => Ok(vec![
                RemoveCluster::new(create.area_id(), &create.cluster_id()).into(),
            ]),
            Command::RemoveCluster(remove) => self.revert_remove_cluster(remove, history, base),
            Command::CreateRenewablesCluster(create) => Ok(vec![
                RemoveRenewablesCluster::new(create.area_id(), &create.cluster_id()).into(),
            ]),
            Command::RemoveRenewablesCluster(remove) => {
                self.revert_remove_renewables_cluster(remove, history, base)
            }
            Command::CreateStStorage(create) => Ok(vec![
                RemoveStStorage::new(create.area_id(), &create.storage_id()).into(),
            ]),
            Command::RemoveStStorage(remove) => {
                self.revert_remove_st_storage(remove, history, base)
            }
            Command::ReplaceMatrix(replace) => self.revert_replace_matrix(replace, history, base),
            Command::UpdateConfig(update) => self.revert_update_config(update, history, base),
            Command::UpdateComments(_) => self.revert_update_comments(history, base),
            Command::UpdateRawFile(update) => self.revert_update_raw_file(update, history, base),
            Command::UpdatePlaylist(_) => self.revert_update_playlist(history, base),
            Command::UpdateScenarioBuilder(update) => {
                self.revert_update_scenario_builder(update, history, base)
            }
        }
    }

    fn revert_remove_area(
        &self,
        remove: &RemoveArea,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let created: Option<&CreateArea> = last_match(history, |c| {
            c.as_create_area().filter(|create| create.area_id() == remove.id())
        });
        match created {
            Some(create) => Ok(vec![create.clone().into()]),
            None => or_empty(self.extractor.extract_area(base, remove.id())),
        }
    }

    fn revert_remove_district(
        &self,
        remove: &RemoveDistrict,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let created: Option<&CreateDistrict> = last_match(history, |c| {
            c.as_create_district()
                .filter(|create| create.district_id() == remove.id())
        });
        match created {
            Some(create) => Ok(vec![create.clone().into()]),
            None => or_empty(self.extractor.extract_district(base, remove.id())),
        }
    }

    fn revert_update_district(
        &self,
        update: &UpdateDistrict,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let id: &str = update.id();
        for command in history.iter().rev() {
            if command.as_update_district().is_some_and(|u| u.id() == id) {
                return Ok(vec![command.clone()]);
            }
            if let Some(create) = command
                .as_create_district()
                .filter(|create| create.district_id() == id)
            {
                return Ok(vec![create.to_update().into()]);
            }
        }

        let extracted: Vec<Command> = or_empty(self.extractor.extract_district(base, id))?;
        Ok(extracted
            .iter()
            .filter_map(Command::as_create_district)
            .map(|create| create.to_update().into())
            .collect())
    }

    fn revert_remove_link(
        &self,
        remove: &RemoveLink,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let created: Option<&CreateLink> = last_match(history, |c| {
            c.as_create_link().filter(|create| {
                create.area1() == remove.area1() && create.area2() == remove.area2()
            })
        });
        match created {
            Some(create) => Ok(vec![create.clone().into()]),
            None => or_empty(
                self.extractor
                    .extract_link(base, remove.area1(), remove.area2()),
            ),
        }
    }

    fn revert_update_binding_constraint(
        &self,
        update: &UpdateBindingConstraint,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let id: &str = update.id();
        for command in history.iter().rev() {
            if command
                .as_update_binding_constraint()
                .is_some_and(|u| u.id() == id)
            {
                return Ok(vec![command.clone()]);
            }
            if let Some(create) = command
                .as_create_binding_constraint()
                .filter(|create| create.constraint_id() == id)
            {
                return Ok(vec![create.to_update().into()]);
            }
        }

        let extracted: Vec<Command> =
            or_empty(self.extractor.extract_binding_constraint(base, id))?;
        Ok(extracted
            .iter()
            .filter_map(Command::as_create_binding_constraint)
            .map(|create| create.to_update().into())
            .collect())
    }

    fn revert_remove_binding_constraint(
        &self,
        remove: &RemoveBindingConstraint,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let created: Option<&CreateBindingConstraint> = last_match(history, |c| {
            c.as_create_binding_constraint()
                .filter(|create| create.constraint_id() == remove.id())
        });
        match created {
            Some(create) => Ok(vec![create.clone().into()]),
            None => or_empty(self.extractor.extract_binding_constraint(base, remove.id())),
        }
    }

    fn revert_remove_cluster(
        &self,
        remove: &RemoveCluster,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let created: Option<&CreateCluster> = last_match(history, |c| {
            c.as_create_cluster().filter(|create| {
                create.area_id() == remove.area_id() && create.cluster_id() == remove.cluster_id()
            })
        });
        match created {
            Some(create) => Ok(vec![create.clone().into()]),
            None => or_empty(self.extractor.extract_cluster(
                base,
                remove.area_id(),
                remove.cluster_id(),
            )),
        }
    }

    fn revert_remove_renewables_cluster(
        &self,
        remove: &RemoveRenewablesCluster,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let created: Option<&CreateRenewablesCluster> = last_match(history, |c| {
            c.as_create_renewables_cluster().filter(|create| {
                create.area_id() == remove.area_id() && create.cluster_id() == remove.cluster_id()
            })
        });
        match created {
            Some(create) => Ok(vec![create.clone().into()]),
            None => or_empty(self.extractor.extract_renewables_cluster(
                base,
                remove.area_id(),
                remove.cluster_id(),
            )),
        }
    }

    fn revert_remove_st_storage(
        &self,
        remove: &RemoveStStorage,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let created: Option<&CreateStStorage> = last_match(history, |c| {
            c.as_create_st_storage().filter(|create| {
                create.area_id() == remove.area_id() && create.storage_id() == remove.storage_id()
            })
        });
        match created {
            Some(create) => Ok(vec![create.clone().into()]),
            None => or_empty(self.extractor.extract_st_storage(
                base,
                remove.area_id(),
                remove.storage_id(),
            )),
        }
    }

    fn revert_replace_matrix(
        &self,
        replace: &ReplaceMatrix,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let previous: Option<&ReplaceMatrix> = last_match(history, |c| {
            c.as_replace_matrix()
                .filter(|previous| previous.target() == replace.target())
        });
        if let Some(previous) = previous {
            return Ok(vec![previous.clone().into()]);
        }

        let tree: &dyn StudyTree = base.tree.as_ref();
        if !tree.exists(&url(replace.target())) {
            return Ok(Vec::new());
        }
        single(
            self.extractor
                .generate_replace_matrix(tree, replace.target(), None),
        )
    }

    fn revert_update_config(
        &self,
        update: &UpdateConfig,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let target: &str = update.target();

        // The last update of the target itself or of one of its ancestors
        let anchor: Option<(usize, &UpdateConfig)> =
            history.iter().enumerate().rev().find_map(|(index, c)| {
                c.as_update_config()
                    .filter(|previous| previous.target() == target || previous.is_ancestor_of(target))
                    .map(|previous| (index, previous))
            });

        if let Some((index, previous)) = anchor {
            let mut commands: Vec<Command> = vec![previous.clone().into()];
            commands.extend(
                history[index + 1..]
                    .iter()
                    .filter(|c| {
                        c.as_update_config()
                            .is_some_and(|later| previous.is_ancestor_of(later.target()))
                    })
                    .cloned(),
            );
            return Ok(commands);
        }

        let mut commands: Vec<Command> = single(
            self.extractor
                .generate_update_config(base.tree.as_ref(), target),
        )?;
        commands.extend(
            history
                .iter()
                .filter(|c| {
                    c.as_update_config()
                        .is_some_and(|later| update.is_ancestor_of(later.target()))
                })
                .cloned(),
        );
        Ok(commands)
    }

    fn revert_update_comments(
        &self,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        match history.iter().rev().find(|c| c.as_update_comments().is_some()) {
            Some(previous) => Ok(vec![previous.clone()]),
            None => single(self.extractor.extract_comments(base)),
        }
    }

    fn revert_update_raw_file(
        &self,
        update: &UpdateRawFile,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let previous: Option<&UpdateRawFile> = last_match(history, |c| {
            c.as_update_raw_file()
                .filter(|previous| previous.target() == update.target())
        });
        match previous {
            Some(previous) => Ok(vec![previous.clone().into()]),
            None => single(
                self.extractor
                    .generate_update_rawfile(base.tree.as_ref(), update.target()),
            ),
        }
    }

    fn revert_update_playlist(
        &self,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        match history.iter().rev().find(|c| c.as_update_playlist().is_some()) {
            Some(previous) => Ok(vec![previous.clone()]),
            None => single(self.extractor.extract_playlist(base)),
        }
    }

    /// Rebuilds the rulesets touched by `update` as they were before it.
    ///
    /// Rules absent at that point are reset with `null`.
    fn revert_update_scenario_builder(
        &self,
        update: &UpdateScenarioBuilder,
        history: &[Command],
        base: &FileStudy,
    ) -> Result<Vec<Command>, CommandError> {
        let mut rulesets: Map<String, Value> = match self.extractor.extract_scenario_builder(base)
        {
            Ok(command) => command
                .as_update_scenario_builder()
                .map(|extracted| extracted.data().clone())
                .unwrap_or_default(),
            Err(err) if err.is_not_found() => Map::new(),
            Err(err) => return Err(err),
        };
        for previous in history.iter().filter_map(Command::as_update_scenario_builder) {
            merge_rulesets(&mut rulesets, previous.data());
        }

        let mut restored: Map<String, Value> = Map::new();
        for (name, rules) in update.data() {
            let Some(Value::Object(before)) = rulesets.get(name) else {
                restored.insert(name.clone(), Value::Null);
                continue;
            };
            let mut ruleset: Map<String, Value> = before.clone();
            if let Some(rules) = rules.as_object() {
                for key in rules.keys() {
                    ruleset.entry(key.clone()).or_insert(Value::Null);
                }
            }
            restored.insert(name.clone(), Value::Object(ruleset));
        }
        Ok(vec![UpdateScenarioBuilder::new(restored).into()])
    }
}
