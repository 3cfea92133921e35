// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{decode, object, read_section, save};
use super::raw::GENERAL_DATA;
use super::{Command, CommandOps};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{FileStudy, StudyVersion};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Path of the scenario builder rulesets.
pub(crate) const SCENARIO_BUILDER: &str = "settings/scenariobuilder";

const PLAYLIST_SECTION: &str = "playlist";
const INCLUDED_YEARS: &str = "playlist_year +";
const EXCLUDED_YEARS: &str = "playlist_year -";
const YEAR_WEIGHTS: &str = "playlist_year_weight";

/// Sets the Monte-Carlo years played by the simulation.
///
/// Years are 1-based here and 0-based in `generaldata`. With `reverse`, every
/// year is played except the listed ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdatePlaylist {
    active: bool,
    #[serde(default)]
    items: Option<Vec<u32>>,
    #[serde(default)]
    weights: Option<BTreeMap<u32, f64>>,
    #[serde(default)]
    reverse: bool,
}

impl UpdatePlaylist {
    /// Builds the command.
    #[must_use]
    pub const fn new(
        active: bool,
        items: Option<Vec<u32>>,
        weights: Option<BTreeMap<u32, f64>>,
        reverse: bool,
    ) -> Self {
        Self {
            active,
            items,
            weights,
            reverse,
        }
    }

    /// Reads the playlist stored in a `generaldata` document.
    pub(crate) fn from_general_data(general: &Map<String, Value>) -> Self {
        let active: bool = general
            .get("general")
            .and_then(|section| section.get("user-playlist"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let playlist: Option<&Map<String, Value>> =
            general.get(PLAYLIST_SECTION).and_then(Value::as_object);
        let Some(playlist) = playlist else {
            return Self::new(active, None, None, false);
        };

        let reverse: bool = playlist
            .get("playlist_reset")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let years_key: &str = if reverse { EXCLUDED_YEARS } else { INCLUDED_YEARS };
        let items: Option<Vec<u32>> = playlist.get(years_key).map(|years| {
            values_of(years)
                .filter_map(Value::as_u64)
                .filter_map(|year| u32::try_from(year + 1).ok())
                .collect()
        });
        let weights: Option<BTreeMap<u32, f64>> = playlist.get(YEAR_WEIGHTS).map(|entries| {
            values_of(entries)
                .filter_map(Value::as_str)
                .filter_map(parse_weight)
                .collect()
        });

        Self::new(active, items, weights, reverse)
    }
}

/// A repeated ini key is stored as an array; a single occurrence as a scalar.
fn values_of(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(values) => Box::new(values.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

fn parse_weight(entry: &str) -> Option<(u32, f64)> {
    let (year, weight) = entry.split_once(',')?;
    let year: u32 = year.trim().parse().ok()?;
    let weight: f64 = weight.trim().parse().ok()?;
    Some((year + 1, weight))
}

impl CommandOps for UpdatePlaylist {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: Self = decode(CommandName::UpdatePlaylist, args)?;
        let has_year_zero: bool = raw.items.iter().flatten().any(|year| *year == 0)
            || raw.weights.iter().flat_map(BTreeMap::keys).any(|year| *year == 0);
        if has_year_zero {
            return Err(CommandError::validation(
                CommandName::UpdatePlaylist.as_str(),
                "playlist years start at 1",
            ));
        }
        Ok(raw)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({
            "active": self.active,
            "items": self.items,
            "weights": self.weights,
            "reverse": self.reverse,
        }))
    }

    fn signature_keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let mut general: Map<String, Value> = read_section(study.tree.as_ref(), GENERAL_DATA)?;

        let general_section: &mut Value = general
            .entry("general")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(section) = general_section.as_object_mut() {
            section.insert("user-playlist".to_string(), json!(self.active));
        }

        let mut playlist: Map<String, Value> =
            object(json!({ "playlist_reset": self.reverse }));
        if let Some(items) = &self.items {
            let years: Vec<u32> = items.iter().map(|year| year.saturating_sub(1)).collect();
            let key: &str = if self.reverse {
                EXCLUDED_YEARS
            } else {
                INCLUDED_YEARS
            };
            playlist.insert(key.to_string(), json!(years));
        }
        if let Some(weights) = &self.weights {
            let entries: Vec<String> = weights
                .iter()
                .map(|(year, weight)| format!("{},{weight}", year.saturating_sub(1)))
                .collect();
            playlist.insert(YEAR_WEIGHTS.to_string(), json!(entries));
        }
        general.insert(PLAYLIST_SECTION.to_string(), Value::Object(playlist));

        save(study.tree.as_mut(), Value::Object(general), GENERAL_DATA)?;
        Ok(CommandOutput::success("Playlist updated"))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        vec![other.clone().into()]
    }
}

/// Merges `data` into `rulesets`; `null` removes a ruleset or a rule.
pub(crate) fn merge_rulesets(rulesets: &mut Map<String, Value>, data: &Map<String, Value>) {
    for (name, rules) in data {
        let Some(rules) = rules.as_object() else {
            rulesets.remove(name);
            continue;
        };
        let ruleset: &mut Value = rulesets
            .entry(name.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !ruleset.is_object() {
            *ruleset = Value::Object(Map::new());
        }
        if let Some(ruleset) = ruleset.as_object_mut() {
            for (key, value) in rules {
                if value.is_null() {
                    ruleset.remove(key);
                } else {
                    ruleset.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

/// Merges rulesets into the scenario builder.
///
/// `data` maps a ruleset name to its rules. A `null` ruleset removes the
/// ruleset; a `null` rule removes the rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateScenarioBuilder {
    data: Map<String, Value>,
}

impl UpdateScenarioBuilder {
    /// Builds the command.
    #[must_use]
    pub const fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// The rulesets being merged.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl CommandOps for UpdateScenarioBuilder {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: Self = decode(CommandName::UpdateScenarioBuilder, args)?;
        if let Some((name, _)) = raw
            .data
            .iter()
            .find(|(_, rules)| !(rules.is_null() || rules.is_object()))
        {
            return Err(CommandError::validation(
                CommandName::UpdateScenarioBuilder.as_str(),
                format!("ruleset '{name}' must be an object or null"),
            ));
        }
        Ok(raw)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "data": self.data }))
    }

    fn signature_keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let mut rulesets: Map<String, Value> =
            read_section(study.tree.as_ref(), SCENARIO_BUILDER)?;
        merge_rulesets(&mut rulesets, &self.data);
        save(
            study.tree.as_mut(),
            Value::Object(rulesets),
            SCENARIO_BUILDER,
        )?;
        Ok(CommandOutput::success("Scenario builder updated"))
    }

    fn create_diff(
        &self,
        other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        vec![other.clone().into()]
    }
}
