// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::dto::CommandName;
use crate::error::CommandError;
use antares_study::{ALL_FILTERING, FileStudy, StudyTree, TreeError, url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Path of the binding constraint index inside the study tree.
pub(crate) const BINDING_CONSTRAINTS_INDEX: &str = "input/bindingconstraints/bindingconstraints";

/// Every file name a binding constraint matrix may have, for any version.
pub(crate) const BINDING_CONSTRAINT_MATRIX_SUFFIXES: [&str; 4] = ["", "_lt", "_eq", "_gt"];

/// Unwraps a JSON object, turning any other value into an empty mapping.
pub(crate) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Decodes the arguments of `action`.
pub(crate) fn decode<T: DeserializeOwned>(
    action: CommandName,
    args: Map<String, Value>,
) -> Result<T, CommandError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| CommandError::InvalidArguments {
        action: action.as_str().to_string(),
        reason: e.to_string(),
    })
}

/// The default value of an ini filter key: every frequency.
pub(crate) fn all_filters() -> String {
    ALL_FILTERING.join(", ")
}

/// Splits an ini filter value (`"hourly, daily"`) into its frequencies.
pub(crate) fn parse_filters(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Reads an ini section or folder, treating an absent path as empty.
pub(crate) fn read_section(
    tree: &dyn StudyTree,
    path: &str,
) -> Result<Map<String, Value>, TreeError> {
    match tree.get(&url(path)) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TreeError::NotAFolder {
            path: path.to_string(),
        }),
        Err(TreeError::ChildNotFound { .. }) => Ok(Map::new()),
        Err(err) => Err(err),
    }
}

/// Deletes a tree node, ignoring absent paths.
pub(crate) fn delete_if_exists(tree: &mut dyn StudyTree, path: &str) -> Result<(), TreeError> {
    match tree.delete(&url(path)) {
        Ok(()) | Err(TreeError::ChildNotFound { .. }) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Saves `value` at `path`.
pub(crate) fn save(tree: &mut dyn StudyTree, value: Value, path: &str) -> Result<(), TreeError> {
    tree.save(value, &url(path))
}

/// Rewrites `input/areas/list` from the area names of the config.
pub(crate) fn save_area_list(study: &mut FileStudy) -> Result<(), TreeError> {
    let names: Vec<Value> = study
        .config
        .areas
        .values()
        .map(|area| Value::String(area.name.clone()))
        .collect();
    save(study.tree.as_mut(), Value::Array(names), "input/areas/list")
}

/// Reads the binding constraint sections ordered by their numeric key.
pub(crate) fn read_constraint_sections(
    tree: &dyn StudyTree,
) -> Result<Vec<Map<String, Value>>, TreeError> {
    let index: Map<String, Value> = read_section(tree, BINDING_CONSTRAINTS_INDEX)?;
    let mut sections: Vec<(usize, Map<String, Value>)> = index
        .into_iter()
        .filter_map(|(key, section)| match section {
            Value::Object(map) => key.parse::<usize>().ok().map(|position| (position, map)),
            _ => None,
        })
        .collect();
    sections.sort_by_key(|(position, _)| *position);
    Ok(sections.into_iter().map(|(_, section)| section).collect())
}

/// Writes the binding constraint sections, renumbering the keys from zero.
pub(crate) fn write_constraint_sections(
    tree: &mut dyn StudyTree,
    sections: Vec<Map<String, Value>>,
) -> Result<(), TreeError> {
    let index: Map<String, Value> = sections
        .into_iter()
        .enumerate()
        .map(|(position, section)| (position.to_string(), Value::Object(section)))
        .collect();
    save(tree, Value::Object(index), BINDING_CONSTRAINTS_INDEX)
}

/// The `id` field of a binding constraint section.
pub(crate) fn section_id(section: &Map<String, Value>) -> Option<&str> {
    section.get("id").and_then(Value::as_str)
}

/// Removes binding constraints from the config, the index and their matrices.
pub(crate) fn remove_binding_constraints(
    study: &mut FileStudy,
    ids: &[String],
) -> Result<(), TreeError> {
    if ids.is_empty() {
        return Ok(());
    }

    let sections: Vec<Map<String, Value>> = read_constraint_sections(study.tree.as_ref())?;
    let kept: Vec<Map<String, Value>> = sections
        .into_iter()
        .filter(|section| section_id(section).is_none_or(|id| !ids.iter().any(|r| r == id)))
        .collect();
    write_constraint_sections(study.tree.as_mut(), kept)?;

    for id in ids {
        for suffix in BINDING_CONSTRAINT_MATRIX_SUFFIXES {
            delete_if_exists(
                study.tree.as_mut(),
                &format!("input/bindingconstraints/{id}{suffix}"),
            )?;
        }
    }

    study.config.bindings.retain(|b| !ids.contains(&b.id));
    Ok(())
}

/// Orders two area ids alphabetically.
pub(crate) fn sorted_pair(area1: &str, area2: &str) -> (String, String) {
    if area1 <= area2 {
        (area1.to_string(), area2.to_string())
    } else {
        (area2.to_string(), area1.to_string())
    }
}
