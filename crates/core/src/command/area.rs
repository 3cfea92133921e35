// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::common::{
    all_filters, decode, delete_if_exists, object, read_section, remove_binding_constraints,
    save, save_area_list,
};
use super::link::delete_link_files;
use super::{Command, CommandOps};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use crate::output::CommandOutput;
use antares_study::{
    Area, FileStudy, MatrixConstants, MatrixRef, StudyTree, StudyVersion, transform_name_to_id,
    validate_name,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// Kinds of time series carried by every area, each with a prepro folder.
pub(crate) const TIME_SERIES_KINDS: [&str; 3] = ["load", "wind", "solar"];

/// Sections of `input/thermal/areas.ini` keyed by area.
pub(crate) const THERMAL_AREA_COSTS: [&str; 2] = ["unserverdenergycost", "spilledenergycost"];

/// Default `optimization.ini` of a new area.
pub(crate) fn default_optimization() -> Value {
    json!({
        "nodal optimization": {
            "non-dispatchable-power": true,
            "dispatchable-hydro-power": true,
            "other-dispatchable-power": true,
            "spread-unsupplied-energy-cost": 0.0,
            "spread-spilled-energy-cost": 0.0,
        },
        "filtering": {
            "filter-synthesis": all_filters(),
            "filter-year-by-year": all_filters(),
        },
    })
}

/// Default `ui.ini` of a new area.
pub(crate) fn default_ui() -> Value {
    json!({
        "ui": { "x": 0, "y": 0, "color_r": 230, "color_g": 108, "color_b": 44, "layers": "0" },
        "layerX": { "0": 0 },
        "layerY": { "0": 0 },
        "layerColor": { "0": "230, 108, 44" },
    })
}

/// Default `hydro.ini` values written for a new area.
pub(crate) fn hydro_ini_defaults(version: StudyVersion) -> Vec<(&'static str, Value)> {
    let mut defaults: Vec<(&'static str, Value)> = vec![
        ("inter-daily-breakdown", json!(1.0)),
        ("intra-daily-modulation", json!(24.0)),
        ("inter-monthly-breakdown", json!(1.0)),
    ];
    if version >= StudyVersion::V6_5 {
        defaults.extend([
            ("initialize reservoir date", json!(0)),
            ("leeway low", json!(1.0)),
            ("leeway up", json!(1.0)),
            ("pumping efficiency", json!(1.0)),
        ]);
    }
    defaults
}

/// Hydro capacity matrix prefixes (`input/hydro/common/capacity/<prefix>_<area>`) and their defaults.
pub(crate) fn hydro_capacity_defaults(
    version: StudyVersion,
    constants: &MatrixConstants,
) -> Vec<(&'static str, MatrixRef)> {
    let mut defaults: Vec<(&'static str, MatrixRef)> = vec![
        ("maxpower", constants.hydro_max_power.clone()),
        ("reservoir", constants.hydro_reservoir.clone()),
    ];
    if version >= StudyVersion::V6_5 {
        defaults.extend([
            ("creditmodulations", constants.hydro_credit_modulations.clone()),
            ("inflowPattern", constants.hydro_inflow_pattern.clone()),
            ("waterValues", constants.hydro_water_values.clone()),
        ]);
    }
    defaults
}

/// Hydro series of an area.
pub(crate) fn hydro_series_names(version: StudyVersion) -> Vec<&'static str> {
    if version >= StudyVersion::V8_6 {
        vec!["mod", "ror", "mingen"]
    } else {
        vec!["mod", "ror"]
    }
}

/// Load, wind and solar prepro matrices and their defaults.
pub(crate) fn prepro_defaults(constants: &MatrixConstants) -> [(&'static str, MatrixRef); 4] {
    [
        ("conversion", constants.prepro_conversion.clone()),
        ("data", constants.prepro_data.clone()),
        ("k", constants.prepro_k.clone()),
        ("translation", constants.null_matrix.clone()),
    ]
}

fn link(reference: &MatrixRef) -> Value {
    Value::String(reference.link())
}

/// Creates an area with default settings and matrices.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateArea {
    area_name: String,
}

impl CreateArea {
    /// Builds the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the name contains forbidden characters.
    pub fn new(area_name: &str) -> Result<Self, CommandError> {
        validate_name("area", area_name)?;
        Ok(Self {
            area_name: area_name.to_string(),
        })
    }

    /// The area name as given.
    #[must_use]
    pub fn area_name(&self) -> &str {
        &self.area_name
    }

    /// The area id derived from the name.
    #[must_use]
    pub fn area_id(&self) -> String {
        transform_name_to_id(&self.area_name, true)
    }

    fn write_tree(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
        id: &str,
    ) -> Result<(), CommandError> {
        let version: StudyVersion = study.version();
        let constants: &MatrixConstants = ctx.constants();
        let tree: &mut dyn StudyTree = study.tree.as_mut();

        save(tree, default_optimization(), &format!("input/areas/{id}/optimization"))?;
        save(tree, default_ui(), &format!("input/areas/{id}/ui"))?;

        for kind in TIME_SERIES_KINDS {
            save(
                tree,
                link(&constants.null_matrix),
                &format!("input/{kind}/series/{kind}_{id}"),
            )?;
            for (name, default) in prepro_defaults(constants) {
                save(tree, link(&default), &format!("input/{kind}/prepro/{id}/{name}"))?;
            }
            save(tree, json!({}), &format!("input/{kind}/prepro/{id}/settings"))?;
        }

        save(tree, link(&constants.misc_gen), &format!("input/misc-gen/miscgen-{id}"))?;
        save(tree, link(&constants.reserves), &format!("input/reserves/{id}"))?;
        save(tree, json!({}), &format!("input/links/{id}/properties"))?;

        save(tree, json!({}), &format!("input/thermal/clusters/{id}/list"))?;
        save(tree, json!({}), &format!("input/thermal/prepro/{id}"))?;
        save(tree, json!({}), &format!("input/thermal/series/{id}"))?;
        for cost in THERMAL_AREA_COSTS {
            save(tree, json!(0.0), &format!("input/thermal/areas/{cost}/{id}"))?;
        }

        if version >= StudyVersion::V8_1 {
            save(tree, json!({}), &format!("input/renewables/clusters/{id}/list"))?;
            save(tree, json!({}), &format!("input/renewables/series/{id}"))?;
        }
        if version >= StudyVersion::V8_6 {
            save(tree, json!({}), &format!("input/st-storage/clusters/{id}/list"))?;
            save(tree, json!({}), &format!("input/st-storage/series/{id}"))?;
        }

        // Hydro
        save(
            tree,
            json!({ "[allocation]": { id: 1 } }),
            &format!("input/hydro/allocation/{id}"),
        )?;
        for (key, value) in hydro_ini_defaults(version) {
            save(tree, value, &format!("input/hydro/hydro/{key}/{id}"))?;
        }
        save(
            tree,
            link(&constants.null_matrix),
            &format!("input/hydro/prepro/{id}/energy"),
        )?;
        save(
            tree,
            json!({ "prepro": { "intermonthly-correlation": 0.5 } }),
            &format!("input/hydro/prepro/{id}/prepro"),
        )?;
        for series in hydro_series_names(version) {
            save(
                tree,
                link(&constants.null_matrix),
                &format!("input/hydro/series/{id}/{series}"),
            )?;
        }
        for (prefix, default) in hydro_capacity_defaults(version, constants) {
            save(
                tree,
                link(&default),
                &format!("input/hydro/common/capacity/{prefix}_{id}"),
            )?;
        }
        Ok(())
    }
}

impl CommandOps for CreateArea {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        let raw: Self = decode(CommandName::CreateArea, args)?;
        Self::new(&raw.area_name)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "area_name": self.area_name }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.area_id()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        let id: String = self.area_id();

        // Check for duplicate
        if study.config.areas.contains_key(&id) {
            return Ok(CommandOutput::failure(format!(
                "Area '{}' already exists and could not be created",
                self.area_name
            )));
        }

        self.write_tree(study, ctx, &id)?;
        study.config.areas.insert(id.clone(), Area::new(&self.area_name));
        save_area_list(study)?;

        Ok(CommandOutput::success(format!(
            "Area '{}' created with id '{id}'",
            self.area_name
        )))
    }

    fn create_diff(
        &self,
        _other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        Vec::new()
    }
}

/// Removes an area and everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoveArea {
    id: String,
}

impl RemoveArea {
    /// Builds the command.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    /// The area id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn remove_links(&self, study: &mut FileStudy) -> Result<(), CommandError> {
        let id: &str = &self.id;

        // Links owned by another area
        let owners: Vec<String> = study
            .config
            .areas
            .iter()
            .filter(|(_, area)| area.links.contains_key(id))
            .map(|(owner, _)| owner.clone())
            .collect();
        for owner in owners {
            delete_link_files(study.tree.as_mut(), &owner, id)?;
            if let Some(area) = study.config.areas.get_mut(&owner) {
                area.links.remove(id);
            }
        }

        // Links owned by this area
        delete_if_exists(study.tree.as_mut(), &format!("input/links/{id}"))?;
        Ok(())
    }

    fn remove_from_districts(&self, study: &mut FileStudy) -> Result<(), CommandError> {
        let members: Vec<String> = study
            .config
            .sets
            .iter()
            .filter(|(_, set)| set.areas.as_ref().is_some_and(|a| a.contains(&self.id)))
            .map(|(set_id, _)| set_id.clone())
            .collect();

        for set_id in members {
            if let Some(areas) = study
                .config
                .sets
                .get_mut(&set_id)
                .and_then(|set| set.areas.as_mut())
            {
                areas.retain(|a| a != &self.id);
            }

            let path: String = format!("input/areas/sets/{set_id}");
            let mut section: Map<String, Value> = read_section(study.tree.as_ref(), &path)?;
            for key in ["+", "-"] {
                if let Some(Value::Array(items)) = section.get_mut(key) {
                    items.retain(|item| item.as_str() != Some(self.id.as_str()));
                }
            }
            save(study.tree.as_mut(), Value::Object(section), &path)?;
        }
        Ok(())
    }

    fn remove_tree(&self, study: &mut FileStudy) -> Result<(), CommandError> {
        let id: &str = &self.id;
        let tree: &mut dyn StudyTree = study.tree.as_mut();

        let mut paths: Vec<String> = vec![
            format!("input/areas/{id}"),
            format!("input/misc-gen/miscgen-{id}"),
            format!("input/reserves/{id}"),
            format!("input/thermal/clusters/{id}"),
            format!("input/thermal/prepro/{id}"),
            format!("input/thermal/series/{id}"),
            format!("input/renewables/clusters/{id}"),
            format!("input/renewables/series/{id}"),
            format!("input/st-storage/clusters/{id}"),
            format!("input/st-storage/series/{id}"),
            format!("input/hydro/allocation/{id}"),
            format!("input/hydro/prepro/{id}"),
            format!("input/hydro/series/{id}"),
        ];
        for kind in TIME_SERIES_KINDS {
            paths.push(format!("input/{kind}/series/{kind}_{id}"));
            paths.push(format!("input/{kind}/prepro/{id}"));
        }
        for cost in THERMAL_AREA_COSTS {
            paths.push(format!("input/thermal/areas/{cost}/{id}"));
        }
        for prefix in ["maxpower", "reservoir", "creditmodulations", "inflowPattern", "waterValues"]
        {
            paths.push(format!("input/hydro/common/capacity/{prefix}_{id}"));
        }
        for path in &paths {
            delete_if_exists(tree, path)?;
        }

        // hydro.ini and the allocation of other areas are keyed by area
        let hydro: Map<String, Value> = read_section(tree, "input/hydro/hydro")?;
        for key in hydro.keys() {
            delete_if_exists(tree, &format!("input/hydro/hydro/{key}/{id}"))?;
        }
        let allocations: Map<String, Value> = read_section(tree, "input/hydro/allocation")?;
        for other in allocations.keys() {
            delete_if_exists(
                tree,
                &format!("input/hydro/allocation/{other}/[allocation]/{id}"),
            )?;
        }
        Ok(())
    }
}

impl CommandOps for RemoveArea {
    fn from_args(args: Map<String, Value>, _ctx: &CommandContext) -> Result<Self, CommandError> {
        decode(CommandName::RemoveArea, args)
    }

    fn to_args(&self) -> Map<String, Value> {
        object(json!({ "id": self.id }))
    }

    fn signature_keys(&self) -> Vec<String> {
        vec![self.id.clone()]
    }

    fn apply(
        &self,
        study: &mut FileStudy,
        _ctx: &CommandContext,
    ) -> Result<CommandOutput, CommandError> {
        if !study.config.areas.contains_key(&self.id) {
            return Ok(CommandOutput::failure(format!(
                "Area '{}' does not exist",
                self.id
            )));
        }

        let constraints: Vec<String> = study.config.bindings_referencing_area(&self.id);
        remove_binding_constraints(study, &constraints)?;
        self.remove_links(study)?;
        self.remove_from_districts(study)?;
        self.remove_tree(study)?;

        study.config.areas.remove(&self.id);
        save_area_list(study)?;

        Ok(CommandOutput::success(format!("Area '{}' deleted", self.id)))
    }

    fn create_diff(
        &self,
        _other: &Self,
        _version: StudyVersion,
        _ctx: &CommandContext,
    ) -> Vec<Command> {
        Vec::new()
    }
}
