// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Rebuilds commands from the current state of a study.
//!
//! Every extraction produces commands that, applied to a study lacking the
//! entity, recreate it as it is stored. Matrices are referenced by id: a
//! literal matrix found in the tree is stored in the matrix service first.

use crate::command::area::{
    TIME_SERIES_KINDS, hydro_capacity_defaults, hydro_series_names, prepro_defaults,
};
use crate::command::binding_constraint::{ConstraintMatrices, is_term, parse_term};
use crate::command::common::{read_constraint_sections, section_id};
use crate::command::district::DistrictBaseFilter;
use crate::command::link::link_matrix_paths;
use crate::command::raw::{COMMENTS, GENERAL_DATA};
use crate::command::settings::SCENARIO_BUILDER;
use crate::command::st_storage::st_storage_defaults;
use crate::command::{
    BindingConstraintOperator, BindingConstraintProperties, Command, CreateArea,
    CreateBindingConstraint, CreateCluster, CreateDistrict, CreateLink, CreateRenewablesCluster,
    CreateStStorage, ReplaceMatrix, UpdateComments, UpdateConfig, UpdatePlaylist, UpdateRawFile,
    UpdateScenarioBuilder,
};
use crate::context::CommandContext;
use crate::dto::CommandName;
use crate::error::CommandError;
use antares_study::{
    Area, BindingConstraintFrequency, DistrictSet, FileStudy, Matrix, MatrixConstants, MatrixRef,
    StudyTree, StudyVersion, TreeError, url,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Keeps a command, or drops it when its source does not exist.
fn optional(result: Result<Command, CommandError>) -> Result<Option<Command>, CommandError> {
    match result {
        Ok(command) => Ok(Some(command)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

fn get_object(tree: &dyn StudyTree, path: &str) -> Result<Map<String, Value>, CommandError> {
    match tree.get(&url(path))? {
        Value::Object(map) => Ok(map),
        _ => Err(TreeError::NotAFolder {
            path: path.to_string(),
        }
        .into()),
    }
}

/// Splits a cluster section into its name and the remaining parameters.
fn split_name(mut section: Map<String, Value>, fallback: &str) -> (String, Map<String, Value>) {
    let name: String = match section.remove("name") {
        Some(Value::String(name)) => name,
        _ => fallback.to_string(),
    };
    (name, section)
}

fn strings(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect(),
        ),
        Value::String(item) => Some(vec![item.clone()]),
        _ => None,
    }
}

/// Rebuilds commands from a study.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    ctx: CommandContext,
}

impl CommandExtractor {
    /// Creates an extractor; literal matrices are stored through `ctx`.
    #[must_use]
    pub const fn new(ctx: CommandContext) -> Self {
        Self { ctx }
    }

    fn constants(&self) -> &MatrixConstants {
        self.ctx.constants()
    }

    /// Reads the matrix stored at `path` as a reference.
    fn read_matrix(
        &self,
        tree: &dyn StudyTree,
        path: &str,
        default: Option<&MatrixRef>,
    ) -> Result<MatrixRef, CommandError> {
        let node: Result<Value, TreeError> = tree.get(&url(path));
        match node {
            Ok(Value::String(link)) => {
                if let Some(reference) = MatrixRef::from_link(&link) {
                    return Ok(reference);
                }
            }
            Ok(value @ Value::Array(_)) => {
                let data: Matrix =
                    serde_json::from_value(value).map_err(|e| CommandError::InvalidMatrix {
                        reason: format!("'{path}' is not a matrix: {e}"),
                    })?;
                return Ok(MatrixRef::new(&self.ctx.matrix_service().create(&data)));
            }
            Ok(_) | Err(TreeError::ChildNotFound { .. }) => {}
            Err(err) => return Err(err.into()),
        }
        default.cloned().ok_or_else(|| CommandError::InvalidMatrix {
            reason: format!("no matrix found at '{path}'"),
        })
    }

    /// An [`UpdateConfig`] writing back the data stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the path is absent.
    pub fn generate_update_config(
        &self,
        tree: &dyn StudyTree,
        path: &str,
    ) -> Result<Command, CommandError> {
        let data: Value = tree.get(&url(path))?;
        Ok(UpdateConfig::new(path, data).into())
    }

    /// A [`ReplaceMatrix`] pointing `path` at its current matrix.
    ///
    /// An absent or unreadable node falls back to `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is absent and there is no default.
    pub fn generate_replace_matrix(
        &self,
        tree: &dyn StudyTree,
        path: &str,
        default: Option<&MatrixRef>,
    ) -> Result<Command, CommandError> {
        let matrix: MatrixRef = self.read_matrix(tree, path, default)?;
        Ok(ReplaceMatrix::new(path, matrix).into())
    }

    /// An [`UpdateRawFile`] writing back the raw file stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is absent or is not a raw file.
    pub fn generate_update_rawfile(
        &self,
        tree: &dyn StudyTree,
        path: &str,
    ) -> Result<Command, CommandError> {
        match tree.get(&url(path))? {
            Value::String(content) => Ok(UpdateRawFile::new(path, &content).into()),
            _ => Err(CommandError::validation(
                CommandName::UpdateRawFile.as_str(),
                format!("'{path}' is not a raw file"),
            )),
        }
    }

    /// The whole study as a command list: areas, then links, districts,
    /// binding constraints and settings.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity of the config is missing from the tree.
    pub fn extract(&self, study: &FileStudy) -> Result<Vec<Command>, CommandError> {
        let mut commands: Vec<Command> = Vec::new();
        let mut links: Vec<Command> = Vec::new();

        for area_id in study.config.areas.keys() {
            let (area_commands, link_commands): (Vec<Command>, Vec<Command>) =
                self.area_parts(study, area_id)?;
            commands.extend(area_commands);
            links.extend(link_commands);
        }
        commands.extend(links);

        for district_id in study.config.sets.keys() {
            commands.extend(self.extract_district(study, district_id)?);
        }
        for binding in &study.config.bindings {
            commands.extend(self.extract_binding_constraint(study, &binding.id)?);
        }

        let tree: &dyn StudyTree = study.tree.as_ref();
        commands.extend(optional(self.generate_update_config(tree, GENERAL_DATA))?);
        commands.extend(optional(self.extract_comments(study))?);
        commands.extend(optional(self.extract_scenario_builder(study))?);

        debug!(count = commands.len(), "Extracted study");
        Ok(commands)
    }

    /// The commands recreating an area, its clusters, series, hydro settings
    /// and every link it takes part in.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the area does not exist.
    pub fn extract_area(
        &self,
        study: &FileStudy,
        area_id: &str,
    ) -> Result<Vec<Command>, CommandError> {
        let (mut commands, links): (Vec<Command>, Vec<Command>) =
            self.area_parts(study, area_id)?;
        commands.extend(links);

        // Links owned by an area sorting before this one
        for (owner, area) in &study.config.areas {
            if area.links.contains_key(area_id) {
                commands.extend(self.extract_link(study, owner, area_id)?);
            }
        }
        Ok(commands)
    }

    /// The area commands and the commands of the links the area owns.
    fn area_parts(
        &self,
        study: &FileStudy,
        area_id: &str,
    ) -> Result<(Vec<Command>, Vec<Command>), CommandError> {
        let area: &Area = study
            .config
            .areas
            .get(area_id)
            .ok_or_else(|| CommandError::entity_not_found("area", area_id))?;
        let version: StudyVersion = study.version();
        let tree: &dyn StudyTree = study.tree.as_ref();
        let constants: &MatrixConstants = self.constants();

        let mut commands: Vec<Command> = vec![CreateArea::new(&area.name)?.into()];
        for file in ["optimization", "ui"] {
            commands.extend(optional(
                self.generate_update_config(tree, &format!("input/areas/{area_id}/{file}")),
            )?);
        }

        for cluster in &area.thermals {
            commands.extend(self.extract_cluster(study, area_id, &cluster.id)?);
        }
        for cluster in &area.renewables {
            commands.extend(self.extract_renewables_cluster(study, area_id, &cluster.id)?);
        }
        if version >= StudyVersion::V8_6 {
            for storage in &area.st_storages {
                commands.extend(self.extract_st_storage(study, area_id, &storage.id)?);
            }
        }

        for kind in TIME_SERIES_KINDS {
            commands.push(self.generate_replace_matrix(
                tree,
                &format!("input/{kind}/series/{kind}_{area_id}"),
                Some(&constants.null_matrix),
            )?);
            for (name, default) in prepro_defaults(constants) {
                commands.push(self.generate_replace_matrix(
                    tree,
                    &format!("input/{kind}/prepro/{area_id}/{name}"),
                    Some(&default),
                )?);
            }
            commands.extend(optional(self.generate_update_config(
                tree,
                &format!("input/{kind}/prepro/{area_id}/settings"),
            ))?);
        }
        commands.push(self.generate_replace_matrix(
            tree,
            &format!("input/reserves/{area_id}"),
            Some(&constants.reserves),
        )?);
        commands.push(self.generate_replace_matrix(
            tree,
            &format!("input/misc-gen/miscgen-{area_id}"),
            Some(&constants.misc_gen),
        )?);

        commands.extend(self.extract_hydro(study, area_id)?);

        let mut links: Vec<Command> = Vec::new();
        for other in area.links.keys() {
            links.extend(self.extract_link(study, area_id, other)?);
        }
        Ok((commands, links))
    }

    /// The command recreating a link with its properties and matrices.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the link does not exist.
    pub fn extract_link(
        &self,
        study: &FileStudy,
        area1: &str,
        area2: &str,
    ) -> Result<Vec<Command>, CommandError> {
        let mut link: CreateLink = CreateLink::new(area1, area2);
        let (area1, area2): (String, String) = (link.area1().to_string(), link.area2().to_string());
        if !study.config.has_link(&area1, &area2) {
            return Err(CommandError::entity_not_found(
                "link",
                format!("{area1}%{area2}"),
            ));
        }

        let tree: &dyn StudyTree = study.tree.as_ref();
        let properties: Map<String, Value> =
            get_object(tree, &format!("input/links/{area1}/properties/{area2}"))?;
        link = link.with_parameters(properties);
        for (kind, path, default) in
            link_matrix_paths(study.version(), &area1, &area2, self.constants())
        {
            link.set_matrix(kind, self.read_matrix(tree, &path, Some(&default))?);
        }
        Ok(vec![link.into()])
    }

    /// The commands recreating a thermal cluster and its series.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the cluster does not exist.
    pub fn extract_cluster(
        &self,
        study: &FileStudy,
        area_id: &str,
        cluster_id: &str,
    ) -> Result<Vec<Command>, CommandError> {
        if !study
            .config
            .areas
            .get(area_id)
            .is_some_and(|area| area.has_thermal(cluster_id))
        {
            return Err(CommandError::entity_not_found(
                "thermal cluster",
                format!("{area_id}.{cluster_id}"),
            ));
        }

        let tree: &dyn StudyTree = study.tree.as_ref();
        let constants: &MatrixConstants = self.constants();
        let section: Map<String, Value> = get_object(
            tree,
            &format!("input/thermal/clusters/{area_id}/list/{cluster_id}"),
        )?;
        let (name, parameters): (String, Map<String, Value>) = split_name(section, cluster_id);
        let prepro: MatrixRef = self.read_matrix(
            tree,
            &format!("input/thermal/prepro/{area_id}/{cluster_id}/data"),
            Some(&constants.thermal_prepro_data),
        )?;
        let modulation: MatrixRef = self.read_matrix(
            tree,
            &format!("input/thermal/prepro/{area_id}/{cluster_id}/modulation"),
            Some(&constants.thermal_prepro_modulation),
        )?;

        Ok(vec![
            CreateCluster::new(area_id, &name, parameters)?
                .with_matrices(Some(prepro), Some(modulation))
                .into(),
            self.generate_replace_matrix(
                tree,
                &format!("input/thermal/series/{area_id}/{cluster_id}/series"),
                Some(&constants.null_matrix),
            )?,
        ])
    }

    /// The commands recreating a renewable cluster and its series.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the cluster does not exist.
    pub fn extract_renewables_cluster(
        &self,
        study: &FileStudy,
        area_id: &str,
        cluster_id: &str,
    ) -> Result<Vec<Command>, CommandError> {
        if !study
            .config
            .areas
            .get(area_id)
            .is_some_and(|area| area.has_renewable(cluster_id))
        {
            return Err(CommandError::entity_not_found(
                "renewable cluster",
                format!("{area_id}.{cluster_id}"),
            ));
        }

        let tree: &dyn StudyTree = study.tree.as_ref();
        let section: Map<String, Value> = get_object(
            tree,
            &format!("input/renewables/clusters/{area_id}/list/{cluster_id}"),
        )?;
        let (name, parameters): (String, Map<String, Value>) = split_name(section, cluster_id);

        Ok(vec![
            CreateRenewablesCluster::new(area_id, &name, parameters)?.into(),
            self.generate_replace_matrix(
                tree,
                &format!("input/renewables/series/{area_id}/{cluster_id}/series"),
                Some(&self.constants().null_matrix),
            )?,
        ])
    }

    /// The command recreating a short-term storage with its series.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the storage does not exist.
    pub fn extract_st_storage(
        &self,
        study: &FileStudy,
        area_id: &str,
        storage_id: &str,
    ) -> Result<Vec<Command>, CommandError> {
        if !study
            .config
            .areas
            .get(area_id)
            .is_some_and(|area| area.has_st_storage(storage_id))
        {
            return Err(CommandError::entity_not_found(
                "short-term storage",
                format!("{area_id}.{storage_id}"),
            ));
        }

        let tree: &dyn StudyTree = study.tree.as_ref();
        let mut parameters: Map<String, Value> = get_object(
            tree,
            &format!("input/st-storage/clusters/{area_id}/list/{storage_id}"),
        )?;
        parameters
            .entry("name")
            .or_insert_with(|| Value::String(storage_id.to_string()));

        let mut storage: CreateStStorage = CreateStStorage::new(area_id, parameters, &self.ctx)?;
        for (name, default) in st_storage_defaults(self.constants()) {
            let reference: MatrixRef = self.read_matrix(
                tree,
                &format!("input/st-storage/series/{area_id}/{storage_id}/{name}"),
                Some(&default),
            )?;
            storage = storage.with_series(name, reference);
        }
        Ok(vec![storage.into()])
    }

    /// The commands restoring the hydro settings and matrices of an area.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the area does not exist.
    pub fn extract_hydro(
        &self,
        study: &FileStudy,
        area_id: &str,
    ) -> Result<Vec<Command>, CommandError> {
        if !study.config.areas.contains_key(area_id) {
            return Err(CommandError::entity_not_found("area", area_id));
        }
        let version: StudyVersion = study.version();
        let tree: &dyn StudyTree = study.tree.as_ref();
        let constants: &MatrixConstants = self.constants();
        let mut commands: Vec<Command> = Vec::new();

        commands.extend(optional(self.generate_update_config(
            tree,
            &format!("input/hydro/allocation/{area_id}"),
        ))?);

        // hydro.ini is keyed by property, then by area
        let hydro: Map<String, Value> = match tree.get(&url("input/hydro/hydro")) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, values) in &hydro {
            if values.get(area_id).is_some() {
                commands.push(
                    self.generate_update_config(tree, &format!("input/hydro/hydro/{key}/{area_id}"))?,
                );
            }
        }

        commands.push(self.generate_replace_matrix(
            tree,
            &format!("input/hydro/prepro/{area_id}/energy"),
            Some(&constants.null_matrix),
        )?);
        commands.extend(optional(self.generate_update_config(
            tree,
            &format!("input/hydro/prepro/{area_id}/prepro"),
        ))?);
        for series in hydro_series_names(version) {
            commands.push(self.generate_replace_matrix(
                tree,
                &format!("input/hydro/series/{area_id}/{series}"),
                Some(&constants.null_matrix),
            )?);
        }
        for (prefix, default) in hydro_capacity_defaults(version, constants) {
            commands.push(self.generate_replace_matrix(
                tree,
                &format!("input/hydro/common/capacity/{prefix}_{area_id}"),
                Some(&default),
            )?);
        }
        Ok(commands)
    }

    /// The command recreating a district.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the district does not exist.
    pub fn extract_district(
        &self,
        study: &FileStudy,
        district_id: &str,
    ) -> Result<Vec<Command>, CommandError> {
        let set: &DistrictSet = study
            .config
            .sets
            .get(district_id)
            .ok_or_else(|| CommandError::entity_not_found("district", district_id))?;
        let section: Map<String, Value> = match study
            .tree
            .get(&url(&format!("input/areas/sets/{district_id}")))
        {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let base_filter: DistrictBaseFilter = section
            .get("apply-filter")
            .and_then(Value::as_str)
            .and_then(DistrictBaseFilter::parse)
            .unwrap_or_else(|| DistrictBaseFilter::from_inverted(set.inverted_set));
        let items: Vec<String> = strings(section.get(base_filter.list_key()))
            .or_else(|| set.areas.clone())
            .unwrap_or_default();
        let output: bool = section
            .get("output")
            .and_then(Value::as_bool)
            .unwrap_or(set.output);
        let comments: &str = section
            .get("comments")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let name: String = section
            .get("caption")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .or_else(|| set.name.clone())
            .unwrap_or_else(|| district_id.to_string());

        Ok(vec![
            CreateDistrict::new(&name, base_filter, items, output, comments)?.into(),
        ])
    }

    /// The command recreating a binding constraint with its terms and matrices.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::EntityNotFound`] if the constraint does not exist.
    pub fn extract_binding_constraint(
        &self,
        study: &FileStudy,
        constraint_id: &str,
    ) -> Result<Vec<Command>, CommandError> {
        let not_found = || CommandError::entity_not_found("binding constraint", constraint_id);
        if study.config.binding(constraint_id).is_none() {
            return Err(not_found());
        }
        let version: StudyVersion = study.version();
        let tree: &dyn StudyTree = study.tree.as_ref();
        let section: Map<String, Value> = read_constraint_sections(tree)?
            .into_iter()
            .find(|section| section_id(section) == Some(constraint_id))
            .ok_or_else(not_found)?;

        let name: &str = section
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(constraint_id);
        let properties: BindingConstraintProperties =
            BindingConstraintProperties::from_section(&section, version);
        let coeffs: BTreeMap<String, Vec<f64>> = section
            .iter()
            .filter(|(key, _)| is_term(key))
            .filter_map(|(key, value)| parse_term(value).map(|terms| (key.clone(), terms)))
            .collect();

        let time_step: BindingConstraintFrequency = properties.time_step.unwrap_or_default();
        let default: &MatrixRef = self.constants().binding_constraint(time_step, version);
        let mut matrices: ConstraintMatrices = ConstraintMatrices::default();
        if version < StudyVersion::V8_7 {
            matrices.values = Some(self.read_matrix(
                tree,
                &format!("input/bindingconstraints/{constraint_id}"),
                Some(default),
            )?);
        } else {
            let suffixes: &[&str] = properties
                .operator
                .unwrap_or(BindingConstraintOperator::Equal)
                .matrix_suffixes();
            for suffix in suffixes {
                let reference: MatrixRef = self.read_matrix(
                    tree,
                    &format!("input/bindingconstraints/{constraint_id}{suffix}"),
                    Some(default),
                )?;
                matrices.set_term(suffix, reference);
            }
        }

        let command: CreateBindingConstraint =
            CreateBindingConstraint::new(name, properties, coeffs, version)?
                .with_matrices(matrices);
        Ok(vec![command.into()])
    }

    /// The command restoring the study comments.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the study has no comments.
    pub fn extract_comments(&self, study: &FileStudy) -> Result<Command, CommandError> {
        let comments: String = match study.tree.get(&url(COMMENTS))? {
            Value::String(comments) => comments,
            other => other.to_string(),
        };
        Ok(UpdateComments::new(&comments).into())
    }

    /// The command restoring the playlist from `settings/generaldata`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the study has no general settings.
    pub fn extract_playlist(&self, study: &FileStudy) -> Result<Command, CommandError> {
        let general: Map<String, Value> = get_object(study.tree.as_ref(), GENERAL_DATA)?;
        Ok(UpdatePlaylist::from_general_data(&general).into())
    }

    /// The command restoring every scenario builder ruleset.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the study has no scenario builder.
    pub fn extract_scenario_builder(&self, study: &FileStudy) -> Result<Command, CommandError> {
        let rulesets: Map<String, Value> = get_object(study.tree.as_ref(), SCENARIO_BUILDER)?;
        Ok(UpdateScenarioBuilder::new(rulesets).into())
    }
}
