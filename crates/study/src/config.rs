// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::version::StudyVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Every output filter, in the order Antares writes them.
pub const ALL_FILTERING: [&str; 5] = ["hourly", "daily", "weekly", "monthly", "annual"];

fn all_filtering() -> Vec<String> {
    ALL_FILTERING.iter().map(ToString::to_string).collect()
}

/// How renewable generation is modelled in the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnrModelling {
    /// Wind and solar are aggregated time series.
    #[default]
    Aggregated,
    /// Renewables are modelled as clusters.
    Clusters,
}

impl EnrModelling {
    /// Returns the value written in `settings/generaldata`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregated => "aggregated",
            Self::Clusters => "clusters",
        }
    }
}

/// Frequency of a binding constraint's second member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BindingConstraintFrequency {
    #[default]
    Hourly,
    Daily,
    Weekly,
}

impl BindingConstraintFrequency {
    /// Returns the value written in the constraint index.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Parses the value stored in the constraint index.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }

    /// Number of rows of the second-member matrices.
    ///
    /// Daily and weekly constraints share the same 366-row matrix family.
    #[must_use]
    pub const fn matrix_rows(&self) -> usize {
        match self {
            Self::Hourly => 8784,
            Self::Daily | Self::Weekly => 366,
        }
    }
}

/// Output filters of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub filters_synthesis: Vec<String>,
    pub filters_year: Vec<String>,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            filters_synthesis: all_filtering(),
            filters_year: all_filtering(),
        }
    }
}

/// A thermal, renewable or short-term storage cluster as seen by the config index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRef {
    /// Lower-cased identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    pub enabled: bool,
}

impl ClusterRef {
    /// Creates a cluster reference.
    #[must_use]
    pub fn new(id: &str, name: &str, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            enabled,
        }
    }
}

/// An area of the study.
///
/// Links are only stored on the area whose id sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    pub links: BTreeMap<String, Link>,
    pub thermals: Vec<ClusterRef>,
    pub renewables: Vec<ClusterRef>,
    pub st_storages: Vec<ClusterRef>,
    pub filters_synthesis: Vec<String>,
    pub filters_year: Vec<String>,
}

impl Area {
    /// Creates an area with no links nor clusters and every output filter enabled.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            links: BTreeMap::new(),
            thermals: Vec::new(),
            renewables: Vec::new(),
            st_storages: Vec::new(),
            filters_synthesis: all_filtering(),
            filters_year: all_filtering(),
        }
    }

    /// Checks if a thermal cluster exists in this area.
    #[must_use]
    pub fn has_thermal(&self, cluster_id: &str) -> bool {
        self.thermals.iter().any(|c| c.id == cluster_id)
    }

    /// Checks if a renewable cluster exists in this area.
    #[must_use]
    pub fn has_renewable(&self, cluster_id: &str) -> bool {
        self.renewables.iter().any(|c| c.id == cluster_id)
    }

    /// Checks if a short-term storage exists in this area.
    #[must_use]
    pub fn has_st_storage(&self, storage_id: &str) -> bool {
        self.st_storages.iter().any(|c| c.id == storage_id)
    }
}

/// A district: a named set of areas whose results are aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictSet {
    pub name: Option<String>,
    /// When set, the district contains every area except `areas`.
    pub inverted_set: bool,
    pub areas: Option<Vec<String>>,
    pub output: bool,
    pub filters_synthesis: Vec<String>,
    pub filters_year: Vec<String>,
}

impl DistrictSet {
    /// Creates a district.
    #[must_use]
    pub fn new(name: &str, inverted_set: bool, areas: Vec<String>, output: bool) -> Self {
        Self {
            name: Some(name.to_string()),
            inverted_set,
            areas: Some(areas),
            output,
            filters_synthesis: all_filtering(),
            filters_year: all_filtering(),
        }
    }

    /// Resolves the areas belonging to the district.
    #[must_use]
    pub fn get_areas(&self, all_areas: &[String]) -> Vec<String> {
        let listed: Vec<String> = self.areas.clone().unwrap_or_default();
        if self.inverted_set {
            all_areas
                .iter()
                .filter(|a| !listed.contains(a))
                .cloned()
                .collect()
        } else {
            listed
        }
    }
}

/// Index entry for a binding constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConstraintSummary {
    pub id: String,
    /// Link terms, as `area1%area2`.
    pub links: BTreeSet<String>,
    /// Cluster terms, as `area.cluster`.
    pub clusters: BTreeSet<String>,
    pub time_step: BindingConstraintFrequency,
    pub group: Option<String>,
}

impl BindingConstraintSummary {
    /// Returns every area referenced by a link or cluster term.
    #[must_use]
    pub fn areas(&self) -> BTreeSet<String> {
        let from_links = self
            .links
            .iter()
            .flat_map(|term| term.split('%').map(ToString::to_string));
        let from_clusters = self
            .clusters
            .iter()
            .filter_map(|term| term.split('.').next().map(ToString::to_string));
        from_links.chain(from_clusters).collect()
    }
}

/// The in-memory index of a study, kept in sync with its tree by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StudyConfig {
    pub version: StudyVersion,
    #[serde(default)]
    pub enr_modelling: EnrModelling,
    #[serde(default)]
    pub areas: BTreeMap<String, Area>,
    #[serde(default)]
    pub sets: BTreeMap<String, DistrictSet>,
    #[serde(default)]
    pub bindings: Vec<BindingConstraintSummary>,
}

impl StudyConfig {
    /// Creates an empty config.
    ///
    /// Renewables are modelled as clusters whenever the version supports it.
    #[must_use]
    pub fn new(version: StudyVersion) -> Self {
        let enr_modelling: EnrModelling = if version >= StudyVersion::V8_1 {
            EnrModelling::Clusters
        } else {
            EnrModelling::Aggregated
        };
        Self {
            version,
            enr_modelling,
            areas: BTreeMap::new(),
            sets: BTreeMap::new(),
            bindings: Vec::new(),
        }
    }

    /// Returns the ids of every area.
    #[must_use]
    pub fn area_ids(&self) -> Vec<String> {
        self.areas.keys().cloned().collect()
    }

    /// Checks if a link exists, in either direction.
    #[must_use]
    pub fn has_link(&self, area1: &str, area2: &str) -> bool {
        let (first, second) = if area1 <= area2 {
            (area1, area2)
        } else {
            (area2, area1)
        };
        self.areas
            .get(first)
            .is_some_and(|area| area.links.contains_key(second))
    }

    /// Finds a binding constraint by id.
    #[must_use]
    pub fn binding(&self, id: &str) -> Option<&BindingConstraintSummary> {
        self.bindings.iter().find(|b| b.id == id)
    }

    /// Ids of the binding constraints with a term on the given area.
    #[must_use]
    pub fn bindings_referencing_area(&self, area_id: &str) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|b| b.areas().contains(area_id))
            .map(|b| b.id.clone())
            .collect()
    }

    /// Ids of the binding constraints with a term on the given link.
    #[must_use]
    pub fn bindings_referencing_link(&self, area1: &str, area2: &str) -> Vec<String> {
        let term: String = format!("{area1}%{area2}");
        let reversed: String = format!("{area2}%{area1}");
        self.bindings
            .iter()
            .filter(|b| b.links.contains(&term) || b.links.contains(&reversed))
            .map(|b| b.id.clone())
            .collect()
    }

    /// Ids of the binding constraints with a term on the given thermal cluster.
    #[must_use]
    pub fn bindings_referencing_cluster(&self, area_id: &str, cluster_id: &str) -> Vec<String> {
        let term: String = format!("{area_id}.{cluster_id}");
        self.bindings
            .iter()
            .filter(|b| b.clusters.contains(&term))
            .map(|b| b.id.clone())
            .collect()
    }
}
