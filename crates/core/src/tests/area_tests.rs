// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    apply_ok, create_test_context, create_test_study, create_two_area_study, tree_get,
};
use crate::{
    BindingConstraintProperties, Command, CommandContext, CommandError, CommandOutput, CreateArea,
    CreateBindingConstraint, CreateDistrict, DistrictBaseFilter, RemoveArea, RemoveDistrict,
    UpdateDistrict,
};
use antares_study::{FileStudy, StudyError, StudyVersion, TreeError};
use serde_json::{Value, json};
use std::collections::BTreeMap;

// ============================================================================
// CreateArea
// ============================================================================

#[test]
fn test_create_area_derives_lowercase_id() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    let command: CreateArea = CreateArea::new("Area 1").unwrap();

    assert_eq!(command.area_id(), "area 1");
    apply_ok(command, &mut study, &ctx);

    assert!(study.config.areas.contains_key("area 1"));
    assert_eq!(study.config.areas["area 1"].name, "Area 1");
    assert_eq!(tree_get(&study, "input/areas/list").unwrap(), json!(["Area 1"]));
}

#[test]
fn test_create_area_twice_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(CreateArea::new("fr").unwrap(), &mut study, &ctx);

    let output: CommandOutput = Command::from(CreateArea::new("FR").unwrap())
        .apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("already exists"));
    assert_eq!(study.config.areas.len(), 1);
}

#[test]
fn test_create_area_rejects_invalid_name() {
    let result: Result<CreateArea, CommandError> = CreateArea::new("fr/de");

    assert!(matches!(
        result,
        Err(CommandError::Study(StudyError::InvalidName { .. }))
    ));
}

#[test]
fn test_create_area_writes_default_matrices() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);
    apply_ok(CreateArea::new("fr").unwrap(), &mut study, &ctx);

    assert_eq!(
        tree_get(&study, "input/load/series/load_fr").unwrap(),
        json!(ctx.constants().null_matrix.link())
    );
    assert_eq!(
        tree_get(&study, "input/misc-gen/miscgen-fr").unwrap(),
        json!(ctx.constants().misc_gen.link())
    );
    assert_eq!(
        tree_get(&study, "input/hydro/common/capacity/maxpower_fr").unwrap(),
        json!(ctx.constants().hydro_max_power.link())
    );
    assert_eq!(
        tree_get(&study, "input/hydro/allocation/fr").unwrap(),
        json!({ "[allocation]": { "fr": 1 } })
    );
}

#[test]
fn test_create_area_follows_study_version() {
    let ctx: CommandContext = create_test_context();
    let mut old: FileStudy = create_test_study(StudyVersion::V7_0);
    let mut recent: FileStudy = create_test_study(StudyVersion::V8_6);

    apply_ok(CreateArea::new("fr").unwrap(), &mut old, &ctx);
    apply_ok(CreateArea::new("fr").unwrap(), &mut recent, &ctx);

    assert!(tree_get(&old, "input/renewables/clusters/fr").is_err());
    assert!(tree_get(&old, "input/hydro/series/fr/mingen").is_err());
    assert!(tree_get(&recent, "input/renewables/clusters/fr/list").is_ok());
    assert!(tree_get(&recent, "input/st-storage/clusters/fr/list").is_ok());
    assert!(tree_get(&recent, "input/hydro/series/fr/mingen").is_ok());
}

// ============================================================================
// RemoveArea
// ============================================================================

#[test]
fn test_remove_area_deletes_links_and_constraints() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    let coeffs: BTreeMap<String, Vec<f64>> = BTreeMap::from([(String::from("fr%de"), vec![1.0])]);
    apply_ok(
        CreateBindingConstraint::new(
            "bc 1",
            BindingConstraintProperties::default(),
            coeffs,
            StudyVersion::LATEST,
        )
        .unwrap(),
        &mut study,
        &ctx,
    );

    apply_ok(RemoveArea::new("fr"), &mut study, &ctx);

    assert!(!study.config.areas.contains_key("fr"));
    assert!(study.config.areas["de"].links.is_empty());
    assert!(study.config.bindings.is_empty());
    assert!(matches!(
        tree_get(&study, "input/links/de/properties/fr"),
        Err(TreeError::ChildNotFound { .. })
    ));
    assert!(tree_get(&study, "input/areas/fr").is_err());
    assert!(tree_get(&study, "input/bindingconstraints/bc 1_eq").is_err());
    assert_eq!(tree_get(&study, "input/areas/list").unwrap(), json!(["de"]));
}

#[test]
fn test_remove_area_leaves_hydro_of_other_areas() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);

    apply_ok(RemoveArea::new("fr"), &mut study, &ctx);

    assert!(tree_get(&study, "input/hydro/hydro/leeway low/de").is_ok());
    assert!(tree_get(&study, "input/hydro/hydro/leeway low/fr").is_err());
    assert!(tree_get(&study, "input/hydro/allocation/de").is_ok());
}

#[test]
fn test_remove_unknown_area_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_test_study(StudyVersion::LATEST);

    let output: CommandOutput = Command::from(RemoveArea::new("fr")).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("does not exist"));
}

#[test]
fn test_remove_area_updates_districts() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    apply_ok(
        CreateDistrict::new(
            "North",
            DistrictBaseFilter::RemoveAll,
            vec![String::from("fr"), String::from("de")],
            true,
            "",
        )
        .unwrap(),
        &mut study,
        &ctx,
    );

    apply_ok(RemoveArea::new("fr"), &mut study, &ctx);

    assert_eq!(
        study.config.sets["north"].areas,
        Some(vec![String::from("de")])
    );
    assert_eq!(
        tree_get(&study, "input/areas/sets/north/+").unwrap(),
        json!(["de"])
    );
}

// ============================================================================
// Districts
// ============================================================================

#[test]
fn test_create_district_with_unknown_area_fails() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    let command: CreateDistrict = CreateDistrict::new(
        "North",
        DistrictBaseFilter::RemoveAll,
        vec![String::from("it")],
        true,
        "",
    )
    .unwrap();

    let output: CommandOutput = Command::from(command).apply(&mut study, &ctx);

    assert!(!output.status);
    assert!(output.message.contains("'it'"));
    assert!(study.config.sets.is_empty());
}

#[test]
fn test_update_district_keeps_unset_fields() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    apply_ok(
        CreateDistrict::new(
            "North",
            DistrictBaseFilter::RemoveAll,
            vec![String::from("fr")],
            true,
            "first",
        )
        .unwrap(),
        &mut study,
        &ctx,
    );

    apply_ok(
        UpdateDistrict::new("north").with_output(false),
        &mut study,
        &ctx,
    );

    let section: Value = tree_get(&study, "input/areas/sets/north").unwrap();
    assert_eq!(section["caption"], json!("North"));
    assert_eq!(section["comments"], json!("first"));
    assert_eq!(section["output"], json!(false));
    assert_eq!(section["+"], json!(["fr"]));
    assert!(!study.config.sets["north"].output);
}

#[test]
fn test_update_district_switches_base_filter() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    apply_ok(
        CreateDistrict::new("North", DistrictBaseFilter::RemoveAll, Vec::new(), true, "")
            .unwrap(),
        &mut study,
        &ctx,
    );

    apply_ok(
        UpdateDistrict::new("north")
            .with_filter(DistrictBaseFilter::AddAll, vec![String::from("de")]),
        &mut study,
        &ctx,
    );

    assert!(study.config.sets["north"].inverted_set);
    assert_eq!(
        study.config.sets["north"].get_areas(&study.config.area_ids()),
        vec![String::from("fr")]
    );
    assert_eq!(
        tree_get(&study, "input/areas/sets/north/-").unwrap(),
        json!(["de"])
    );
}

#[test]
fn test_remove_district() {
    let ctx: CommandContext = create_test_context();
    let mut study: FileStudy = create_two_area_study(&ctx, StudyVersion::LATEST);
    apply_ok(
        CreateDistrict::new("North", DistrictBaseFilter::RemoveAll, Vec::new(), true, "")
            .unwrap(),
        &mut study,
        &ctx,
    );

    apply_ok(RemoveDistrict::new("north"), &mut study, &ctx);

    assert!(study.config.sets.is_empty());
    assert!(tree_get(&study, "input/areas/sets/north").is_err());
}
