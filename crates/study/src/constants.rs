// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::config::BindingConstraintFrequency;
use crate::matrix::{Matrix, MatrixRef, MatrixService};
use crate::version::StudyVersion;

const HOURS_IN_YEAR: usize = 8760;
const DAYS_IN_YEAR: usize = 365;

fn filled(rows: usize, row: &[f64]) -> Matrix {
    vec![row.to_vec(); rows]
}

fn zeros(rows: usize, columns: usize) -> Matrix {
    vec![vec![0.0; columns]; rows]
}

fn ones(rows: usize, columns: usize) -> Matrix {
    vec![vec![1.0; columns]; rows]
}

/// References to the canonical default matrices used when a command or an
/// extraction needs a matrix and none was given.
///
/// Built once at startup by [`MatrixConstants::init`], then shared read-only.
/// Initialization only writes immutable content-addressed blobs, so there is
/// nothing to tear down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixConstants {
    /// The empty matrix.
    pub null_matrix: MatrixRef,
    pub hydro_max_power: MatrixRef,
    pub hydro_reservoir: MatrixRef,
    pub hydro_credit_modulations: MatrixRef,
    pub hydro_inflow_pattern: MatrixRef,
    pub hydro_water_values: MatrixRef,
    pub thermal_prepro_data: MatrixRef,
    pub thermal_prepro_modulation: MatrixRef,
    /// Link series before 8.2: capacities and parameters in one matrix.
    pub link_v7: MatrixRef,
    /// Link parameters from 8.2.
    pub link_v8: MatrixRef,
    /// Direct and indirect transmission capacities from 8.2.
    pub link_capacity: MatrixRef,
    bc_hourly: MatrixRef,
    bc_daily_weekly: MatrixRef,
    bc_term_hourly: MatrixRef,
    bc_term_daily_weekly: MatrixRef,
    pub st_storage_pmax: MatrixRef,
    pub st_storage_lower_rule_curve: MatrixRef,
    pub st_storage_upper_rule_curve: MatrixRef,
    pub st_storage_inflows: MatrixRef,
    pub prepro_conversion: MatrixRef,
    pub prepro_data: MatrixRef,
    pub prepro_k: MatrixRef,
    pub reserves: MatrixRef,
    pub misc_gen: MatrixRef,
}

impl MatrixConstants {
    /// Stores every canonical matrix in `matrix_service` and keeps their references.
    ///
    /// Calling this again against the same service yields identical references.
    #[must_use]
    pub fn init(matrix_service: &dyn MatrixService) -> Self {
        let store = |data: Matrix| MatrixRef::new(&matrix_service.create(&data));

        Self {
            null_matrix: store(Vec::new()),
            hydro_max_power: store(filled(DAYS_IN_YEAR, &[0.0, 24.0, 0.0, 24.0])),
            hydro_reservoir: store(filled(DAYS_IN_YEAR, &[0.0, 0.5, 1.0])),
            hydro_credit_modulations: store(ones(2, 101)),
            hydro_inflow_pattern: store(ones(DAYS_IN_YEAR, 1)),
            hydro_water_values: store(zeros(DAYS_IN_YEAR, 101)),
            thermal_prepro_data: store(filled(DAYS_IN_YEAR, &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0])),
            thermal_prepro_modulation: store(filled(HOURS_IN_YEAR, &[1.0, 1.0, 1.0, 0.0])),
            link_v7: store(filled(
                HOURS_IN_YEAR,
                &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            )),
            link_v8: store(zeros(HOURS_IN_YEAR, 6)),
            link_capacity: store(ones(HOURS_IN_YEAR, 1)),
            bc_hourly: store(zeros(BindingConstraintFrequency::Hourly.matrix_rows(), 3)),
            bc_daily_weekly: store(zeros(BindingConstraintFrequency::Daily.matrix_rows(), 3)),
            bc_term_hourly: store(zeros(BindingConstraintFrequency::Hourly.matrix_rows(), 1)),
            bc_term_daily_weekly: store(zeros(BindingConstraintFrequency::Daily.matrix_rows(), 1)),
            st_storage_pmax: store(ones(HOURS_IN_YEAR, 1)),
            st_storage_lower_rule_curve: store(zeros(HOURS_IN_YEAR, 1)),
            st_storage_upper_rule_curve: store(ones(HOURS_IN_YEAR, 1)),
            st_storage_inflows: store(zeros(HOURS_IN_YEAR, 1)),
            prepro_conversion: store(vec![
                vec![-9_999_999_980_506_447_872.0, 0.0, 9_999_999_980_506_447_872.0],
                vec![0.0, 0.0, 0.0],
            ]),
            prepro_data: store(filled(12, &[1.0, 1.0, 0.0, 1.0, 0.0, 1.0])),
            prepro_k: store(zeros(24, 12)),
            reserves: store(zeros(HOURS_IN_YEAR, 4)),
            misc_gen: store(zeros(HOURS_IN_YEAR, 8)),
        }
    }

    /// Default second member of a binding constraint.
    ///
    /// Before 8.7 this is the stacked `(rows, 3)` matrix; from 8.7 it is one
    /// single-column term matrix.
    #[must_use]
    pub const fn binding_constraint(
        &self,
        time_step: BindingConstraintFrequency,
        version: StudyVersion,
    ) -> &MatrixRef {
        let split_terms: bool = version.value() >= StudyVersion::V8_7.value();
        match (time_step, split_terms) {
            (BindingConstraintFrequency::Hourly, false) => &self.bc_hourly,
            (BindingConstraintFrequency::Daily | BindingConstraintFrequency::Weekly, false) => {
                &self.bc_daily_weekly
            }
            (BindingConstraintFrequency::Hourly, true) => &self.bc_term_hourly,
            (BindingConstraintFrequency::Daily | BindingConstraintFrequency::Weekly, true) => {
                &self.bc_term_daily_weekly
            }
        }
    }
}
