// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::context::CommandContext;
use crate::error::CommandError;
use antares_study::{Matrix, MatrixRef};
use serde::{Deserialize, Deserializer, Serialize};

/// A matrix argument: either the id of a stored matrix or literal values.
///
/// Literal values are stored in the matrix service when the command is built.
/// JSON has no NaN: a `null` cell in literal values is read back as NaN, which
/// is what serializing a NaN cell produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MatrixInput {
    /// A bare content id, or a `matrix://` link.
    Id(String),
    /// Literal rows.
    Values(Matrix),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMatrixInput {
    Id(String),
    Values(Vec<Vec<Option<f64>>>),
}

impl<'de> Deserialize<'de> for MatrixInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawMatrixInput::deserialize(deserializer)? {
            RawMatrixInput::Id(id) => Self::Id(id),
            RawMatrixInput::Values(rows) => Self::Values(
                rows.into_iter()
                    .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
                    .collect(),
            ),
        })
    }
}

impl From<MatrixRef> for MatrixInput {
    fn from(reference: MatrixRef) -> Self {
        Self::Id(reference.id().to_string())
    }
}

impl From<Matrix> for MatrixInput {
    fn from(values: Matrix) -> Self {
        Self::Values(values)
    }
}

fn invalid(reason: impl Into<String>) -> CommandError {
    CommandError::InvalidMatrix {
        reason: reason.into(),
    }
}

/// Rejects matrices containing NaN.
pub(crate) fn check_no_nan(data: &Matrix) -> Result<(), CommandError> {
    if data.iter().flatten().any(|v| v.is_nan()) {
        return Err(invalid("Matrix values cannot contain NaN"));
    }
    Ok(())
}

/// Returns the `(rows, columns)` shape, rejecting ragged rows.
pub(crate) fn shape(data: &Matrix) -> Result<(usize, usize), CommandError> {
    let columns: usize = data.first().map_or(0, Vec::len);
    if data.iter().any(|row| row.len() != columns) {
        return Err(invalid("Matrix rows must all have the same length"));
    }
    Ok((data.len(), columns))
}

/// Resolves a matrix argument into a reference, running `check` on literal values.
///
/// An empty literal resolves to the shared null matrix.
pub(crate) fn resolve_matrix_with(
    input: MatrixInput,
    ctx: &CommandContext,
    check: impl Fn(&Matrix) -> Result<(), CommandError>,
) -> Result<MatrixRef, CommandError> {
    match input {
        MatrixInput::Id(id) => {
            let reference: MatrixRef = MatrixRef::new(&id);
            if ctx.matrix_service().exists(reference.id()) {
                Ok(reference)
            } else {
                Err(invalid(format!("Invalid matrix ID: '{id}'")))
            }
        }
        MatrixInput::Values(data) => {
            if data.is_empty() {
                return Ok(ctx.constants().null_matrix.clone());
            }
            check_no_nan(&data)?;
            shape(&data)?;
            check(&data)?;
            Ok(MatrixRef::new(&ctx.matrix_service().create(&data)))
        }
    }
}

/// Resolves a matrix argument into a reference.
pub(crate) fn resolve_matrix(
    input: MatrixInput,
    ctx: &CommandContext,
) -> Result<MatrixRef, CommandError> {
    resolve_matrix_with(input, ctx, |_| Ok(()))
}

/// Resolves an optional matrix argument.
pub(crate) fn resolve_optional(
    input: Option<MatrixInput>,
    ctx: &CommandContext,
) -> Result<Option<MatrixRef>, CommandError> {
    input.map(|m| resolve_matrix(m, ctx)).transpose()
}

/// Checks that a matrix has exactly `rows` rows and `columns` columns.
pub(crate) fn check_exact_shape(
    data: &Matrix,
    rows: usize,
    columns: usize,
) -> Result<(), CommandError> {
    let actual: (usize, usize) = shape(data)?;
    if actual != (rows, columns) {
        return Err(invalid(format!(
            "Invalid matrix shape {actual:?}, expected ({rows}, {columns})"
        )));
    }
    Ok(())
}

/// Checks that a matrix has exactly `rows` rows.
pub(crate) fn check_rows(data: &Matrix, rows: usize) -> Result<(), CommandError> {
    if data.len() != rows {
        return Err(invalid(format!(
            "Invalid matrix length {}, expected {rows}",
            data.len()
        )));
    }
    Ok(())
}
