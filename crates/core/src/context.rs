// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use antares_study::{MatrixConstants, MatrixService};
use std::sync::Arc;

/// Shared, read-only services handed to every command of a sequence.
///
/// Cloning is cheap: both halves are reference counted.
#[derive(Debug, Clone)]
pub struct CommandContext {
    matrix_service: Arc<dyn MatrixService>,
    constants: Arc<MatrixConstants>,
}

impl CommandContext {
    /// Creates a context, storing the canonical matrices in `matrix_service` first.
    #[must_use]
    pub fn new(matrix_service: Arc<dyn MatrixService>) -> Self {
        let constants: MatrixConstants = MatrixConstants::init(matrix_service.as_ref());
        Self {
            matrix_service,
            constants: Arc::new(constants),
        }
    }

    /// Creates a context from constants that were already initialized against `matrix_service`.
    #[must_use]
    pub const fn with_constants(
        matrix_service: Arc<dyn MatrixService>,
        constants: Arc<MatrixConstants>,
    ) -> Self {
        Self {
            matrix_service,
            constants,
        }
    }

    /// The shared matrix store.
    #[must_use]
    pub fn matrix_service(&self) -> &dyn MatrixService {
        self.matrix_service.as_ref()
    }

    /// The canonical default matrices.
    #[must_use]
    pub fn constants(&self) -> &MatrixConstants {
        &self.constants
    }
}
