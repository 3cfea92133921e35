// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// The result of applying one command to a study.
///
/// Expected domain failures (duplicate or missing entities) are reported here
/// with `status == false`, never as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Whether the command was applied.
    pub status: bool,
    /// A human-readable description of what happened.
    pub message: String,
}

impl CommandOutput {
    /// Creates a successful output.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
        }
    }

    /// Creates a failed output.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
        }
    }
}
