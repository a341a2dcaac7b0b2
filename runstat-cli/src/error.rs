// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI error type.

use runstat_core::{HardValidationError, RunstatError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Runstat(#[from] RunstatError),

    #[error("{0}")]
    Validation(#[from] HardValidationError),

    #[error("cannot render JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot write results: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
}

pub type CliResult<T> = Result<T, CliError>;
