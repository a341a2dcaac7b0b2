// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for runstat.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`
//! in the library: every failure the trial loop can hit is a typed variant.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a benchmark run.
#[derive(Debug, Error)]
pub enum RunstatError {
    // =========================================================================
    // Configuration Errors - reported before any trial runs
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Profile file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Profile parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Trial Errors - abort the whole run, no partial results
    // =========================================================================
    #[error("Trial {trial} failed: {source}")]
    Trial {
        trial: u64,
        #[source]
        source: TrialError,
    },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("Resource error: {context} - {reason}")]
    Resource {
        context: &'static str,
        reason: String,
    },

    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors stop the tool before the first trial.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required argument: {what}")]
    MissingArgument { what: &'static str },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid environment specification: {spec:?} - {reason}")]
    InvalidEnvSpec { spec: String, reason: String },
}

/// Failures while executing one trial.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("cannot spawn {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("waiting for child {pid} failed: {reason}")]
    WaitFailed { pid: i32, reason: String },

    #[error("process other than child terminated: expected {expected}, got {actual}")]
    UnexpectedChild { expected: i32, actual: i32 },

    #[error("child {pid} terminated abnormally: {status}")]
    ChildFailed { pid: i32, status: String },
}

/// Errors reading a dynamic-linker statistics log.
#[derive(Debug, Error)]
pub enum RelocationLogError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using RunstatError.
pub type RunstatResult<T> = Result<T, RunstatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::InvalidFieldValue {
            field: "count",
            value: "0".to_string(),
            reason: "at least one trial is required".to_string(),
        };
        assert!(err.to_string().contains("count"));
        assert!(err.to_string().contains("at least one trial"));
    }

    #[test]
    fn test_error_chain() {
        let validation_err = HardValidationError::MissingArgument { what: "command" };
        let err: RunstatError = validation_err.into();
        assert!(matches!(err, RunstatError::HardValidation(_)));
    }

    #[test]
    fn test_trial_error_carries_trial_number() {
        let err = RunstatError::Trial {
            trial: 7,
            source: TrialError::ChildFailed {
                pid: 42,
                status: "exit status 1".to_string(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("Trial 7"));
        assert!(text.contains("terminated abnormally"));
    }

    #[test]
    fn test_resource_error_display() {
        let err = RunstatError::Resource {
            context: "allocating sample storage",
            reason: "capacity overflow".to_string(),
        };
        assert!(err.to_string().contains("allocating sample storage"));
    }
}
