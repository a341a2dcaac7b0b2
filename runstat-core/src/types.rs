// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time, so a constructed
//! [`crate::BenchConfig`] never needs re-checking inside the trial loop.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Default number of trials.
pub const DEFAULT_TRIAL_COUNT: u64 = 30;
/// Default percentage trimmed from each tail.
pub const DEFAULT_DROP_PERCENT: u32 = 2;

/// Number of trials to run. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct TrialCount(u64);

impl TrialCount {
    pub fn new(count: u64) -> Result<Self, HardValidationError> {
        if count == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "count",
                value: count.to_string(),
                reason: "at least one trial is required".to_string(),
            });
        }
        Ok(Self(count))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for TrialCount {
    fn default() -> Self {
        Self(DEFAULT_TRIAL_COUNT)
    }
}

impl fmt::Display for TrialCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for TrialCount {
    type Error = HardValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrialCount> for u64 {
    fn from(count: TrialCount) -> Self {
        count.0
    }
}

/// Concurrent children launched per trial. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Parallelism(u32);

impl Parallelism {
    /// One child per trial.
    pub const SERIAL: Parallelism = Parallelism(1);

    pub fn new(n: u32) -> Result<Self, HardValidationError> {
        if n == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "parallel",
                value: n.to_string(),
                reason: "at least one child per trial is required".to_string(),
            });
        }
        Ok(Self(n))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::SERIAL
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Parallelism {
    type Error = HardValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Parallelism> for u32 {
    fn from(p: Parallelism) -> Self {
        p.0
    }
}

/// Percentage of samples dropped from each tail, 0 through 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DropPercent(u32);

impl DropPercent {
    pub fn new(percent: u32) -> Result<Self, HardValidationError> {
        if percent > 100 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "drop",
                value: percent.to_string(),
                reason: "percentage must be between 0 and 100".to_string(),
            });
        }
        Ok(Self(percent))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for DropPercent {
    fn default() -> Self {
        Self(DEFAULT_DROP_PERCENT)
    }
}

impl fmt::Display for DropPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u32> for DropPercent {
    type Error = HardValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DropPercent> for u32 {
    fn from(p: DropPercent) -> Self {
        p.0
    }
}

/// One `-E` style environment specification.
///
/// `NAME` copies the variable from the controlling environment if it is
/// set; `NAME=value` passes the literal assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EnvSpec {
    Inherit(String),
    Literal { name: String, value: String },
}

impl EnvSpec {
    pub fn parse(spec: &str) -> Result<Self, HardValidationError> {
        let (name, value) = match spec.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (spec, None),
        };

        if name.is_empty() {
            return Err(HardValidationError::InvalidEnvSpec {
                spec: spec.to_string(),
                reason: "variable name cannot be empty".to_string(),
            });
        }

        Ok(match value {
            Some(value) => Self::Literal {
                name: name.to_string(),
                value: value.to_string(),
            },
            None => Self::Inherit(name.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Inherit(name) => name,
            Self::Literal { name, .. } => name,
        }
    }

    /// Resolve to a `(name, value)` pair. `lookup` reads the controlling
    /// environment; an unset inherited variable resolves to `None`.
    pub fn resolve<F>(&self, lookup: F) -> Option<(String, String)>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Self::Inherit(name) => lookup(name).map(|value| (name.clone(), value)),
            Self::Literal { name, value } => Some((name.clone(), value.clone())),
        }
    }
}

impl fmt::Display for EnvSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit(name) => write!(f, "{}", name),
            Self::Literal { name, value } => write!(f, "{}={}", name, value),
        }
    }
}

impl TryFrom<String> for EnvSpec {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EnvSpec> for String {
    fn from(spec: EnvSpec) -> Self {
        spec.to_string()
    }
}
