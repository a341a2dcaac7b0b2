// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark configuration and YAML profiles.
//!
//! A [`BenchConfig`] is built once at startup and passed by reference into
//! the trial loop. Profiles are parsed into raw structs first and then
//! validated into the newtypes from [`crate::types`]; any invalid field is
//! a [`HardValidationError`] and nothing runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HardValidationError, RunstatError, RunstatResult};
use crate::relocation::LOG_BASENAME;
use crate::types::{DropPercent, EnvSpec, Parallelism, TrialCount};

/// Variables always copied from the controlling environment when set.
pub const PASSTHROUGH_VARS: [&str; 2] = ["PATH", "LD_LIBRARY_PATH"];

/// Directory the dynamic linker writes relocation logs to by default.
pub const DEFAULT_RELOCATION_LOG_DIR: &str = "/tmp";

/// What a trial measures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum MeasureMode {
    /// Elapsed wall-clock and CPU-clock time.
    Duration,
    /// Dynamic-linker startup statistics read from `<log_dir>/timing.<pid>`.
    Relocation { log_dir: PathBuf },
}

/// Validated, immutable benchmark settings.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub count: TrialCount,
    pub parallelism: Parallelism,
    pub drop: DropPercent,
    pub mode: MeasureMode,
    pub ignore_status: bool,
}

impl BenchConfig {
    /// Children per trial after mode constraints: relocation mode always
    /// runs one child so the log can be matched to its pid.
    pub fn effective_parallelism(&self) -> Parallelism {
        match self.mode {
            MeasureMode::Duration => self.parallelism,
            MeasureMode::Relocation { .. } => Parallelism::SERIAL,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            count: TrialCount::default(),
            parallelism: Parallelism::default(),
            drop: DropPercent::default(),
            mode: MeasureMode::Duration,
            ignore_status: false,
        }
    }
}

/// The command under test with its resolved environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl Invocation {
    /// Split `command` into program and arguments.
    pub fn new(command: Vec<String>) -> Result<Self, HardValidationError> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or(HardValidationError::MissingArgument { what: "command" })?;

        Ok(Self {
            program,
            args: parts.collect(),
            env: Vec::new(),
        })
    }

    /// Replace the child environment.
    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }
}

/// Build the child environment.
///
/// Order: the explicit specs, then [`PASSTHROUGH_VARS`] when set, then the
/// `LD_DEBUG` pair in relocation mode. Nothing else leaks through.
pub fn resolve_env<F>(specs: &[EnvSpec], mode: &MeasureMode, lookup: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env: Vec<(String, String)> = Vec::with_capacity(specs.len() + PASSTHROUGH_VARS.len() + 2);
    for spec in specs {
        match spec.resolve(&lookup) {
            Some(pair) => env.push(pair),
            None => tracing::debug!(var = spec.name(), "Variable not set, not passed to child"),
        }
    }

    for name in PASSTHROUGH_VARS {
        if let Some(value) = lookup(name) {
            env.push((name.to_string(), value));
        }
    }

    if let MeasureMode::Relocation { log_dir } = mode {
        env.push(("LD_DEBUG".to_string(), "statistics".to_string()));
        env.push((
            "LD_DEBUG_OUTPUT".to_string(),
            log_dir.join(LOG_BASENAME).display().to_string(),
        ));
    }

    env
}

/// Raw profile as parsed from YAML (before validation).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProfile {
    count: Option<u64>,
    parallel: Option<u32>,
    drop_percent: Option<u32>,
    #[serde(default)]
    ignore_status: bool,
    #[serde(default)]
    environment: Vec<String>,
    relocation_log_dir: Option<String>,
}

/// Validated profile defaults. Command-line flags override these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub count: TrialCount,
    pub parallelism: Parallelism,
    pub drop: DropPercent,
    pub ignore_status: bool,
    pub environment: Vec<EnvSpec>,
    pub relocation_log_dir: PathBuf,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            count: TrialCount::default(),
            parallelism: Parallelism::default(),
            drop: DropPercent::default(),
            ignore_status: false,
            environment: Vec::new(),
            relocation_log_dir: PathBuf::from(DEFAULT_RELOCATION_LOG_DIR),
        }
    }
}

/// Profile loader with strict validation.
pub struct ProfileLoader;

impl ProfileLoader {
    /// Load and validate a profile from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> RunstatResult<Profile> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RunstatError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RunstatError::Io {
            context: "reading profile file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate a profile from a YAML string.
    pub fn load_string(content: &str) -> RunstatResult<Profile> {
        let raw: RawProfile =
            serde_yaml::from_str(content).map_err(|e| RunstatError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Ok(Self::validate(raw)?)
    }

    fn validate(raw: RawProfile) -> Result<Profile, HardValidationError> {
        let defaults = Profile::default();

        let count = raw.count.map(TrialCount::new).transpose()?;
        let parallelism = raw.parallel.map(Parallelism::new).transpose()?;
        let drop = raw.drop_percent.map(DropPercent::new).transpose()?;

        let environment = raw
            .environment
            .iter()
            .map(|spec| EnvSpec::parse(spec))
            .collect::<Result<Vec<_>, _>>()?;

        let relocation_log_dir = match raw.relocation_log_dir {
            Some(dir) if dir.is_empty() => {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "relocation_log_dir",
                    value: dir,
                    reason: "directory cannot be empty".to_string(),
                });
            }
            Some(dir) => PathBuf::from(dir),
            None => defaults.relocation_log_dir,
        };

        Ok(Profile {
            count: count.unwrap_or(defaults.count),
            parallelism: parallelism.unwrap_or(defaults.parallelism),
            drop: drop.unwrap_or(defaults.drop),
            ignore_status: raw.ignore_status,
            environment,
            relocation_log_dir,
        })
    }
}
