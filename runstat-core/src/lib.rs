// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! runstat Core Library
//!
//! Measurement and statistics engine behind the `runstat` tool. Runs a
//! command repeatedly, times every trial with the wall clock and the CPU
//! clock (or reads dynamic-linker relocation statistics), trims outliers
//! and reports exact minimum, maximum, mean and standard deviation.

pub mod clock;
pub mod config;
pub mod error;
pub mod relocation;
pub mod report;
pub mod runner;
pub mod sample;
pub mod stats;
pub mod timespan;
pub mod trim;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ClockSource, SystemClock};
pub use config::{resolve_env, BenchConfig, Invocation, MeasureMode, Profile, ProfileLoader};
pub use error::{HardValidationError, RunstatError, RunstatResult, TrialError};
pub use relocation::{RelocationMetrics, RelocationSummary};
pub use report::{BenchReport, ClockSummary, DurationReport, RelocationReport};
pub use runner::{Benchmark, ChildExit, ExitKind, Launcher, Measurement, ProcessLauncher};
pub use stats::Statistics;
pub use timespan::Timespan;
pub use trim::{cut_count, TrimmedView};
pub use types::{DropPercent, EnvSpec, Parallelism, TrialCount};
