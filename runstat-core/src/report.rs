// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark results and their text/JSON rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::ClockSource;
use crate::relocation::{RelocationMetrics, RelocationSummary};
use crate::stats::Statistics;
use crate::timespan::Timespan;

/// Result of a run, one variant per measurement mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum BenchReport {
    Duration(DurationReport),
    Relocation(RelocationReport),
}

impl BenchReport {
    /// Whether any trial produced usable data. Nothing is rendered otherwise.
    pub fn has_results(&self) -> bool {
        match self {
            Self::Duration(report) => report.has_results(),
            Self::Relocation(report) => report.summary.count > 0,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration(report) => fmt::Display::fmt(report, f),
            Self::Relocation(report) => fmt::Display::fmt(report, f),
        }
    }
}

/// Samples and statistics of one clock source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSummary {
    pub source: ClockSource,
    /// Trials that left a slot in the sample set.
    pub trials: usize,
    /// Slots that took part in the statistics.
    pub valid: usize,
    /// `None` when no sample was valid.
    pub stats: Option<Statistics>,
}

/// Duration-mode result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationReport {
    pub wall: ClockSummary,
    /// `None` when the platform has no per-process CPU clock.
    pub cpu: Option<ClockSummary>,
}

impl DurationReport {
    pub fn new(wall: ClockSummary, cpu: Option<ClockSummary>) -> Self {
        Self { wall, cpu }
    }

    fn cpu_stats(&self) -> Option<&Statistics> {
        self.cpu.as_ref().and_then(|cpu| cpu.stats.as_ref())
    }

    pub fn has_results(&self) -> bool {
        self.wall.stats.is_some() || self.cpu_stats().is_some()
    }

    /// Largest per-tail cut applied to either source.
    pub fn trimmed(&self) -> usize {
        let wall = self.wall.stats.map_or(0, |s| s.cut);
        let cpu = self.cpu_stats().map_or(0, |s| s.cut);
        wall.max(cpu)
    }
}

fn seconds(value: Option<Timespan>) -> String {
    match value {
        Some(span) => format!("{} sec", span),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for DurationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_results() {
            return Ok(());
        }

        match self.trimmed() {
            0 => {}
            1 => writeln!(f, "Strip out best and worst realtime result")?,
            n => writeln!(f, "Strip out best and worst {} realtime results", n)?,
        }

        let wall = self.wall.stats.as_ref();
        let cpu = self.cpu_stats();
        let rows: [(&str, fn(&Statistics) -> Timespan); 4] = [
            ("minimum", |s| s.minimum),
            ("maximum", |s| s.maximum),
            ("average", |s| s.mean),
            ("stdev  ", |s| s.std_dev),
        ];

        for (label, field) in rows {
            writeln!(
                f,
                "{}: {} real / {} CPU",
                label,
                seconds(wall.map(field)),
                seconds(cpu.map(field)),
            )?;
        }
        Ok(())
    }
}

/// Relocation-mode result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationReport {
    /// Trials run, accepted or not.
    pub trials: u64,
    pub summary: RelocationSummary,
}

fn cycles(f: &mut fmt::Formatter<'_>, label: &str, m: RelocationMetrics) -> fmt::Result {
    writeln!(
        f,
        "{}: total={} cyc, relocs={} cyc, load={} cyc",
        label, m.total, m.relocs, m.load
    )
}

impl fmt::Display for RelocationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some(min), Some(max), Some(avg)) = (
            self.summary.minimum,
            self.summary.maximum,
            self.summary.average(),
        ) else {
            return Ok(());
        };

        cycles(f, "minimum", min)?;
        cycles(f, "maximum", max)?;
        cycles(f, "average", avg)
    }
}
