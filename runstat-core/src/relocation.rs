// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Dynamic-linker relocation statistics.
//!
//! With `LD_DEBUG=statistics` and `LD_DEBUG_OUTPUT=<dir>/timing` the
//! dynamic linker writes `<dir>/timing.<pid>` containing, among others:
//!
//! ```text
//!      12345:	  total startup time in dynamic loader: 1234567 cycles
//!      12345:	    time needed for relocation: 456789 cycles (37.0%)
//!      12345:	    time needed to load objects: 345678 cycles (28.0%)
//! ```

use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RelocationLogError;

/// Base name passed in `LD_DEBUG_OUTPUT`; the linker appends `.<pid>`.
pub const LOG_BASENAME: &str = "timing";

const TOTAL_LABEL: &str = "total startup time in dynamic loader:";
const RELOCS_LABEL: &str = "time needed for relocation:";
const LOAD_LABEL: &str = "time needed to load objects:";

/// Cycle counts reported by the dynamic linker for one process.
///
/// A zero field means the line was not observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationMetrics {
    pub total: u64,
    pub relocs: u64,
    pub load: u64,
}

impl RelocationMetrics {
    /// Parse the first occurrence of each labeled line. Later lines with
    /// an already seen label are ignored, even when the first one was
    /// malformed.
    pub fn parse<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut total = None;
        let mut relocs = None;
        let mut load = None;

        for line in reader.lines() {
            let line = line?;
            if let Some(value) = labeled_value(&line, TOTAL_LABEL) {
                total.get_or_insert(value);
            } else if let Some(value) = labeled_value(&line, RELOCS_LABEL) {
                relocs.get_or_insert(value);
            } else if let Some(value) = labeled_value(&line, LOAD_LABEL) {
                load.get_or_insert(value);
            }
        }

        Ok(Self {
            total: total.unwrap_or(0),
            relocs: relocs.unwrap_or(0),
            load: load.unwrap_or(0),
        })
    }

    /// True when all three metrics were observed.
    pub fn is_complete(&self) -> bool {
        self.total != 0 && self.relocs != 0 && self.load != 0
    }
}

/// Unsigned integer following `label` anywhere in `line`.
///
/// Returns `Some(0)` when the label is present but no digits follow, so a
/// malformed line still claims its label.
fn labeled_value(line: &str, label: &str) -> Option<u64> {
    let start = line.find(label)? + label.len();
    let rest = line[start..].trim_start();
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    Some(digits.parse().unwrap_or(0))
}

/// Path the dynamic linker writes for process `pid`.
pub fn log_path(log_dir: &Path, pid: u32) -> PathBuf {
    log_dir.join(format!("{}.{}", LOG_BASENAME, pid))
}

/// Read and remove the statistics log of process `pid`.
///
/// A missing file is `Ok(None)`: the child never loaded the dynamic linker
/// or did not honor `LD_DEBUG_OUTPUT`.
pub fn read_relocation_log(
    log_dir: &Path,
    pid: u32,
) -> Result<Option<RelocationMetrics>, RelocationLogError> {
    let path = log_path(log_dir, pid);

    let file = match std::fs::File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(RelocationLogError::Read { path, source }),
    };

    let parsed = RelocationMetrics::parse(BufReader::new(file));

    if let Err(e) = std::fs::remove_file(&path) {
        tracing::debug!(path = %path.display(), error = %e, "Could not remove relocation log");
    }

    parsed
        .map(Some)
        .map_err(|source| RelocationLogError::Read { path, source })
}

/// Running min/max/sum over accepted relocation trials.
///
/// Minimum and maximum are selected by `total`; the other two fields come
/// from the same trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationSummary {
    pub minimum: Option<RelocationMetrics>,
    pub maximum: Option<RelocationMetrics>,
    pub sum_total: u64,
    pub sum_relocs: u64,
    pub sum_load: u64,
    pub count: u64,
}

impl RelocationSummary {
    /// Fold one trial in. Incomplete metrics are ignored; returns whether
    /// the trial was accepted.
    pub fn fold(&mut self, metrics: RelocationMetrics) -> bool {
        if !metrics.is_complete() {
            return false;
        }

        if self.minimum.map_or(true, |min| metrics.total < min.total) {
            self.minimum = Some(metrics);
        }
        if self.maximum.map_or(true, |max| metrics.total > max.total) {
            self.maximum = Some(metrics);
        }

        self.sum_total = self.sum_total.saturating_add(metrics.total);
        self.sum_relocs = self.sum_relocs.saturating_add(metrics.relocs);
        self.sum_load = self.sum_load.saturating_add(metrics.load);
        self.count += 1;
        true
    }

    /// Truncating per-field average. `None` before any accepted trial.
    pub fn average(&self) -> Option<RelocationMetrics> {
        if self.count == 0 {
            return None;
        }
        Some(RelocationMetrics {
            total: self.sum_total / self.count,
            relocs: self.sum_relocs / self.count,
            load: self.sum_load / self.count,
        })
    }
}
