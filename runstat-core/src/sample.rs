// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-clock sample storage.
//!
//! Every trial leaves one slot in the set of each active clock source. A
//! slot is valid only when both clock reads succeeded and the elapsed span
//! is non-zero; statistics are computed over valid slots alone.

use serde::{Deserialize, Serialize};

use crate::clock::ClockSource;
use crate::error::{RunstatError, RunstatResult};
use crate::timespan::Timespan;

/// One trial's reading for a single clock source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub span: Timespan,
    pub valid: bool,
}

impl Sample {
    /// Build a sample from the start and end readings of a trial.
    ///
    /// When either read failed the span is computed from whatever is
    /// available and the sample is flagged invalid.
    pub fn from_readings(start: Option<Timespan>, end: Option<Timespan>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => {
                let span = end - start;
                Self {
                    span,
                    valid: !span.is_zero(),
                }
            }
            (start, end) => Self {
                span: end.unwrap_or_default() - start.unwrap_or_default(),
                valid: false,
            },
        }
    }
}

/// Bounded, insertion-ordered samples for one clock source.
#[derive(Debug, Clone)]
pub struct SampleSet {
    source: ClockSource,
    capacity: usize,
    samples: Vec<Sample>,
    valid_count: usize,
}

impl SampleSet {
    /// Create an empty set holding at most `capacity` samples.
    ///
    /// Storage for every slot is reserved up front; failing to get it is a
    /// resource error rather than an abort.
    pub fn with_capacity(source: ClockSource, capacity: usize) -> RunstatResult<Self> {
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(capacity)
            .map_err(|e| RunstatError::Resource {
                context: "allocating sample storage",
                reason: e.to_string(),
            })?;

        Ok(Self {
            source,
            capacity,
            samples,
            valid_count: 0,
        })
    }

    /// Append a sample. Returns whether it counted as valid.
    ///
    /// Samples beyond the capacity are dropped.
    pub fn record(&mut self, sample: Sample) -> bool {
        if self.samples.len() >= self.capacity {
            tracing::warn!(
                clock = %self.source,
                capacity = self.capacity,
                "Sample set full, dropping sample"
            );
            return false;
        }

        self.samples.push(sample);
        if sample.valid {
            self.valid_count += 1;
        }
        sample.valid
    }

    pub fn source(&self) -> ClockSource {
        self.source
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of recorded slots, valid or not.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples that take part in the statistics.
    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Valid spans in ascending order. Length equals [`Self::valid_count`].
    pub fn sorted_valid(&self) -> Vec<Timespan> {
        let mut spans: Vec<Timespan> = self
            .samples
            .iter()
            .filter(|s| s.valid)
            .map(|s| s.span)
            .collect();
        spans.sort_unstable();
        spans
    }
}
