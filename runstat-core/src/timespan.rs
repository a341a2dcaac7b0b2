// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Signed `(seconds, nanoseconds)` time values.
//!
//! A [`Timespan`] is either a clock reading or the difference of two
//! readings. The nanosecond part is always in `[0, NANOS_PER_SEC)`; negative
//! values carry their sign in the seconds part only.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Sub;

use serde::{Deserialize, Serialize};

/// Nanoseconds in one second.
pub const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A normalized signed time value.
///
/// Ordering compares seconds first, then nanoseconds, which is the
/// chronological order because of the normalization invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timespan {
    secs: i64,
    nanos: u32,
}

impl Timespan {
    /// The zero span.
    pub const ZERO: Timespan = Timespan { secs: 0, nanos: 0 };

    /// Build a span, carrying excess nanoseconds into the seconds part.
    pub const fn new(secs: i64, nanos: u32) -> Self {
        Self {
            secs: secs + (nanos / NANOS_PER_SEC) as i64,
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self { secs, nanos: 0 }
    }

    pub const fn from_millis(millis: i64) -> Self {
        let nanos = millis.rem_euclid(1_000) as u32 * 1_000_000;
        Self {
            secs: millis.div_euclid(1_000),
            nanos,
        }
    }

    /// Split a signed nanosecond total into a normalized span.
    pub fn from_nanos(total: i128) -> Self {
        let per_sec = NANOS_PER_SEC as i128;
        Self {
            secs: total.div_euclid(per_sec) as i64,
            nanos: total.rem_euclid(per_sec) as u32,
        }
    }

    /// Whole seconds (may be negative).
    pub const fn secs(&self) -> i64 {
        self.secs
    }

    /// Sub-second nanoseconds, always in `[0, NANOS_PER_SEC)`.
    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// Total value in nanoseconds.
    pub const fn as_nanos(&self) -> i128 {
        self.secs as i128 * NANOS_PER_SEC as i128 + self.nanos as i128
    }

    pub const fn is_zero(&self) -> bool {
        self.secs == 0 && self.nanos == 0
    }

    pub const fn is_negative(&self) -> bool {
        self.secs < 0
    }
}

impl Sub for Timespan {
    type Output = Timespan;

    /// Elapsed span from `rhs` to `self`, borrowing one second when the
    /// nanosecond part would go negative.
    fn sub(self, rhs: Timespan) -> Timespan {
        if self.nanos < rhs.nanos {
            Timespan {
                secs: self.secs - rhs.secs - 1,
                nanos: NANOS_PER_SEC + self.nanos - rhs.nanos,
            }
        } else {
            Timespan {
                secs: self.secs - rhs.secs,
                nanos: self.nanos - rhs.nanos,
            }
        }
    }
}

impl Ord for Timespan {
    fn cmp(&self, other: &Self) -> Ordering {
        self.secs
            .cmp(&other.secs)
            .then_with(|| self.nanos.cmp(&other.nanos))
    }
}

impl PartialOrd for Timespan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timespan {
    /// `S.NNNNNNNNN`, the layout used in reports.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}
