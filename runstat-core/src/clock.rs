// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Clock sources used to time trials.
//!
//! A failed read is not an error: it yields `None` and the sample taken
//! from it is excluded from the statistics.

use std::fmt;

use nix::time::{clock_getcpuclockid, clock_gettime, ClockId};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};

use crate::timespan::Timespan;

/// Identity of a clock source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockSource {
    /// Real elapsed time.
    Wall,
    /// CPU time accumulated by the timing process.
    Cpu,
}

impl ClockSource {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Wall => "real",
            Self::Cpu => "CPU",
        }
    }
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Something that can be read for the current time.
pub trait Clock {
    /// Which source this clock reads.
    fn source(&self) -> ClockSource;

    /// Current reading, or `None` if the clock could not be read.
    fn now(&mut self) -> Option<Timespan>;
}

/// A POSIX clock read through `clock_gettime`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    source: ClockSource,
    id: ClockId,
}

impl SystemClock {
    /// The realtime clock. Always present.
    pub fn wall() -> Self {
        Self {
            source: ClockSource::Wall,
            id: ClockId::CLOCK_REALTIME,
        }
    }

    /// The CPU-time clock of this process, if the platform exposes one.
    pub fn cpu() -> Option<Self> {
        match clock_getcpuclockid(Pid::this()) {
            Ok(id) => Some(Self {
                source: ClockSource::Cpu,
                id,
            }),
            Err(errno) => {
                tracing::debug!(error = %errno, "clock_getcpuclockid failed");
                None
            }
        }
    }
}

impl Clock for SystemClock {
    fn source(&self) -> ClockSource {
        self.source
    }

    fn now(&mut self) -> Option<Timespan> {
        match clock_gettime(self.id) {
            Ok(ts) => Some(Timespan::new(ts.tv_sec() as i64, ts.tv_nsec() as u32)),
            Err(errno) => {
                tracing::debug!(clock = %self.source, error = %errno, "clock_gettime failed");
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_advances() {
        let mut clock = SystemClock::wall();
        let first = clock.now().expect("realtime clock readable");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = clock.now().expect("realtime clock readable");
        assert!(second > first);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_cpu_clock_available_on_linux() {
        let mut clock = SystemClock::cpu().expect("linux exposes a process cpu clock");
        assert_eq!(clock.source(), ClockSource::Cpu);
        assert!(clock.now().is_some());
    }

    #[test]
    fn test_source_names() {
        assert_eq!(ClockSource::Wall.to_string(), "real");
        assert_eq!(ClockSource::Cpu.to_string(), "CPU");
    }
}
