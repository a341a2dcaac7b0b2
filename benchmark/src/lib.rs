// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! runstat benchmarking support
//!
//! Deterministic synthetic inputs for the criterion benches: timing samples
//! shaped like real wall-clock measurements and dynamic-linker statistics
//! logs.

use runstat_core::Timespan;

/// Small linear congruential generator. Same seed, same sequence.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    state: u64,
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 33
    }

    /// One sample around `base` with up to `jitter_nanos` of noise.
    pub fn sample(&mut self, base: Timespan, jitter_nanos: u64) -> Timespan {
        let noise = if jitter_nanos == 0 {
            0
        } else {
            self.next_u64() % jitter_nanos
        };
        Timespan::from_nanos(base.as_nanos() + i128::from(noise))
    }

    /// `count` samples around `base`.
    pub fn samples(&mut self, count: usize, base: Timespan, jitter_nanos: u64) -> Vec<Timespan> {
        (0..count).map(|_| self.sample(base, jitter_nanos)).collect()
    }
}

/// A dynamic-linker statistics log with `noise_lines` unrelated lines
/// before the three labeled ones.
pub fn synthetic_linker_log(noise_lines: usize) -> String {
    let mut log = String::from("     4711:\t\n     4711:\truntime linker statistics:\n");
    for i in 0..noise_lines {
        log.push_str(&format!("     4711:\t   symbol lookup {}: 17 cycles\n", i));
    }
    log.push_str("     4711:\t  total startup time in dynamic loader: 1234567 cycles\n");
    log.push_str("     4711:\t            time needed for relocation: 456789 cycles (37.0%)\n");
    log.push_str("     4711:\t           time needed to load objects: 345678 cycles (28.0%)\n");
    log
}
