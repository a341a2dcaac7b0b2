// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Exact summary statistics over trimmed samples.
//!
//! The mean uses 128-bit nanosecond totals and the sum of squared
//! deviations uses unbounded integers, so the result never depends on
//! floating-point rounding.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::timespan::{Timespan, NANOS_PER_SEC};
use crate::trim::TrimmedView;

/// Summary of one clock source's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Smallest sample of the untrimmed set.
    pub minimum: Timespan,
    /// Largest sample of the untrimmed set.
    pub maximum: Timespan,
    /// Mean of the trimmed samples, truncated to whole nanoseconds.
    pub mean: Timespan,
    /// Unbiased standard deviation of the trimmed samples.
    pub std_dev: Timespan,
    /// Samples before trimming.
    pub sample_count: usize,
    /// Samples dropped from each tail.
    pub cut: usize,
}

impl Statistics {
    /// Compute statistics over a trimmed view. `None` for an empty set.
    pub fn compute(view: &TrimmedView<'_>) -> Option<Self> {
        let minimum = view.full_min()?;
        let maximum = view.full_max()?;
        let kept = view.samples();

        let mean = trimmed_mean(kept)?;
        let std_dev = std_dev(kept, mean);

        Some(Self {
            minimum,
            maximum,
            mean,
            std_dev,
            sample_count: kept.len() + 2 * view.cut(),
            cut: view.cut(),
        })
    }

    /// Sort `samples`, trim `percent` percent per tail and compute.
    pub fn from_samples(mut samples: Vec<Timespan>, percent: u32) -> Option<Self> {
        samples.sort_unstable();
        Self::compute(&TrimmedView::new(&samples, percent))
    }
}

/// Arithmetic mean with truncating integer division.
pub fn trimmed_mean(samples: &[Timespan]) -> Option<Timespan> {
    if samples.is_empty() {
        return None;
    }
    let total: i128 = samples.iter().map(Timespan::as_nanos).sum();
    Some(Timespan::from_nanos(total / samples.len() as i128))
}

/// Sample standard deviation around `mean`.
///
/// Exact-zero samples are skipped when summing squared deviations but
/// still count toward the `n - 1` divisor. The corrected sum is rounded to
/// nearest before the floor square root is taken.
pub fn std_dev(samples: &[Timespan], mean: Timespan) -> Timespan {
    let mut sum_sq = BigUint::zero();

    for sample in samples.iter().filter(|s| !s.is_zero()) {
        let deviation = BigUint::from((*sample - mean).as_nanos().unsigned_abs());
        sum_sq += &deviation * &deviation;
    }

    let n = samples.len() as u64;
    if n > 1 {
        sum_sq += (n - 1) / 2;
        sum_sq /= n - 1;
    }

    let root = sum_sq.sqrt();
    let secs = &root / NANOS_PER_SEC;
    let nanos = &root % NANOS_PER_SEC;

    Timespan::new(
        secs.to_i64().unwrap_or(i64::MAX),
        nanos.to_u32().unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(values: &[i64]) -> Vec<Timespan> {
        values.iter().copied().map(Timespan::from_secs).collect()
    }

    #[test]
    fn test_trimmed_mean_drops_tails() {
        let data = secs(&[1, 2, 3, 4, 5]);
        let view = TrimmedView::with_cut(&data, 1);
        let stats = Statistics::compute(&view).unwrap();
        assert_eq!(stats.mean, Timespan::from_secs(3));
        assert_eq!(stats.cut, 1);
        assert_eq!(stats.sample_count, 5);
    }

    #[test]
    fn test_std_dev_is_exact() {
        let stats = Statistics::from_samples(secs(&[3, 1, 2]), 0).unwrap();
        assert_eq!(stats.mean, Timespan::from_secs(2));
        assert_eq!(stats.std_dev, Timespan::from_secs(1));
    }

    #[test]
    fn test_min_max_come_from_untrimmed_set() {
        let data = secs(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        for cut in 0..5 {
            let view = TrimmedView::with_cut(&data, cut);
            let stats = Statistics::compute(&view).unwrap();
            assert_eq!(stats.minimum, Timespan::from_secs(1));
            assert_eq!(stats.maximum, Timespan::from_secs(10));
        }
    }

    #[test]
    fn test_mean_truncates_nanoseconds() {
        let data = vec![Timespan::new(0, 1), Timespan::new(0, 2)];
        assert_eq!(trimmed_mean(&data), Some(Timespan::new(0, 1)));
    }

    #[test]
    fn test_mean_borrows_across_seconds() {
        let data = vec![Timespan::new(1, 900_000_000), Timespan::new(2, 300_000_000)];
        assert_eq!(trimmed_mean(&data), Some(Timespan::new(2, 100_000_000)));
    }

    #[test]
    fn test_single_sample_has_zero_deviation() {
        let stats = Statistics::from_samples(vec![Timespan::new(4, 20)], 2).unwrap();
        assert_eq!(stats.minimum, stats.maximum);
        assert_eq!(stats.mean, Timespan::new(4, 20));
        assert_eq!(stats.std_dev, Timespan::ZERO);
    }

    #[test]
    fn test_bessel_correction_rounds_to_nearest() {
        // Deviations -2, -1, 0, 0, +3 around a mean of 10 ns: sum 14.
        // (14 + 2) / 4 = 4 gives a root of 2; truncating would give 3 and 1.
        let data: Vec<Timespan> = [8, 9, 10, 10, 13]
            .iter()
            .map(|&ns| Timespan::new(0, ns))
            .collect();
        let mean = trimmed_mean(&data).unwrap();
        assert_eq!(mean, Timespan::new(0, 10));
        assert_eq!(std_dev(&data, mean), Timespan::new(0, 2));
    }

    #[test]
    fn test_two_samples_divide_by_one() {
        // Mean of 3 and 6 truncates to 4; deviations -1 and +2 sum to 5.
        let data = vec![Timespan::new(0, 3), Timespan::new(0, 6)];
        let mean = trimmed_mean(&data).unwrap();
        assert_eq!(mean, Timespan::new(0, 4));
        assert_eq!(std_dev(&data, mean), Timespan::new(0, 2));
    }

    #[test]
    fn test_zero_samples_skipped_in_deviation() {
        let mean = Timespan::from_secs(2);
        let with_zero = vec![Timespan::ZERO, Timespan::from_secs(2), Timespan::from_secs(2)];
        assert_eq!(std_dev(&with_zero, mean), Timespan::ZERO);
    }

    #[test]
    fn test_large_deviations_do_not_overflow() {
        // Each squared deviation is 1e38 ns^2, far beyond a u64 accumulator.
        let data = vec![
            Timespan::from_secs(10_000_000_000),
            Timespan::from_secs(20_000_000_000),
            Timespan::from_secs(30_000_000_000),
        ];
        let stats = Statistics::from_samples(data, 0).unwrap();
        assert_eq!(stats.mean, Timespan::from_secs(20_000_000_000));
        assert_eq!(stats.std_dev, Timespan::from_secs(10_000_000_000));
    }

    #[test]
    fn test_empty_samples_yield_none() {
        assert!(Statistics::from_samples(Vec::new(), 2).is_none());
        assert!(trimmed_mean(&[]).is_none());
    }
}
