// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Outlier trimming over sorted samples.

use crate::timespan::Timespan;

/// Number of samples to drop from each tail.
///
/// `(count * percent + 50) / 100`, i.e. the percentage rounded half-up to
/// a whole sample count. The result is clamped so at least one sample
/// survives: when `2 * cut >= count` the cut becomes `(count - 1) / 2`.
pub fn cut_count(count: usize, percent: u32) -> usize {
    let raw = (count as u128 * percent as u128 + 50) / 100;
    let cut = usize::try_from(raw).unwrap_or(usize::MAX);

    if count == 0 {
        0
    } else if cut.saturating_mul(2) >= count {
        (count - 1) / 2
    } else {
        cut
    }
}

/// Read-only window over a sorted slice with `cut` elements hidden at
/// each end.
#[derive(Debug, Clone, Copy)]
pub struct TrimmedView<'a> {
    sorted: &'a [Timespan],
    cut: usize,
}

impl<'a> TrimmedView<'a> {
    /// Trim `percent` percent from each tail of `sorted`.
    ///
    /// `sorted` must already be in ascending order.
    pub fn new(sorted: &'a [Timespan], percent: u32) -> Self {
        Self::with_cut(sorted, cut_count(sorted.len(), percent))
    }

    /// Trim an explicit number of samples from each tail, clamped like
    /// [`cut_count`].
    pub fn with_cut(sorted: &'a [Timespan], cut: usize) -> Self {
        debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
        let cut = if sorted.is_empty() {
            0
        } else {
            cut.min((sorted.len() - 1) / 2)
        };
        Self { sorted, cut }
    }

    /// Samples hidden from each end.
    pub fn cut(&self) -> usize {
        self.cut
    }

    /// The retained middle of the sorted samples.
    pub fn samples(&self) -> &'a [Timespan] {
        &self.sorted[self.cut..self.sorted.len() - self.cut]
    }

    pub fn len(&self) -> usize {
        self.sorted.len() - 2 * self.cut
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest sample of the full, untrimmed sequence.
    pub fn full_min(&self) -> Option<Timespan> {
        self.sorted.first().copied()
    }

    /// Largest sample of the full, untrimmed sequence.
    pub fn full_max(&self) -> Option<Timespan> {
        self.sorted.last().copied()
    }
}
