//! Timeline index over the resolved slot durations
//!
//! Answers "which slot owns offset T" and "what is the cumulative
//! duration of a slot range" for the whole queue. Durations are fixed
//! after construction, so the index is built once and never mutated.
//!
//! Boundary contract: a slot occupies the half-open range
//! `[cumulative_before, cumulative_before + duration)`. An offset exactly
//! on a boundary belongs to the next slot, except the final slot, which
//! also owns its exact end, so the queue's total duration is itself
//! locatable.

use tracing::debug;

/// Static index of slot durations
#[derive(Debug, Clone)]
pub struct SlotTimeline {
    /// Whole-second duration per slot, queue order
    durations: Vec<u64>,
}

impl SlotTimeline {
    /// Build the index from the resolved slot durations, queue order
    pub fn new(durations: Vec<u64>) -> Self {
        Self { durations }
    }

    /// Number of slots indexed
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// True when no slots are indexed
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Sum of slot durations for indices in `[from, to_inclusive]`.
    ///
    /// `from > to_inclusive` yields 0; an out-of-range upper bound is
    /// clamped to the last slot.
    pub fn duration_of_range(&self, from: usize, to_inclusive: usize) -> u64 {
        if from > to_inclusive || from >= self.durations.len() {
            return 0;
        }
        let to = to_inclusive.min(self.durations.len() - 1);
        self.durations[from..=to].iter().sum()
    }

    /// Total duration of the whole queue in seconds
    pub fn total_duration(&self) -> u64 {
        self.durations.iter().sum()
    }

    /// Index of the slot owning `offset_secs`.
    ///
    /// `None` when the offset is negative, not finite, or beyond the
    /// total duration. Scans left to right accumulating durations and
    /// returns the first slot whose cumulative end strictly exceeds the
    /// offset; an offset equal to the total belongs to the final slot
    /// (closed upper boundary). An interior zero-duration slot is never
    /// returned, its half-open range being empty, but a trailing
    /// zero-duration slot owns the exact offset `total`.
    pub fn locate(&self, offset_secs: f64) -> Option<usize> {
        if self.durations.is_empty() {
            return None;
        }
        if !offset_secs.is_finite() || offset_secs < 0.0 {
            debug!("locate({}) outside timeline", offset_secs);
            return None;
        }

        let total = self.total_duration();
        if offset_secs > total as f64 {
            debug!("locate({}) beyond total {}", offset_secs, total);
            return None;
        }

        let mut cumulative: u64 = 0;
        for (index, &duration) in self.durations.iter().enumerate() {
            cumulative += duration;
            if (cumulative as f64) > offset_secs {
                return Some(index);
            }
        }

        // offset == total: the final slot owns its exact end
        Some(self.durations.len() - 1)
    }
}
