//! Buffered-readiness evaluation
//!
//! Decides, from an element's download progress, when enough of the
//! current slot has loaded to start preloading the next one. The gate has
//! two conditions that must both hold:
//!
//! 1. the undownloaded remainder estimate (duration minus the highest
//!    contiguous buffered end) is below the descriptor's
//!    `duration_threshold` seconds, and
//! 2. the element reports enough data to play through, or the highest
//!    contiguous buffered fraction of the total duration exceeds the
//!    descriptor's `progress_threshold`.
//!
//! Firing is once per mount generation: the scheduler runs the check on
//! every progress signal but latches the result through a [`OneShot`].

use tracing::debug;

use crate::host::{BufferedRange, MediaElement, ReadyState};

/// One-shot subscription latch
///
/// Armed on creation, fires at most once, re-armed explicitly on
/// re-mount. Subscribe, fire, auto-drop; no listener re-registration.
#[derive(Debug, Clone, Default)]
pub struct OneShot {
    fired: bool,
}

impl OneShot {
    /// New, armed latch
    pub fn new() -> Self {
        Self { fired: false }
    }

    /// Fire the latch. Returns true the first time only.
    pub fn fire(&mut self) -> bool {
        if self.fired {
            false
        } else {
            self.fired = true;
            true
        }
    }

    /// Whether the latch has already fired
    pub fn fired(&self) -> bool {
        self.fired
    }

    /// Re-arm after a re-mount
    pub fn rearm(&mut self) {
        self.fired = false;
    }
}

/// Highest contiguous buffered position, in seconds
pub fn highest_buffered_end(ranges: &[BufferedRange]) -> f64 {
    ranges.iter().fold(0.0, |acc, r| acc.max(r.end))
}

/// Highest contiguous buffered fraction of the total duration, in `[0, 1]`
///
/// Zero when no ranges are buffered or the duration is not positive.
pub fn highest_progress(ranges: &[BufferedRange], duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    (highest_buffered_end(ranges) / duration).clamp(0.0, 1.0)
}

/// Evaluate the two-condition readiness gate against an element.
///
/// False while metadata (and with it the duration) is unknown.
pub fn ready_to_preload(
    element: &dyn MediaElement,
    progress_threshold: f64,
    duration_threshold: u64,
) -> bool {
    let Some(duration) = element.duration() else {
        return false;
    };

    let ranges = element.buffered();
    let remaining = (duration - highest_buffered_end(&ranges)).max(0.0);
    if remaining >= duration_threshold as f64 {
        return false;
    }

    let ready_state = element.ready_state();
    if ready_state >= ReadyState::HaveEnoughData {
        return true;
    }

    let fraction = highest_progress(&ranges, duration);
    let ready = fraction > progress_threshold;
    if !ready {
        debug!(
            "readiness gate held: fraction {:.2} <= {:.2}, ready_state {:?}",
            fraction, progress_threshold, ready_state
        );
    }
    ready
}
