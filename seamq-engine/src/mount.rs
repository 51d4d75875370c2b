//! Mount bookkeeping owned by the scheduler
//!
//! Which slots currently hold live playback resources is tracked in an
//! explicit mounted set (index → record), never derived by querying the
//! rendering collaborator. Each mount carries a generation counter used
//! to reject signals that do not belong to the slot's live elements;
//! superseded one-shot subscriptions (a pending deferred seek, the
//! readiness latch) are dropped at relink and on a new `play`/`seek`, so
//! there is no explicit cancel primitive.

use crate::descriptor::MediaKind;
use crate::host::{ElementHandle, SourceRef};
use crate::readiness::OneShot;

/// Identity of one mount of one slot
///
/// Issued when a slot's elements are constructed and handed to the host,
/// which tags every signal from those elements with it. The token stays
/// stable across reclaim/relink cycles (the elements persist) and is
/// unique across slots, so a token that does not match the mounted
/// record identifies a signal the engine must discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountToken {
    /// Slot index (0-based)
    pub index: usize,
    /// Mount generation the token belongs to
    pub generation: u64,
}

/// Externally observable lifecycle state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// No live resources
    Unmounted,
    /// Mounted hidden, still buffering toward readiness
    MountedLoading,
    /// Mounted hidden with the readiness signal already fired
    MountedReady,
    /// The unique visible, playing slot
    Visible,
    /// Resources paused with sources detached; remountable
    Detached,
}

/// One mounted media element and its per-mount monitors
pub(crate) struct MountedTrack {
    /// Which sub-descriptor this element plays
    pub(crate) kind: MediaKind,

    /// Shared handle to the host-created element
    pub(crate) element: ElementHandle,

    /// Deferred seek target, applied when metadata arrives (one-shot)
    pub(crate) pending_seek: Option<f64>,

    /// Restorable side-channel: the source list cleared by the
    /// reclaimer, relinked on the next mount of this slot
    pub(crate) saved_sources: Option<Vec<SourceRef>>,
}

/// Scheduler-side record of one mounted slot
pub(crate) struct MountedSlot {
    /// Generation issued when the slot's elements were constructed
    pub(crate) generation: u64,

    /// Whether the slot's node is currently hidden
    pub(crate) hidden: bool,

    /// Whether the slot was instructed to play and not since paused
    pub(crate) playing: bool,

    /// Whether the reclaimer has detached the slot's sources
    pub(crate) detached: bool,

    /// One entry per present sub-descriptor, video first
    pub(crate) tracks: Vec<MountedTrack>,

    /// Readiness latch: the buffered signal fires at most once per
    /// mount generation
    pub(crate) buffered_latch: OneShot,
}

impl MountedSlot {
    /// Lifecycle state as observed from outside the scheduler
    pub(crate) fn state(&self) -> MountState {
        if self.detached {
            MountState::Detached
        } else if !self.hidden && self.playing {
            MountState::Visible
        } else if self.buffered_latch.fired() {
            MountState::MountedReady
        } else {
            MountState::MountedLoading
        }
    }

    /// Track playing the given media kind, if mounted
    pub(crate) fn track_mut(&mut self, kind: MediaKind) -> Option<&mut MountedTrack> {
        self.tracks.iter_mut().find(|t| t.kind == kind)
    }
}
