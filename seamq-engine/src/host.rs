//! Collaborator traits for the host environment
//!
//! The engine never touches a page or a playback primitive directly. The
//! host injects a [`MediaHost`] (the rendering container plus element
//! factory) and receives one [`MediaElement`] handle per mounted
//! sub-descriptor. Asynchronous effects (load progress, metadata
//! resolution, playback end, load failure) flow back into the engine as
//! [`MediaSignal`]s tagged with the [`MountToken`] the host was given at
//! element creation time; the engine discards signals from stale mounts.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::descriptor::MediaKind;
use crate::mount::MountToken;

/// Coarse readiness of a media resource, modeled on the HTML media
/// element levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    /// Nothing is known about the resource yet
    HaveNothing,
    /// Duration and dimensions are known; seeking is possible
    HaveMetadata,
    /// Data for the current position only
    HaveCurrentData,
    /// Data a little ahead of the current position
    HaveFutureData,
    /// Enough data to play through without stalling
    HaveEnoughData,
}

/// One alternate source/encoding pair offered to a media element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Full location including extension
    pub url: String,
    /// MIME-style type tag, e.g. `video/mp4`
    pub mime: String,
}

/// A contiguous buffered time range, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferedRange {
    pub start: f64,
    pub end: f64,
}

/// Everything a host needs to construct one media element
#[derive(Debug, Clone)]
pub struct ElementSpec {
    /// Alternate encodings in first-preference order
    pub sources: Vec<SourceRef>,
    /// Presentation attributes (dimensions, loop, preload hint, ...)
    pub attributes: BTreeMap<String, String>,
}

/// The underlying media-playback primitive for one sub-descriptor
///
/// An opaque capability of the runtime environment: it can load a source,
/// report buffered ranges and ready state, and be told to play, pause and
/// seek. The engine calls in; the host delivers the element's signals back
/// through [`crate::engine::PlaybackEngine::deliver`].
pub trait MediaElement {
    /// Replace the element's source list and resume loading from it
    fn set_sources(&mut self, sources: &[SourceRef]);

    /// Drop the active source reference, stopping any in-flight download
    fn clear_sources(&mut self);

    /// Begin or resume playback
    fn play(&mut self);

    /// Halt playback without releasing anything
    fn pause(&mut self);

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Move the playback position; only meaningful at
    /// [`ReadyState::HaveMetadata`] or above
    fn seek(&mut self, seconds: f64);

    /// Coarse load readiness
    fn ready_state(&self) -> ReadyState;

    /// Buffered time ranges downloaded so far
    fn buffered(&self) -> Vec<BufferedRange>;

    /// Total media duration in seconds, `None` until metadata is known
    fn duration(&self) -> Option<f64>;
}

/// Shared handle to a mounted media element
///
/// Single-threaded cooperative model: the engine and the host hold `Rc`
/// clones of the same element and never race.
pub type ElementHandle = Rc<RefCell<dyn MediaElement>>;

/// The rendering container the queue mounts slots into
///
/// Identified nodes: a mounted slot's key is stable for the queue's
/// lifetime (see [`slot_key`]). The engine tracks which slots are mounted
/// itself and never queries the host for membership.
pub trait MediaHost {
    /// Construct a media element for one sub-descriptor and attach its
    /// renderable node under `key`, initially hidden. The host keeps the
    /// token and tags every signal from this element with it.
    fn create_element(
        &mut self,
        key: &str,
        kind: MediaKind,
        spec: &ElementSpec,
        token: MountToken,
    ) -> ElementHandle;

    /// Mark the slot's node hidden or visible
    fn set_hidden(&mut self, key: &str, hidden: bool);
}

/// Notifications a host delivers on behalf of a mounted element
#[derive(Debug, Clone)]
pub enum MediaSignal {
    /// More data was downloaded; feeds the readiness monitor
    Progress { kind: MediaKind },

    /// Duration/timeline metadata became available; releases any
    /// deferred seek
    MetadataLoaded { kind: MediaKind },

    /// Playback of the element ran off its end
    Ended { kind: MediaKind },

    /// The resource failed to load; the engine re-emits this as a
    /// `ResourceFault` event and does not retry
    Faulted { kind: MediaKind, message: String },
}

/// Stable container key for a mounted slot
pub fn slot_key(index: usize) -> String {
    format!("slot-{}", index)
}
