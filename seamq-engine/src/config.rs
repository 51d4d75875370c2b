//! Queue configuration and the three-level override chain
//!
//! A queue is constructed with one immutable [`QueueOptions`] value holding
//! three sections: `media` (shared defaults), `video` and `audio`
//! (type-level defaults). Per-slot descriptor values form the most
//! specific level. The merge is deep and right-biased (a key present at
//! a more specific level always wins) and handler tables merge kind by
//! kind rather than being replaced wholesale.
//!
//! There is no process-wide defaults object: all configuration is threaded
//! through the engine at construction.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::descriptor::{MediaDescriptor, MediaKind};
use crate::engine::PlaybackEngine;

/// Default highest-buffered-fraction gate for the readiness monitor
pub const DEFAULT_PROGRESS_THRESHOLD: f64 = 0.7;

/// Default undownloaded-remainder gate in seconds
pub const DEFAULT_DURATION_THRESHOLD: u64 = 60;

/// Lifecycle and media event kinds a handler can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEventKind {
    /// About to construct the slot's underlying resources
    BeforeMount,
    /// Resources constructed and attached (hidden)
    Mounted,
    /// The slot was instructed to begin playing
    Play,
    /// The readiness monitor fired for the slot
    Buffered,
    /// A resource in the slot reported end of playback
    Ended,
    /// A resource in the slot failed to load
    Error,
}

/// Context handed to every slot handler
///
/// The engine itself is the handler's first argument, so a handler can
/// drive the queue (advance, seek, prepare) directly.
#[derive(Clone)]
pub struct HandlerContext {
    /// Identity of the emitting queue
    pub queue_id: Uuid,
    /// Slot index the event belongs to
    pub index: usize,
    /// Which sub-descriptor raised it
    pub kind: MediaKind,
    /// The resolved descriptor of that sub-descriptor
    pub descriptor: MediaDescriptor,
}

/// A slot event handler
///
/// `Rc` because the merge chain shares one function value across levels;
/// the engine runs on a single logical timeline, so no `Send` bound.
pub type SlotHandler = Rc<dyn Fn(&mut PlaybackEngine, &HandlerContext)>;

/// Handler table: one optional handler per event kind
///
/// A tagged union rather than an open-ended map, so the per-kind merge is
/// total: for each kind, the more specific level's handler wins when set.
#[derive(Clone, Default)]
pub struct HandlerSet {
    pub before_mount: Option<SlotHandler>,
    pub mounted: Option<SlotHandler>,
    pub play: Option<SlotHandler>,
    pub buffered: Option<SlotHandler>,
    pub ended: Option<SlotHandler>,
    pub error: Option<SlotHandler>,
}

impl HandlerSet {
    /// Handler registered for `kind`, if any
    pub fn get(&self, kind: SlotEventKind) -> Option<&SlotHandler> {
        match kind {
            SlotEventKind::BeforeMount => self.before_mount.as_ref(),
            SlotEventKind::Mounted => self.mounted.as_ref(),
            SlotEventKind::Play => self.play.as_ref(),
            SlotEventKind::Buffered => self.buffered.as_ref(),
            SlotEventKind::Ended => self.ended.as_ref(),
            SlotEventKind::Error => self.error.as_ref(),
        }
    }

    /// Install a handler for `kind`, replacing any existing one
    pub fn set(&mut self, kind: SlotEventKind, handler: SlotHandler) {
        let entry = match kind {
            SlotEventKind::BeforeMount => &mut self.before_mount,
            SlotEventKind::Mounted => &mut self.mounted,
            SlotEventKind::Play => &mut self.play,
            SlotEventKind::Buffered => &mut self.buffered,
            SlotEventKind::Ended => &mut self.ended,
            SlotEventKind::Error => &mut self.error,
        };
        *entry = Some(handler);
    }

    /// Per-kind overlay: `self` wins where set, `base` fills the gaps
    pub fn merged_over(&self, base: &HandlerSet) -> HandlerSet {
        HandlerSet {
            before_mount: self.before_mount.clone().or_else(|| base.before_mount.clone()),
            mounted: self.mounted.clone().or_else(|| base.mounted.clone()),
            play: self.play.clone().or_else(|| base.play.clone()),
            buffered: self.buffered.clone().or_else(|| base.buffered.clone()),
            ended: self.ended.clone().or_else(|| base.ended.clone()),
            error: self.error.clone().or_else(|| base.error.clone()),
        }
    }

    /// True when no kind has a handler
    pub fn is_empty(&self) -> bool {
        self.before_mount.is_none()
            && self.mounted.is_none()
            && self.play.is_none()
            && self.buffered.is_none()
            && self.ended.is_none()
            && self.error.is_none()
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let armed: Vec<&str> = [
            ("before_mount", self.before_mount.is_some()),
            ("mounted", self.mounted.is_some()),
            ("play", self.play.is_some()),
            ("buffered", self.buffered.is_some()),
            ("ended", self.ended.is_some()),
            ("error", self.error.is_some()),
        ]
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| *name)
        .collect();
        f.debug_struct("HandlerSet").field("armed", &armed).finish()
    }
}

/// One configuration level (queue-wide or type-level)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerOptions {
    /// Prefix prepended to every descriptor source path
    pub base_source: Option<String>,

    /// Presentation attributes merged into every descriptor
    pub attributes: BTreeMap<String, String>,

    /// Event handlers merged kind-by-kind into every descriptor
    #[serde(skip)]
    pub handlers: HandlerSet,

    /// Buffered-fraction gate override, ratio in `[0, 1]`
    pub progress_threshold: Option<f64>,

    /// Undownloaded-remainder gate override, seconds
    pub duration_threshold: Option<u64>,
}

/// Queue-wide configuration: shared defaults plus per-type defaults
///
/// Merge order for a video descriptor is `media < video < descriptor`;
/// for an audio descriptor `media < audio < descriptor`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueOptions {
    /// Defaults shared by both media types
    pub media: LayerOptions,
    /// Video-type defaults
    pub video: LayerOptions,
    /// Audio-type defaults
    pub audio: LayerOptions,
}

impl QueueOptions {
    /// The type-level section for `kind`
    pub fn layer_for(&self, kind: MediaKind) -> &LayerOptions {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }
}
