//! Core playback engine - construction, queries, signal delivery
//!
//! **Responsibilities:**
//! - PlaybackEngine struct definition and slot resolution at construction
//! - Query surface (durations, locate, mount state, current index)
//! - Signal delivery from the host (`deliver`) with stale-mount filtering
//! - Handler dispatch: per-slot override > descriptor handler > default

use std::collections::HashMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use seamq_common::{Error, EventBus, QueueEvent, Result};

use crate::config::{HandlerContext, HandlerSet, QueueOptions, SlotEventKind, SlotHandler};
use crate::descriptor::{MediaKind, RawSlot, Slot};
use crate::host::{MediaHost, MediaSignal};
use crate::mount::{MountState, MountToken, MountedSlot};
use crate::readiness::ready_to_preload;
use crate::timeline::SlotTimeline;

/// Playback scheduler for one slot queue
///
/// Owns the resolved slot list (immutable after construction), the
/// timeline index, and the only mutable shared state in the system: the
/// mounted set. Handlers never mutate the mounted set directly; they go
/// through the engine's operations, which preserves the invariant that at
/// most one slot is visible and playing.
pub struct PlaybackEngine {
    /// Queue identity carried by every emitted event
    pub(super) queue_id: Uuid,

    /// Resolved slots, fixed order, never reordered
    pub(super) slots: Vec<Slot>,

    /// Static duration index over the slots
    pub(super) timeline: SlotTimeline,

    /// Rendering container + element factory injected by the host
    pub(super) host: Box<dyn MediaHost>,

    /// Mounted set: slot index → live mount record
    pub(super) mounted: HashMap<usize, MountedSlot>,

    /// The slot currently shown, if any
    pub(super) visible: Option<usize>,

    /// Scheduler-owned handler rewiring (jump-to-on-end); takes
    /// precedence over descriptor handlers, slots stay immutable
    pub(super) overrides: HashMap<usize, HandlerSet>,

    /// Event broadcaster for host observability
    pub(super) events: EventBus,

    /// Next mount generation to issue
    pub(super) next_generation: u64,
}

impl PlaybackEngine {
    /// Construct a queue: resolve every slot once, build the timeline.
    ///
    /// # Errors
    ///
    /// `Error::Config` when the slot list is empty or any slot fails to
    /// resolve (bad duration string, slot without media, bad threshold).
    pub fn new(
        slots: Vec<RawSlot>,
        options: QueueOptions,
        host: Box<dyn MediaHost>,
    ) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::Config(
                "queue requires at least one slot".to_string(),
            ));
        }

        let mut resolved = Vec::with_capacity(slots.len());
        for (index, raw) in slots.into_iter().enumerate() {
            let slot = Slot::resolve(raw, &options).map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("slot {}: {}", index, msg)),
            })?;
            resolved.push(slot);
        }

        let timeline = SlotTimeline::new(resolved.iter().map(Slot::duration_secs).collect());
        let queue_id = Uuid::new_v4();

        info!(
            "Constructed queue {} with {} slots, total duration {}s",
            queue_id,
            resolved.len(),
            timeline.total_duration()
        );

        Ok(Self {
            queue_id,
            slots: resolved,
            timeline,
            host,
            mounted: HashMap::new(),
            visible: None,
            overrides: HashMap::new(),
            events: EventBus::new(),
            next_generation: 0,
        })
    }

    // ========== Queries ==========

    /// Identity carried by this queue's events
    pub fn queue_id(&self) -> Uuid {
        self.queue_id
    }

    /// Number of slots in the queue
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: empty queues are rejected at construction
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolved slot at `index`
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// The static duration index
    pub fn timeline(&self) -> &SlotTimeline {
        &self.timeline
    }

    /// Total duration of the whole queue in seconds
    pub fn total_duration(&self) -> u64 {
        self.timeline.total_duration()
    }

    /// Slot owning `offset_secs`, with its index.
    ///
    /// `None` outside `[0, total_duration()]`.
    pub fn get_at_seconds(&self, offset_secs: f64) -> Option<(usize, &Slot)> {
        let index = self.timeline.locate(offset_secs)?;
        self.slots.get(index).map(|slot| (index, slot))
    }

    /// The currently shown slot, if any
    pub fn current_index(&self) -> Option<usize> {
        self.visible
    }

    /// Lifecycle state of a slot as tracked by the mounted set
    pub fn mount_state(&self, index: usize) -> MountState {
        self.mounted
            .get(&index)
            .map(MountedSlot::state)
            .unwrap_or(MountState::Unmounted)
    }

    /// True when the slot holds live, attached resources
    pub fn is_mounted(&self, index: usize) -> bool {
        !matches!(
            self.mount_state(index),
            MountState::Unmounted | MountState::Detached
        )
    }

    /// Event broadcaster; subscribe for queue lifecycle events
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ========== Signal delivery ==========

    /// Deliver a media signal on behalf of a mounted element.
    ///
    /// The token is the one issued when the slot's elements were
    /// constructed. Signals for unmounted indices, mismatched generations,
    /// or detached slots are discarded: a reclaimed slot stops reacting
    /// until it is relinked.
    pub fn deliver(&mut self, token: MountToken, signal: MediaSignal) {
        let Some(mounted) = self.mounted.get(&token.index) else {
            debug!("Dropping signal for unmounted slot {}", token.index);
            return;
        };
        if mounted.generation != token.generation {
            debug!(
                "Dropping stale signal for slot {} (generation {} != {})",
                token.index, token.generation, mounted.generation
            );
            return;
        }
        if mounted.detached {
            debug!("Dropping signal for detached slot {}", token.index);
            return;
        }

        match signal {
            MediaSignal::Progress { kind } => self.on_progress(token.index, kind),
            MediaSignal::MetadataLoaded { kind } => self.on_metadata(token.index, kind),
            MediaSignal::Ended { kind } => self.on_ended(token.index, kind),
            MediaSignal::Faulted { kind, message } => self.on_faulted(token.index, kind, message),
        }
    }

    /// Progress notification: evaluate the readiness gate, fire the
    /// slot's buffered signal at most once per mount generation.
    fn on_progress(&mut self, index: usize, kind: MediaKind) {
        let ready = {
            let Some(mounted) = self.mounted.get(&index) else {
                return;
            };
            if mounted.buffered_latch.fired() {
                return;
            }
            let Some(track) = mounted.tracks.iter().find(|t| t.kind == kind) else {
                return;
            };
            let Some(descriptor) = self.slots[index].descriptor(kind) else {
                return;
            };
            ready_to_preload(
                &*track.element.borrow(),
                descriptor.progress_threshold,
                descriptor.duration_threshold,
            )
        };
        if !ready {
            return;
        }

        let fired = self
            .mounted
            .get_mut(&index)
            .map(|m| m.buffered_latch.fire())
            .unwrap_or(false);
        if !fired {
            return;
        }

        info!("Slot {} buffered ({} track crossed thresholds)", index, kind);
        self.events.emit_lossy(QueueEvent::SlotBuffered {
            queue_id: self.queue_id,
            index,
            timestamp: chrono::Utc::now(),
        });

        if !self.run_handler(index, kind, SlotEventKind::Buffered) {
            // Default reaction: preload the next slot for a gapless handoff
            if index + 1 < self.slots.len() {
                self.prepare(index + 1);
            } else {
                debug!("Last slot buffered; nothing further to prepare");
            }
        }
    }

    /// Metadata notification: apply any deferred seek for the track.
    fn on_metadata(&mut self, index: usize, kind: MediaKind) {
        let Some(mounted) = self.mounted.get_mut(&index) else {
            return;
        };
        let Some(track) = mounted.track_mut(kind) else {
            return;
        };
        if let Some(target) = track.pending_seek.take() {
            debug!(
                "Applying deferred seek on slot {} {} track: {}s",
                index, kind, target
            );
            track.element.borrow_mut().seek(target);
        }
    }

    /// End-of-playback notification: default reaction advances the queue.
    fn on_ended(&mut self, index: usize, kind: MediaKind) {
        info!("Slot {} ended ({} track)", index, kind);
        self.events.emit_lossy(QueueEvent::SlotEnded {
            queue_id: self.queue_id,
            index,
            timestamp: chrono::Utc::now(),
        });

        if !self.run_handler(index, kind, SlotEventKind::Ended) {
            // Clamp semantics: ending the last slot re-plays it
            self.play(index + 1);
        }
    }

    /// Load failure: re-emitted for the host; the engine does not retry.
    fn on_faulted(&mut self, index: usize, kind: MediaKind, message: String) {
        warn!("Resource fault on slot {} {} track: {}", index, kind, message);
        self.events.emit_lossy(QueueEvent::ResourceFault {
            queue_id: self.queue_id,
            index,
            message,
            timestamp: chrono::Utc::now(),
        });
        self.run_handler(index, kind, SlotEventKind::Error);
    }

    // ========== Handler dispatch (internal) ==========

    /// Most specific handler for the event: scheduler override first,
    /// then the descriptor's merged table.
    pub(super) fn handler_for(
        &self,
        index: usize,
        kind: MediaKind,
        event: SlotEventKind,
    ) -> Option<SlotHandler> {
        if let Some(overrides) = self.overrides.get(&index) {
            if let Some(handler) = overrides.get(event) {
                return Some(handler.clone());
            }
        }
        self.slots
            .get(index)
            .and_then(|slot| slot.descriptor(kind))
            .and_then(|descriptor| descriptor.handlers.get(event))
            .cloned()
    }

    /// Run the registered handler for the event, if any.
    ///
    /// Returns false when no handler is registered, in which case the
    /// caller applies the default reaction. The handler is cloned out of
    /// the tables before the call so it can drive the engine reentrantly.
    pub(super) fn run_handler(
        &mut self,
        index: usize,
        kind: MediaKind,
        event: SlotEventKind,
    ) -> bool {
        let Some(handler) = self.handler_for(index, kind, event) else {
            return false;
        };
        let Some(descriptor) = self
            .slots
            .get(index)
            .and_then(|slot| slot.descriptor(kind))
            .cloned()
        else {
            return false;
        };

        let context = HandlerContext {
            queue_id: self.queue_id,
            index,
            kind,
            descriptor,
        };
        (handler.as_ref())(self, &context);
        true
    }

    /// Defend the unique visible-playing invariant. A violation is a
    /// programmer error in the scheduler, not a recoverable condition.
    pub(super) fn assert_unique_visible(&self) {
        debug_assert!(
            self.mounted
                .values()
                .filter(|m| m.state() == MountState::Visible)
                .count()
                <= 1,
            "more than one slot is visible and playing"
        );
    }
}
