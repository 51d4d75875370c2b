//! Transport operations
//!
//! **Responsibilities:**
//! - Mounting (fresh construction and relink of reclaimed slots)
//! - Look-ahead preparation (`prepare`, `prepare_at`, `preload_at`)
//! - Playback control (`play`, `seek`)
//! - End-of-slot jump rewiring (`jump_to_on_end`, `jump_to_on_current_end`)

use std::rc::Rc;

use tracing::{info, warn};

use seamq_common::QueueEvent;

use super::core::PlaybackEngine;
use crate::config::SlotEventKind;
use crate::host::{slot_key, ElementSpec, ReadyState};
use crate::mount::{MountToken, MountedSlot, MountedTrack};
use crate::readiness::OneShot;

impl PlaybackEngine {
    /// Mount a slot's resources, hidden, and begin loading.
    ///
    /// Idempotent: an already-mounted slot returns its existing token. A
    /// reclaimed slot is relinked from the saved source references so
    /// loading resumes without re-resolving the slot. The token stays
    /// stable for the life of the slot's elements, since hosts tag
    /// signals with the token issued at element creation; relinking does
    /// drop the superseded mount's one-shot subscriptions, re-arming the
    /// readiness latch and discarding any deferred seek.
    pub(super) fn mount(&mut self, index: usize) -> MountToken {
        if let Some(mounted) = self.mounted.get_mut(&index) {
            let token = MountToken {
                index,
                generation: mounted.generation,
            };
            if mounted.detached {
                mounted.detached = false;
                mounted.buffered_latch.rearm();
                for track in &mut mounted.tracks {
                    track.pending_seek = None;
                    if let Some(sources) = track.saved_sources.take() {
                        track.element.borrow_mut().set_sources(&sources);
                    }
                }
                info!("Relinked slot {} for resumed loading", index);
            }
            return token;
        }
        self.mount_fresh(index)
    }

    /// Construct and attach the slot's elements for the first time.
    fn mount_fresh(&mut self, index: usize) -> MountToken {
        let kinds = self.slots[index].kinds();

        for &kind in &kinds {
            self.run_handler(index, kind, SlotEventKind::BeforeMount);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let token = MountToken { index, generation };
        let key = slot_key(index);

        let mut tracks = Vec::with_capacity(kinds.len());
        for &kind in &kinds {
            let Some(descriptor) = self.slots[index].descriptor(kind) else {
                continue;
            };
            let spec = ElementSpec {
                sources: descriptor.source_refs(),
                attributes: descriptor.attributes.clone(),
            };
            let element = self.host.create_element(&key, kind, &spec, token);
            tracks.push(MountedTrack {
                kind,
                element,
                pending_seek: None,
                saved_sources: None,
            });
        }
        self.host.set_hidden(&key, true);

        self.mounted.insert(
            index,
            MountedSlot {
                generation,
                hidden: true,
                playing: false,
                detached: false,
                tracks,
                buffered_latch: OneShot::new(),
            },
        );

        info!("Mounted slot {} hidden (generation {})", index, generation);
        self.events.emit_lossy(QueueEvent::SlotMounted {
            queue_id: self.queue_id,
            index,
            timestamp: chrono::Utc::now(),
        });

        for &kind in &kinds {
            self.run_handler(index, kind, SlotEventKind::Mounted);
        }

        token
    }

    /// Mount a slot for look-ahead preloading without making it visible.
    ///
    /// Out-of-range indices clamp to the last slot, matching `play`.
    pub fn prepare(&mut self, index: usize) -> MountToken {
        let index = self.clamp_index(index);
        let token = self.mount(index);
        self.hide_slot(index);
        token
    }

    /// Prepare the slot owning `offset_secs`.
    ///
    /// False when the offset is outside `[0, total_duration()]`.
    pub fn prepare_at(&mut self, offset_secs: f64) -> bool {
        let Some(index) = self.timeline.locate(offset_secs) else {
            warn!("prepare_at({}) rejected: outside timeline", offset_secs);
            return false;
        };
        self.prepare(index);
        true
    }

    /// Prepare the slot owning `offset_secs` and position it at the
    /// within-slot offset, deferring the seek until metadata if needed.
    ///
    /// False when the offset is outside `[0, total_duration()]`.
    pub fn preload_at(&mut self, offset_secs: f64) -> bool {
        let Some(index) = self.timeline.locate(offset_secs) else {
            warn!("preload_at({}) rejected: outside timeline", offset_secs);
            return false;
        };
        let within = offset_secs - self.duration_before(index);
        self.prepare(index);
        self.seek_within(index, within);
        true
    }

    /// Make a slot the unique visible, playing slot.
    ///
    /// Out-of-range indices clamp to the last slot: no wraparound, no
    /// error. Every other slot is reclaimed (paused, sources detached)
    /// and hidden first, bounding concurrent downloads.
    pub fn play(&mut self, index: usize) -> MountToken {
        let index = self.clamp_index(index);
        info!("Play slot {}", index);

        self.reclaim_all_except(index);

        let others: Vec<usize> = self
            .mounted
            .keys()
            .copied()
            .filter(|&i| i != index)
            .collect();
        for other in others {
            self.hide_slot(other);
        }

        let token = self.mount(index);
        self.show_slot(index);

        if let Some(mounted) = self.mounted.get_mut(&index) {
            for track in &mut mounted.tracks {
                // A plain play supersedes any deferred seek on the slot
                track.pending_seek = None;
                track.element.borrow_mut().play();
            }
            mounted.playing = true;
        }
        self.visible = Some(index);

        self.events.emit_lossy(QueueEvent::SlotShown {
            queue_id: self.queue_id,
            index,
            timestamp: chrono::Utc::now(),
        });
        for kind in self.slots[index].kinds() {
            self.run_handler(index, kind, SlotEventKind::Play);
        }

        self.assert_unique_visible();
        token
    }

    /// Seek the whole queue to an absolute offset.
    ///
    /// False outside `[0, total_duration()]`, with no state change.
    /// Otherwise plays the owning slot and positions every resource in it
    /// at the within-slot offset: immediately when the resource already
    /// knows its timeline, else deferred to its metadata signal.
    pub fn seek(&mut self, offset_secs: f64) -> bool {
        let Some(index) = self.timeline.locate(offset_secs) else {
            warn!(
                "Seek to {}s rejected: outside [0, {}]",
                offset_secs,
                self.timeline.total_duration()
            );
            return false;
        };
        let within = offset_secs - self.duration_before(index);

        info!(
            "Seek {}s resolves to slot {} at {}s within",
            offset_secs, index, within
        );
        self.play(index);
        self.seek_within(index, within);
        true
    }

    /// Rewire a slot so that, once buffered, it preloads the slot owning
    /// `offset_secs`, and on ending seeks the queue there.
    ///
    /// False when the slot index or the target offset is out of range.
    /// The rewiring is scheduler-owned and per-kind: the slot's other
    /// handlers keep resolving through the descriptor tables.
    pub fn jump_to_on_end(&mut self, index: usize, offset_secs: f64) -> bool {
        if index >= self.slots.len() {
            warn!("jump_to_on_end: slot {} out of bounds", index);
            return false;
        }
        if self.timeline.locate(offset_secs).is_none() {
            warn!(
                "jump_to_on_end: target {}s outside timeline",
                offset_secs
            );
            return false;
        }

        let overrides = self.overrides.entry(index).or_default();
        overrides.set(
            SlotEventKind::Buffered,
            Rc::new(move |engine, _ctx| {
                engine.preload_at(offset_secs);
            }),
        );
        overrides.set(
            SlotEventKind::Ended,
            Rc::new(move |engine, _ctx| {
                engine.seek(offset_secs);
            }),
        );

        info!("Slot {} will jump to {}s when it ends", index, offset_secs);
        true
    }

    /// [`Self::jump_to_on_end`] applied to the currently shown slot.
    ///
    /// False when nothing is currently shown.
    pub fn jump_to_on_current_end(&mut self, offset_secs: f64) -> bool {
        let Some(current) = self.visible else {
            warn!("jump_to_on_current_end: no slot is currently shown");
            return false;
        };
        self.jump_to_on_end(current, offset_secs)
    }

    // ========== Helpers (internal) ==========

    /// High indices clamp to the last slot; the queue is never empty.
    pub(super) fn clamp_index(&self, index: usize) -> usize {
        index.min(self.slots.len().saturating_sub(1))
    }

    /// Cumulative duration of every slot before `index`
    pub(super) fn duration_before(&self, index: usize) -> f64 {
        if index == 0 {
            0.0
        } else {
            self.timeline.duration_of_range(0, index - 1) as f64
        }
    }

    /// Seek every resource in a mounted slot to a within-slot offset,
    /// deferring per track until metadata arrives.
    pub(super) fn seek_within(&mut self, index: usize, within_secs: f64) {
        let Some(mounted) = self.mounted.get_mut(&index) else {
            return;
        };
        for track in &mut mounted.tracks {
            let has_metadata = track.element.borrow().ready_state() >= ReadyState::HaveMetadata;
            if has_metadata {
                track.element.borrow_mut().seek(within_secs);
                track.pending_seek = None;
            } else {
                track.pending_seek = Some(within_secs);
            }
        }
    }

    /// Hide a mounted slot's node; clears the current-slot marker when it
    /// was the one shown.
    pub(super) fn hide_slot(&mut self, index: usize) {
        if let Some(mounted) = self.mounted.get_mut(&index) {
            if !mounted.hidden {
                mounted.hidden = true;
                self.host.set_hidden(&slot_key(index), true);
            }
        }
        if self.visible == Some(index) {
            self.visible = None;
        }
    }

    /// Reveal a mounted slot's node.
    pub(super) fn show_slot(&mut self, index: usize) {
        if let Some(mounted) = self.mounted.get_mut(&index) {
            if mounted.hidden {
                mounted.hidden = false;
                self.host.set_hidden(&slot_key(index), false);
            }
        }
    }
}
