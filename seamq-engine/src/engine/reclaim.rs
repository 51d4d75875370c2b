//! Resource reclaimer
//!
//! **Responsibilities:**
//! - Detach non-current slots (pause, record sources, clear sources) so
//!   concurrent in-flight downloads stay bounded at the current slot plus
//!   one look-ahead regardless of queue length
//! - `pause_all`: the softer variant that halts playback without
//!   releasing network resources (e.g. page hidden)

use tracing::{debug, info};

use seamq_common::QueueEvent;

use super::core::PlaybackEngine;

impl PlaybackEngine {
    /// Detach every mounted slot other than `index`.
    ///
    /// Each reclaimed slot's resources are paused and their active source
    /// references cleared, with the cleared references recorded in the
    /// mount record so a later `mount`/`prepare` of the same slot relinks
    /// and resumes loading without re-resolving the slot.
    pub fn reclaim_all_except(&mut self, index: usize) {
        let targets: Vec<usize> = self
            .mounted
            .iter()
            .filter(|(&i, m)| i != index && !m.detached)
            .map(|(&i, _)| i)
            .collect();
        for target in targets {
            self.reclaim_slot(target);
        }
    }

    /// Pause every mounted resource without reclaiming anything.
    pub fn pause_all(&mut self) {
        for mounted in self.mounted.values_mut() {
            for track in &mounted.tracks {
                track.element.borrow_mut().pause();
            }
            mounted.playing = false;
        }

        info!("Paused all mounted slots");
        self.events.emit_lossy(QueueEvent::PlaybackPaused {
            queue_id: self.queue_id,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Pause one slot's resources and detach their sources.
    fn reclaim_slot(&mut self, index: usize) {
        let Some(mounted) = self.mounted.get_mut(&index) else {
            return;
        };

        for track in &mut mounted.tracks {
            // Record under the restorable side-channel before clearing
            if track.saved_sources.is_none() {
                let sources = self.slots[index]
                    .descriptor(track.kind)
                    .map(|d| d.source_refs())
                    .unwrap_or_default();
                track.saved_sources = Some(sources);
            }
            let mut element = track.element.borrow_mut();
            element.pause();
            element.clear_sources();
        }
        mounted.detached = true;
        mounted.playing = false;

        debug!("Reclaimed slot {} (sources detached)", index);
        self.events.emit_lossy(QueueEvent::SlotReclaimed {
            queue_id: self.queue_id,
            index,
            timestamp: chrono::Utc::now(),
        });

        if self.visible == Some(index) {
            self.visible = None;
        }
    }
}
