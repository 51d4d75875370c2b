//! Event types for the seamq queue engine
//!
//! The engine reports every scheduling transition through a `QueueEvent`
//! broadcast on an [`EventBus`]. Hosts subscribe to drive UI updates or
//! analytics; resource faults also arrive here, since the engine does not
//! retry failed downloads itself.
//!
//! Delivery is lossy by design: emitting with no live subscribers is not
//! an error, and a dropped receiver silently unsubscribes.

use std::cell::RefCell;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue lifecycle events
///
/// Every variant carries the emitting queue's identity and an emission
/// timestamp, so events from several queues can share one bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// Slot's underlying resources were constructed and attached (hidden)
    SlotMounted {
        /// Emitting queue
        queue_id: Uuid,
        /// Slot index (0-based)
        index: usize,
        /// When the mount completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Slot became the visible, playing slot
    SlotShown {
        queue_id: Uuid,
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Slot's readiness monitor fired: enough is buffered to preload the
    /// next slot. Fires at most once per mount generation.
    SlotBuffered {
        queue_id: Uuid,
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A resource in the slot reported end of playback
    SlotEnded {
        queue_id: Uuid,
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Slot's resources were paused and their sources detached
    SlotReclaimed {
        queue_id: Uuid,
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// `pause_all` halted every mounted resource without reclaiming
    PlaybackPaused {
        queue_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An underlying resource failed to load. The engine does not retry
    /// or switch encodings; reacting is the host's responsibility.
    ResourceFault {
        queue_id: Uuid,
        index: usize,
        /// Host-provided failure description
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// One-to-many event broadcaster
///
/// Each subscriber gets its own unbounded channel; `emit_lossy` clones the
/// event to every live receiver and drops senders whose receiver is gone.
/// Single-threaded by design (the engine runs on one logical timeline), so
/// the subscriber list lives behind a `RefCell` rather than a lock.
pub struct EventBus {
    senders: RefCell<Vec<Sender<QueueEvent>>>,
}

impl EventBus {
    /// Create a new bus with no subscribers
    pub fn new() -> Self {
        Self {
            senders: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> Receiver<QueueEvent> {
        let (tx, rx) = unbounded();
        self.senders.borrow_mut().push(tx);
        rx
    }

    /// Broadcast an event to all subscribers
    ///
    /// No subscribers is fine; disconnected subscribers are pruned.
    pub fn emit_lossy(&self, event: QueueEvent) {
        self.senders
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.senders.borrow().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(queue_id: Uuid, index: usize) -> QueueEvent {
        QueueEvent::SlotShown {
            queue_id,
            index,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_emit_no_subscribers() {
        let bus = EventBus::new();
        // Should not panic without subscribers
        bus.emit_lossy(shown(Uuid::new_v4(), 0));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribe_and_receive() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let queue_id = Uuid::new_v4();
        bus.emit_lossy(shown(queue_id, 2));

        match rx.try_recv().unwrap() {
            QueueEvent::SlotShown {
                queue_id: id,
                index,
                ..
            } => {
                assert_eq!(id, queue_id);
                assert_eq!(index, 2);
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_every_subscriber_gets_a_copy() {
        let bus = EventBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        bus.emit_lossy(shown(Uuid::new_v4(), 1));

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();
        drop(rx2);

        bus.emit_lossy(shown(Uuid::new_v4(), 0));

        assert!(rx1.try_recv().is_ok());
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = QueueEvent::ResourceFault {
            queue_id: Uuid::new_v4(),
            index: 3,
            message: "404 on clip-3.webm".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ResourceFault");
        assert_eq!(json["index"], 3);
    }
}
