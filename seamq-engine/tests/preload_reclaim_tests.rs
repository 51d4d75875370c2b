//! Preload, reclaim and signal-lifecycle integration tests
//!
//! Covers the gapless handoff path: readiness firing once per mount
//! generation, the default prepare-next reaction, resource reclamation
//! with relink on re-mount, stale-token filtering, the jump-to-on-end
//! rewiring, and event bus emission.

mod helpers;

use helpers::reference_engine;
use seamq_engine::{MediaKind, MediaSignal, MountState, MountToken, QueueEvent};

fn progress() -> MediaSignal {
    MediaSignal::Progress {
        kind: MediaKind::Video,
    }
}

fn ended() -> MediaSignal {
    MediaSignal::Ended {
        kind: MediaKind::Video,
    }
}

#[test]
fn test_buffered_prepares_next_slot() {
    let (mut engine, record) = reference_engine();
    let token = engine.play(0);

    record
        .borrow()
        .element(0, MediaKind::Video)
        .borrow_mut()
        .script_fully_buffered(10.0);
    engine.deliver(token, progress());

    // Default reaction preloaded the look-ahead slot, hidden
    assert_eq!(record.borrow().created_count(1), 1);
    assert_eq!(engine.mount_state(1), MountState::MountedLoading);
    assert!(!record.borrow().is_visible(1));
    // The current slot stays the only visible one
    assert_eq!(engine.current_index(), Some(0));
}

#[test]
fn test_readiness_fires_once_per_mount_generation() {
    let (mut engine, record) = reference_engine();
    let token = engine.play(0);

    record
        .borrow()
        .element(0, MediaKind::Video)
        .borrow_mut()
        .script_fully_buffered(10.0);

    let events = engine.events().subscribe();
    engine.deliver(token, progress());
    engine.deliver(token, progress());
    engine.deliver(token, progress());

    let buffered_count = events
        .try_iter()
        .filter(|e| matches!(e, QueueEvent::SlotBuffered { .. }))
        .count();
    assert_eq!(buffered_count, 1);
}

#[test]
fn test_readiness_gate_holds_below_thresholds() {
    let (mut engine, record) = reference_engine();
    let token = engine.play(0);

    // Metadata known but only half buffered and not enough-data
    {
        let element = record.borrow().element(0, MediaKind::Video);
        let mut element = element.borrow_mut();
        element.script_metadata(10.0);
        element.buffered = vec![seamq_engine::BufferedRange {
            start: 0.0,
            end: 5.0,
        }];
    }

    engine.deliver(token, progress());

    assert_eq!(record.borrow().created_count(1), 0);
    assert_eq!(engine.mount_state(1), MountState::Unmounted);
}

#[test]
fn test_ended_advances_and_reclaims() {
    let (mut engine, record) = reference_engine();
    let token = engine.play(0);

    engine.deliver(token, ended());

    assert_eq!(engine.current_index(), Some(1));
    assert_eq!(engine.mount_state(0), MountState::Detached);

    let element = record.borrow().element(0, MediaKind::Video);
    assert!(!element.borrow().playing);
    assert_eq!(element.borrow().clear_calls, 1);
    assert!(element.borrow().sources.is_empty());
}

#[test]
fn test_ended_on_last_slot_replays_it() {
    let (mut engine, _record) = reference_engine();
    let token = engine.play(2);

    engine.deliver(token, ended());

    // play(3) clamps back to the last slot
    assert_eq!(engine.current_index(), Some(2));
    assert_eq!(engine.mount_state(2), MountState::Visible);
}

#[test]
fn test_remount_relinks_saved_sources() {
    let (mut engine, record) = reference_engine();
    engine.play(0);

    let original_sources = record
        .borrow()
        .element(0, MediaKind::Video)
        .borrow()
        .sources
        .clone();

    // Moving on reclaims slot 0 and clears its sources
    engine.play(1);
    assert!(record
        .borrow()
        .element(0, MediaKind::Video)
        .borrow()
        .sources
        .is_empty());

    // Coming back relinks the recorded sources on the same element
    engine.play(0);
    let element = record.borrow().element(0, MediaKind::Video);
    assert_eq!(element.borrow().sources, original_sources);
    assert!(element.borrow().playing);
    // No second element was constructed for the slot
    assert_eq!(record.borrow().created_count(0), 1);
}

#[test]
fn test_signals_from_detached_or_forged_mounts_are_dropped() {
    let (mut engine, record) = reference_engine();
    let token0 = engine.play(0);

    // Moving on detaches slot 0
    engine.play(1);
    assert_eq!(engine.mount_state(0), MountState::Detached);

    // A late ended signal racing in from the detached slot must not
    // re-route playback
    engine.deliver(token0, ended());
    assert_eq!(engine.current_index(), Some(1));

    // A token whose generation does not match the mounted record is
    // ignored outright
    let token1 = record.borrow().token(1, MediaKind::Video);
    let forged = MountToken {
        index: token1.index,
        generation: token1.generation + 40,
    };
    engine.deliver(forged, ended());
    assert_eq!(engine.current_index(), Some(1));

    // The live token still works
    engine.deliver(token1, ended());
    assert_eq!(engine.current_index(), Some(2));
}

#[test]
fn test_superseded_deferred_seek_is_dropped() {
    let (mut engine, record) = reference_engine();

    // Defer a seek into slot 1 (no metadata yet)
    engine.seek(25.0);
    let token = record.borrow().token(1, MediaKind::Video);

    // Supersede it: play elsewhere reclaims slot 1, playing it again
    // relinks the slot and drops the pending one-shot seek
    engine.play(0);
    engine.play(1);

    // While slot 1 was detached, its metadata signal is discarded; after
    // the relink the pending seek is gone, so metadata moves nothing
    record
        .borrow()
        .element(1, MediaKind::Video)
        .borrow_mut()
        .script_metadata(20.0);
    engine.deliver(
        token,
        MediaSignal::MetadataLoaded {
            kind: MediaKind::Video,
        },
    );
    assert!(record
        .borrow()
        .element(1, MediaKind::Video)
        .borrow()
        .seeks
        .is_empty());
}

#[test]
fn test_jump_to_on_end_preloads_then_seeks() {
    let (mut engine, record) = reference_engine();
    let token = engine.play(0);

    assert!(engine.jump_to_on_end(0, 25.0));

    // Buffered now preloads the jump target instead of the next slot
    record
        .borrow()
        .element(0, MediaKind::Video)
        .borrow_mut()
        .script_fully_buffered(10.0);
    engine.deliver(token, progress());

    assert_eq!(record.borrow().created_count(1), 1);
    assert!(!record.borrow().is_visible(1));
    record
        .borrow()
        .element(1, MediaKind::Video)
        .borrow_mut()
        .script_metadata(20.0);
    let target_token = record.borrow().token(1, MediaKind::Video);
    engine.deliver(
        target_token,
        MediaSignal::MetadataLoaded {
            kind: MediaKind::Video,
        },
    );
    // Preload positioned the target 15s into slot 1
    assert_eq!(
        record.borrow().element(1, MediaKind::Video).borrow().seeks,
        vec![15.0]
    );

    // Ended seeks the whole queue to the absolute offset
    engine.deliver(token, ended());
    assert_eq!(engine.current_index(), Some(1));
}

#[test]
fn test_jump_to_on_end_rejects_bad_targets() {
    let (mut engine, _record) = reference_engine();
    engine.play(0);

    assert!(!engine.jump_to_on_end(7, 25.0));
    assert!(!engine.jump_to_on_end(0, 99.0));
    assert!(engine.jump_to_on_current_end(25.0));
}

#[test]
fn test_jump_to_on_current_end_requires_current() {
    let (mut engine, _record) = reference_engine();
    assert!(!engine.jump_to_on_current_end(25.0));
}

#[test]
fn test_resource_fault_is_reemitted_not_retried() {
    let (mut engine, record) = reference_engine();
    let token = engine.play(0);
    let events = engine.events().subscribe();

    engine.deliver(
        token,
        MediaSignal::Faulted {
            kind: MediaKind::Video,
            message: "network unreachable".to_string(),
        },
    );

    match events.try_recv() {
        Ok(QueueEvent::ResourceFault { index, message, .. }) => {
            assert_eq!(index, 0);
            assert_eq!(message, "network unreachable");
        }
        other => panic!("expected ResourceFault, got {:?}", other),
    }
    // No retry: the element's sources were set exactly once
    assert_eq!(record.borrow().created_count(0), 1);
    assert_eq!(engine.current_index(), Some(0));
}

#[test]
fn test_events_carry_queue_identity() {
    let (mut engine, _record) = reference_engine();
    let events = engine.events().subscribe();

    engine.play(0);
    engine.pause_all();

    let mut seen = 0;
    for event in events.try_iter() {
        let queue_id = match event {
            QueueEvent::SlotMounted { queue_id, .. }
            | QueueEvent::SlotShown { queue_id, .. }
            | QueueEvent::SlotBuffered { queue_id, .. }
            | QueueEvent::SlotEnded { queue_id, .. }
            | QueueEvent::SlotReclaimed { queue_id, .. }
            | QueueEvent::PlaybackPaused { queue_id, .. }
            | QueueEvent::ResourceFault { queue_id, .. } => queue_id,
        };
        assert_eq!(queue_id, engine.queue_id());
        seen += 1;
    }
    // At least the mount, the show and the pause
    assert!(seen >= 3);
}

#[test]
fn test_reclaim_bounds_live_slots_to_current_plus_lookahead() {
    let (mut engine, record) = reference_engine();

    // Walk the whole queue with readiness firing at each step
    for index in 0..engine.len() {
        let token = engine.play(index);
        record
            .borrow()
            .element(index, MediaKind::Video)
            .borrow_mut()
            .script_fully_buffered(engine.slot(index).unwrap().duration_secs() as f64);
        engine.deliver(token, progress());

        let live = (0..engine.len())
            .filter(|&i| engine.is_mounted(i))
            .count();
        assert!(
            live <= 2,
            "more than current + look-ahead alive after play({})",
            index
        );
    }
}
