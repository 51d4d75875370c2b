//! Shared test doubles for integration tests
//!
//! Provides an in-memory `MediaHost` and `MediaElement` pair that records
//! every call the engine makes, plus builders for the reference queues
//! used across the test suite.

// Each integration test binary compiles its own copy of this module and
// uses a different subset of it
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use seamq_engine::{
    BufferedRange, ElementHandle, ElementSpec, MediaElement, MediaHost, MediaKind, MountToken,
    QueueOptions, PlaybackEngine, RawDescriptor, RawSlot, ReadyState, SourceRef,
};

/// Scripted media element that records engine calls
pub struct MockElement {
    pub kind: MediaKind,
    pub sources: Vec<SourceRef>,
    pub attributes: BTreeMap<String, String>,
    pub playing: bool,
    pub pause_calls: usize,
    pub clear_calls: usize,
    pub position: f64,
    pub seeks: Vec<f64>,
    pub ready_state: ReadyState,
    pub buffered: Vec<BufferedRange>,
    pub duration: Option<f64>,
}

impl MockElement {
    fn new(kind: MediaKind, spec: &ElementSpec) -> Self {
        Self {
            kind,
            sources: spec.sources.clone(),
            attributes: spec.attributes.clone(),
            playing: false,
            pause_calls: 0,
            clear_calls: 0,
            position: 0.0,
            seeks: Vec::new(),
            ready_state: ReadyState::HaveNothing,
            buffered: Vec::new(),
            duration: None,
        }
    }

    /// Script the element as fully downloaded and ready to play through
    pub fn script_fully_buffered(&mut self, duration: f64) {
        self.duration = Some(duration);
        self.ready_state = ReadyState::HaveEnoughData;
        self.buffered = vec![BufferedRange {
            start: 0.0,
            end: duration,
        }];
    }

    /// Script metadata as known without any data buffered yet
    pub fn script_metadata(&mut self, duration: f64) {
        self.duration = Some(duration);
        self.ready_state = ReadyState::HaveMetadata;
    }
}

impl MediaElement for MockElement {
    fn set_sources(&mut self, sources: &[SourceRef]) {
        self.sources = sources.to_vec();
    }

    fn clear_sources(&mut self) {
        self.sources.clear();
        self.clear_calls += 1;
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
        self.pause_calls += 1;
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds;
        self.seeks.push(seconds);
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn buffered(&self) -> Vec<BufferedRange> {
        self.buffered.clone()
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }
}

/// One element the host created, with the token the engine issued for it
pub struct CreatedElement {
    pub key: String,
    pub kind: MediaKind,
    pub token: MountToken,
    pub element: Rc<RefCell<MockElement>>,
}

/// Everything the mock host observed
#[derive(Default)]
pub struct HostRecord {
    pub created: Vec<CreatedElement>,
    pub hidden: BTreeMap<String, bool>,
}

impl HostRecord {
    /// Latest element created for a slot index and kind
    pub fn element(&self, index: usize, kind: MediaKind) -> Rc<RefCell<MockElement>> {
        let key = format!("slot-{}", index);
        self.created
            .iter()
            .rev()
            .find(|c| c.key == key && c.kind == kind)
            .map(|c| c.element.clone())
            .unwrap_or_else(|| panic!("no {} element created for {}", kind, key))
    }

    /// Latest token issued for a slot index and kind
    pub fn token(&self, index: usize, kind: MediaKind) -> MountToken {
        let key = format!("slot-{}", index);
        self.created
            .iter()
            .rev()
            .find(|c| c.key == key && c.kind == kind)
            .map(|c| c.token)
            .unwrap_or_else(|| panic!("no {} element created for {}", kind, key))
    }

    /// Number of elements ever created for a slot index
    pub fn created_count(&self, index: usize) -> usize {
        let key = format!("slot-{}", index);
        self.created.iter().filter(|c| c.key == key).count()
    }

    /// Whether the host currently shows a slot's node
    pub fn is_visible(&self, index: usize) -> bool {
        let key = format!("slot-{}", index);
        matches!(self.hidden.get(&key), Some(false))
    }

    /// Keys of all currently visible nodes
    pub fn visible_keys(&self) -> Vec<String> {
        self.hidden
            .iter()
            .filter(|(_, &hidden)| !hidden)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

/// Recording `MediaHost` backed by a shared [`HostRecord`]
pub struct MockHost {
    pub record: Rc<RefCell<HostRecord>>,
}

impl MockHost {
    pub fn new() -> (Self, Rc<RefCell<HostRecord>>) {
        let record = Rc::new(RefCell::new(HostRecord::default()));
        (
            Self {
                record: record.clone(),
            },
            record,
        )
    }
}

impl MediaHost for MockHost {
    fn create_element(
        &mut self,
        key: &str,
        kind: MediaKind,
        spec: &ElementSpec,
        token: MountToken,
    ) -> ElementHandle {
        let element = Rc::new(RefCell::new(MockElement::new(kind, spec)));
        self.record.borrow_mut().created.push(CreatedElement {
            key: key.to_string(),
            kind,
            token,
            element: element.clone(),
        });
        element
    }

    fn set_hidden(&mut self, key: &str, hidden: bool) {
        self.record
            .borrow_mut()
            .hidden
            .insert(key.to_string(), hidden);
    }
}

/// Video-only raw descriptor for `clip-{index}` with the given duration
pub fn video_descriptor(index: usize, duration: &str) -> RawDescriptor {
    RawDescriptor {
        source: format!("clip-{}", index),
        duration: duration.to_string(),
        extensions: vec!["mp4".to_string(), "webm".to_string()],
        ..Default::default()
    }
}

/// Video-only slot list from duration strings
pub fn video_slots(durations: &[&str]) -> Vec<RawSlot> {
    durations
        .iter()
        .enumerate()
        .map(|(index, duration)| RawSlot {
            video: Some(video_descriptor(index, duration)),
            audio: None,
        })
        .collect()
}

/// The 45-second reference queue (10s, 20s, 15s), default options
pub fn reference_engine() -> (PlaybackEngine, Rc<RefCell<HostRecord>>) {
    engine_with(video_slots(&["0:10", "0:20", "0:15"]), QueueOptions::default())
}

/// Build an engine over a recording host
pub fn engine_with(
    slots: Vec<RawSlot>,
    options: QueueOptions,
) -> (PlaybackEngine, Rc<RefCell<HostRecord>>) {
    init_tracing();
    let (host, record) = MockHost::new();
    let engine = PlaybackEngine::new(slots, options, Box::new(host))
        .expect("test queue should resolve");
    (engine, record)
}

/// Install a test subscriber so `RUST_LOG=debug` surfaces the engine's
/// scheduling decisions during test runs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
