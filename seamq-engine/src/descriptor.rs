//! Media descriptors and slot resolution
//!
//! The host describes each queue position as a [`RawSlot`]: an optional
//! video descriptor and/or an optional audio descriptor (both present
//! means synchronized playback of two elements). Resolution runs once at
//! queue construction: the three-level configuration merge is applied,
//! the base source prefix is folded in, and the duration string is parsed
//! and memoized. Resolved values are immutable afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use seamq_common::duration::parse_duration;
use seamq_common::{Error, Result};

use crate::config::{
    HandlerSet, LayerOptions, QueueOptions, DEFAULT_DURATION_THRESHOLD,
    DEFAULT_PROGRESS_THRESHOLD,
};
use crate::host::SourceRef;

/// The two media types a slot can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Lowercase tag used in MIME types and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-supplied description of one playable sub-item, before resolution
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RawDescriptor {
    /// Location without extension; the configured base source is
    /// prepended at resolution
    pub source: String,

    /// Play length as `"m:ss"` or `"h:mm:ss"`
    pub duration: String,

    /// Encodings to offer, first-preference order
    pub extensions: Vec<String>,

    /// Presentation attributes; override type- and queue-level entries
    /// key by key
    pub attributes: BTreeMap<String, String>,

    /// Event handlers; override type- and queue-level entries kind by kind
    #[serde(skip)]
    pub handlers: HandlerSet,

    /// Per-descriptor readiness gate override, ratio in `[0, 1]`
    pub progress_threshold: Option<f64>,

    /// Per-descriptor undownloaded-remainder gate override, seconds
    pub duration_threshold: Option<u64>,
}

impl std::fmt::Debug for RawDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDescriptor")
            .field("source", &self.source)
            .field("duration", &self.duration)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// One queue position as supplied by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSlot {
    pub video: Option<RawDescriptor>,
    pub audio: Option<RawDescriptor>,
}

/// Fully resolved, merged configuration for one playable sub-item
#[derive(Clone)]
pub struct MediaDescriptor {
    /// Which element type this describes
    pub kind: MediaKind,

    /// Full location without extension, base source applied
    pub source: String,

    /// Memoized play length in whole seconds
    pub duration_secs: u64,

    /// Encodings to offer, first-preference order
    pub extensions: Vec<String>,

    /// Merged presentation attributes
    pub attributes: BTreeMap<String, String>,

    /// Merged event handlers
    pub handlers: HandlerSet,

    /// Readiness gate: highest buffered fraction must exceed this when
    /// the resource does not yet report enough-data
    pub progress_threshold: f64,

    /// Readiness gate: undownloaded remainder must drop below this many
    /// seconds
    pub duration_threshold: u64,
}

impl MediaDescriptor {
    /// The alternate source/encoding pairs offered to the element
    pub fn source_refs(&self) -> Vec<SourceRef> {
        self.extensions
            .iter()
            .map(|ext| SourceRef {
                url: format!("{}.{}", self.source, ext),
                mime: format!("{}/{}", self.kind.as_str(), ext),
            })
            .collect()
    }
}

impl std::fmt::Debug for MediaDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaDescriptor")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("duration_secs", &self.duration_secs)
            .field("extensions", &self.extensions)
            .field("progress_threshold", &self.progress_threshold)
            .field("duration_threshold", &self.duration_threshold)
            .finish_non_exhaustive()
    }
}

/// One resolved queue position
///
/// A slot's duration is the max of its sub-descriptors' durations: an
/// audio bed may outlast or fall short of its paired video.
#[derive(Debug, Clone)]
pub struct Slot {
    video: Option<MediaDescriptor>,
    audio: Option<MediaDescriptor>,
    duration_secs: u64,
}

impl Slot {
    /// Resolve a raw slot against the queue configuration.
    ///
    /// Pure; runs once per slot at construction.
    ///
    /// # Errors
    ///
    /// `Error::Config` when the raw slot carries neither video nor audio,
    /// when a duration string fails to parse, when a descriptor offers no
    /// extensions, or when a merged `progress_threshold` falls outside
    /// `[0, 1]`.
    pub fn resolve(raw: RawSlot, options: &QueueOptions) -> Result<Slot> {
        if raw.video.is_none() && raw.audio.is_none() {
            return Err(Error::Config(
                "slot has neither a video nor an audio descriptor".to_string(),
            ));
        }

        let video = raw
            .video
            .map(|d| resolve_descriptor(MediaKind::Video, d, options))
            .transpose()?;
        let audio = raw
            .audio
            .map(|d| resolve_descriptor(MediaKind::Audio, d, options))
            .transpose()?;

        let duration_secs = video
            .as_ref()
            .map(|d| d.duration_secs)
            .unwrap_or(0)
            .max(audio.as_ref().map(|d| d.duration_secs).unwrap_or(0));

        Ok(Slot {
            video,
            audio,
            duration_secs,
        })
    }

    /// Resolved video descriptor, if the slot carries one
    pub fn video(&self) -> Option<&MediaDescriptor> {
        self.video.as_ref()
    }

    /// Resolved audio descriptor, if the slot carries one
    pub fn audio(&self) -> Option<&MediaDescriptor> {
        self.audio.as_ref()
    }

    /// Descriptor of the given kind, if present
    pub fn descriptor(&self, kind: MediaKind) -> Option<&MediaDescriptor> {
        match kind {
            MediaKind::Video => self.video.as_ref(),
            MediaKind::Audio => self.audio.as_ref(),
        }
    }

    /// Media kinds present in this slot, video first
    pub fn kinds(&self) -> Vec<MediaKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.video.is_some() {
            kinds.push(MediaKind::Video);
        }
        if self.audio.is_some() {
            kinds.push(MediaKind::Audio);
        }
        kinds
    }

    /// Slot duration: max of the sub-descriptors' durations
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }
}

/// Apply the three-level merge (`media < type-level < descriptor`) to one
/// sub-descriptor and memoize its duration.
fn resolve_descriptor(
    kind: MediaKind,
    raw: RawDescriptor,
    options: &QueueOptions,
) -> Result<MediaDescriptor> {
    let shared: &LayerOptions = &options.media;
    let typed: &LayerOptions = options.layer_for(kind);

    // Attribute maps merge key by key, most specific last
    let mut attributes = shared.attributes.clone();
    attributes.extend(typed.attributes.clone());
    attributes.extend(raw.attributes);

    // Handler tables merge kind by kind
    let handlers = raw
        .handlers
        .merged_over(&typed.handlers.merged_over(&shared.handlers));

    let progress_threshold = raw
        .progress_threshold
        .or(typed.progress_threshold)
        .or(shared.progress_threshold)
        .unwrap_or(DEFAULT_PROGRESS_THRESHOLD);
    if !(0.0..=1.0).contains(&progress_threshold) {
        return Err(Error::Config(format!(
            "{} progress_threshold {} is outside [0, 1]",
            kind, progress_threshold
        )));
    }

    let duration_threshold = raw
        .duration_threshold
        .or(typed.duration_threshold)
        .or(shared.duration_threshold)
        .unwrap_or(DEFAULT_DURATION_THRESHOLD);

    let base = typed
        .base_source
        .as_ref()
        .or(shared.base_source.as_ref())
        .map(String::as_str)
        .unwrap_or("");
    let source = format!("{}{}", base, raw.source);

    if raw.extensions.is_empty() {
        return Err(Error::Config(format!(
            "{} descriptor '{}' offers no extensions",
            kind, source
        )));
    }

    let duration_secs = parse_duration(&raw.duration)?;

    Ok(MediaDescriptor {
        kind,
        source,
        duration_secs,
        extensions: raw.extensions,
        attributes,
        handlers,
        progress_threshold,
        duration_threshold,
    })
}
