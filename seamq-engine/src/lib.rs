//! # Seamq Engine Library (seamq-engine)
//!
//! Gapless media slot queue: sequences a fixed list of audio/video slots
//! into one continuous playback timeline, preloading the upcoming slot
//! before the current one ends so transitions are gap-free, and exposing
//! seek/duration operations as if the whole sequence were one media object.
//!
//! **Architecture:** single-threaded, callback-driven scheduler over two
//! injected collaborators: a [`host::MediaHost`] that attaches renderable
//! nodes, and one [`host::MediaElement`] per mounted sub-descriptor. All
//! scheduling decisions are reactions to signals the host delivers through
//! [`engine::PlaybackEngine::deliver`].

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod host;
pub mod mount;
pub mod readiness;
pub mod timeline;

pub use seamq_common::{Error, EventBus, QueueEvent, Result};

pub use config::{HandlerContext, HandlerSet, LayerOptions, QueueOptions, SlotEventKind, SlotHandler};
pub use descriptor::{MediaDescriptor, MediaKind, RawDescriptor, RawSlot, Slot};
pub use engine::PlaybackEngine;
pub use host::{
    slot_key, BufferedRange, ElementHandle, ElementSpec, MediaElement, MediaHost, MediaSignal,
    ReadyState, SourceRef,
};
pub use mount::{MountState, MountToken};
pub use timeline::SlotTimeline;
