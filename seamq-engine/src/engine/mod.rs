//! Playback scheduler module
//!
//! **Module Structure:**
//! - `core.rs`: engine struct, construction, queries, signal delivery and
//!   handler dispatch
//! - `playback.rs`: transport operations (mount, prepare, play, seek,
//!   jump-to-on-end)
//! - `reclaim.rs`: resource reclaimer (detach non-current slots, pause all)

mod core;
mod playback;
mod reclaim;

// Re-export PlaybackEngine as public API
pub use self::core::PlaybackEngine;
