//! Subtitle overlay synchronization engine.
//!
//! Parses SubRip files into a caption timeline, keeps the active caption in
//! step with a polled playback clock, and lets the user shift the whole
//! timeline by hand with undo and reset.

pub mod adjust;
pub mod config;
pub mod error;
pub mod host;
pub mod keys;
pub mod overlay;
pub mod runtime;
pub mod session;
pub mod srt;
pub mod sync;
pub mod timeline;
pub mod watcher;

pub use config::SyncConfig;
pub use error::{Direction, SyncError};
pub use host::Host;
pub use keys::Command;
pub use overlay::OverlayView;
pub use runtime::Inbound;
pub use session::Session;
pub use srt::{CaptionEntry, ParseMode};
