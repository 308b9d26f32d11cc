//! The capabilities a session needs from whatever embeds it.

use crate::overlay::OverlayView;

/// A video player page as seen by the sync engine.
pub trait Host {
    /// Current playback position in seconds, or `None` when no video is present.
    fn playback_position(&self) -> Option<f64>;

    /// Token identifying the video being played (e.g. its id in the page URL).
    fn video_identity(&self) -> Option<String>;

    /// Whether there is somewhere to attach the caption box.
    fn has_overlay_host(&self) -> bool {
        true
    }

    /// Draw the caption box. Only called when the view changed.
    fn render(&mut self, view: &OverlayView);
}
