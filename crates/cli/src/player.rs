//! A stand-in video player for driving a session from the terminal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use subsync_core::{Host, OverlayView};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct PlayerState {
    /// Position at the moment playback last started or was seeked.
    base: f64,
    /// When playback last started; `None` while paused.
    playing_since: Option<Instant>,
    video_id: Option<String>,
    /// Whether a video element is on the page at all.
    present: bool,
}

/// Playback clock and video identity shared between the input reader and the session.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl SimulatedPlayer {
    /// A player already playing `video_id` from `start` seconds.
    pub fn new(video_id: Option<String>, start: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState {
                base: start,
                playing_since: Some(Instant::now()),
                video_id,
                present: true,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn position(&self) -> Option<f64> {
        let state = self.state();
        if !state.present {
            return None;
        }
        let elapsed = state
            .playing_since
            .map_or(0.0, |since| since.elapsed().as_secs_f64());
        Some(state.base + elapsed)
    }

    pub fn seek(&self, secs: f64) {
        let mut state = self.state();
        state.base = secs.max(0.0);
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        debug!(position = state.base, "player: seek");
    }

    pub fn pause(&self) {
        let position = self.position();
        let mut state = self.state();
        if let (Some(position), Some(_)) = (position, state.playing_since) {
            state.base = position;
            state.playing_since = None;
        }
    }

    pub fn play(&self) {
        let mut state = self.state();
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
    }

    /// Navigate to another video, starting it from the beginning.
    pub fn open(&self, video_id: String) {
        let mut state = self.state();
        state.video_id = Some(video_id);
        state.base = 0.0;
        state.playing_since = Some(Instant::now());
        state.present = true;
    }

    /// Leave the video page.
    pub fn close(&self) {
        let mut state = self.state();
        state.present = false;
        state.playing_since = None;
    }
}

impl Host for SimulatedPlayer {
    fn playback_position(&self) -> Option<f64> {
        self.position()
    }

    fn video_identity(&self) -> Option<String> {
        self.state().video_id.clone()
    }

    fn render(&mut self, view: &OverlayView) {
        let position = self.position().unwrap_or_default();
        println!("[{position:8.3}] {}", describe(view));
    }
}

/// One-line rendering of the caption box for the terminal.
pub fn describe(view: &OverlayView) -> String {
    let mut out = if view.displayed {
        view.lines.join(" / ")
    } else {
        "(hidden)".to_string()
    };
    out.push_str(&format!("  [{}px]", view.font_px));
    if let Some(drift) = view.drift {
        out.push_str(&format!("  drift {drift:+.3}s"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Ensure the caption box description covers every state.
    #[test]
    fn describes_views() {
        let mut view = OverlayView {
            displayed: true,
            lines: vec!["Hello".into(), "there".into()],
            font_px: 20.0,
            drift: None,
        };
        assert_eq!(describe(&view), "Hello / there  [20px]");
        view.displayed = false;
        view.drift = Some(-0.25);
        assert_eq!(describe(&view), "(hidden)  [20px]  drift -0.250s");
    }

    /// Ensure the clock runs, pauses and seeks.
    #[tokio::test(start_paused = true)]
    async fn clock_follows_controls() {
        let player = SimulatedPlayer::new(Some("a".into()), 10.0);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(player.position(), Some(12.0));

        player.pause();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(player.position(), Some(12.0));

        player.seek(3.0);
        player.play();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(player.position(), Some(4.0));
    }

    /// Ensure navigation changes the identity and closing hides the video.
    #[test]
    fn navigation() {
        let player = SimulatedPlayer::new(None, 0.0);
        assert_eq!(player.video_identity(), None);
        player.open("next".into());
        assert_eq!(player.video_identity().as_deref(), Some("next"));
        player.close();
        assert_eq!(player.playback_position(), None);
    }
}
