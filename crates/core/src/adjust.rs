//! Manual timing correction.
//!
//! Every operation here shifts the whole working timeline by the same amount,
//! so captions keep their relative spacing. A snapshot is pushed before any
//! mutation so the change can be undone, and nothing is touched when a
//! precondition fails.

use crate::error::{Direction, SyncError};
use crate::sync::find_nearest;
use crate::timeline::Timeline;
use std::time::{Duration, Instant};
use tracing::debug;

/// What an adjustment left behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    /// Offset applied to every caption, in seconds.
    pub delta: f64,
    /// Active caption after the adjustment.
    pub active: Option<usize>,
    /// Distance of the active caption from its parsed start.
    pub drift: Option<f64>,
}

impl Adjustment {
    fn new(timeline: &Timeline, delta: f64) -> Self {
        let active = timeline.active();
        Self {
            delta,
            active,
            drift: active.and_then(|i| timeline.drift(i)),
        }
    }
}

/// Re-anchor the timeline so the active caption starts at `position`, then
/// step the active marker one caption in `direction`.
///
/// The way this works is by measuring the gap between the playback position
/// and the active caption's start and adding that gap to every caption.
pub fn coarse(
    timeline: &mut Timeline,
    position: Option<f64>,
    direction: Direction,
) -> Result<Adjustment, SyncError> {
    if timeline.is_empty() {
        return Err(SyncError::EmptyTimeline);
    }
    let position = position
        .filter(|p| p.is_finite())
        .ok_or(SyncError::NoPlayback)?;
    let index = timeline.active().ok_or(SyncError::NoActiveEntry)?;
    let len = timeline.len();
    let next = match direction {
        Direction::Backward => index.checked_sub(1),
        Direction::Forward => Some(index + 1).filter(|&i| i < len),
    }
    .ok_or(SyncError::OutOfRange {
        direction,
        index,
        len,
    })?;

    // A caption kept from a malformed block cannot be an anchor.
    let delta = position - timeline.current()[index].start;
    if !delta.is_finite() {
        return Err(SyncError::InvalidTiming { index });
    }
    timeline.push_snapshot();
    timeline.shift_all(delta);
    timeline.set_active(Some(next));
    debug!(%direction, delta, from = index, to = next, "adjust: coarse resync");
    Ok(Adjustment::new(timeline, delta))
}

/// Nudge every caption by `step` seconds.
///
/// Backward makes captions appear later, forward makes them appear earlier.
/// When the playback position is known the active marker moves to the
/// caption whose start is closest to it.
pub fn fine(
    timeline: &mut Timeline,
    position: Option<f64>,
    step: f64,
    direction: Direction,
) -> Result<Adjustment, SyncError> {
    if timeline.is_empty() {
        return Err(SyncError::EmptyTimeline);
    }
    let delta = match direction {
        Direction::Backward => step,
        Direction::Forward => -step,
    };
    timeline.push_snapshot();
    timeline.shift_all(delta);
    if let Some(position) = position.filter(|p| p.is_finite()) {
        let nearest = find_nearest(timeline.current(), position);
        timeline.set_active(nearest);
    }
    debug!(%direction, delta, active = ?timeline.active(), "adjust: fine nudge");
    Ok(Adjustment::new(timeline, delta))
}

/// Quiet period after a manual adjustment during which autosync is skipped.
#[derive(Debug, Clone)]
pub struct Suppression {
    window: Duration,
    until: Option<Instant>,
}

impl Suppression {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            until: None,
        }
    }

    /// Start (or extend) the quiet period from `now`.
    pub fn engage(&mut self, now: Instant) {
        self.until = Some(now + self.window);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// A drift value shown for a short time after an adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftNotice {
    pub drift: f64,
    pub expires_at: Instant,
}

impl DriftNotice {
    pub fn new(drift: f64, now: Instant, ttl: Duration) -> Self {
        Self {
            drift,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
