//! Precondition failures raised by timeline operations.
//! None of these are fatal: the session logs them and leaves state untouched.

use std::fmt;
use thiserror::Error;

/// Which way a timeline adjustment moves the active caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Backward => f.write_str("backward"),
            Direction::Forward => f.write_str("forward"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("no subtitles are loaded")]
    EmptyTimeline,
    #[error("no caption is active at the current position")]
    NoActiveEntry,
    #[error("cannot move {direction} from caption {index} of {len}")]
    OutOfRange {
        direction: Direction,
        index: usize,
        len: usize,
    },
    #[error("caption {index} has no usable timing")]
    InvalidTiming { index: usize },
    #[error("playback position is unavailable")]
    NoPlayback,
    #[error("no overlay host is available")]
    NoOverlayHost,
    #[error("nothing to undo")]
    NothingToUndo,
}
