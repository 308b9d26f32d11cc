//! Caption overlay state.
//!
//! This is the content and visibility contract of the on-screen caption box.
//! How a host actually draws it is up to [`crate::host::Host::render`].

use serde::Serialize;
use tracing::debug;

/// Smallest font size the overlay will shrink to.
const MIN_FONT_PX: f32 = 1.0;

/// What the host should currently draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayView {
    /// Whether the caption box is on screen.
    pub displayed: bool,
    /// Caption lines, top to bottom.
    pub lines: Vec<String>,
    pub font_px: f32,
    /// Transient drift indicator in seconds, if one is showing.
    pub drift: Option<f64>,
}

/// The caption box itself, created the first time a caption needs showing.
#[derive(Debug, Clone, PartialEq)]
struct Surface {
    lines: Vec<String>,
    displayed: bool,
    font_px: f32,
}

/// Overlay presenter.
///
/// `visible` is the user's show/hide choice and outlives any single caption;
/// while it is off, showing a caption never puts the box on screen.
#[derive(Debug, Clone)]
pub struct Presenter {
    visible: bool,
    baseline_px: f32,
    step_px: f32,
    surface: Option<Surface>,
}

impl Presenter {
    pub fn new(baseline_px: f32, step_px: f32) -> Self {
        Self {
            visible: true,
            baseline_px,
            step_px,
            surface: None,
        }
    }

    /// Create the caption box if it does not exist yet.
    pub fn ensure_surface(&mut self) {
        if self.surface.is_none() {
            debug!(font_px = self.baseline_px, "overlay: surface created");
            self.surface = Some(Surface {
                lines: Vec::new(),
                displayed: false,
                font_px: self.baseline_px,
            });
        }
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_displayed(&self) -> bool {
        self.surface.as_ref().is_some_and(|s| s.displayed)
    }

    /// Put `text` in the box, one line per `\n`.
    pub fn show(&mut self, text: &str) {
        let visible = self.visible;
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if !visible {
            surface.displayed = false;
            return;
        }
        surface.lines = text.split('\n').map(str::to_string).collect();
        surface.displayed = true;
    }

    pub fn hide(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.displayed = false;
        }
    }

    pub fn grow(&mut self) {
        self.resize(self.step_px);
    }

    pub fn shrink(&mut self) {
        self.resize(-self.step_px);
    }

    pub fn reset_font_size(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.font_px = self.baseline_px;
        }
    }

    fn resize(&mut self, by: f32) {
        if let Some(surface) = self.surface.as_mut() {
            surface.font_px = (surface.font_px + by).max(MIN_FONT_PX);
            debug!(font_px = surface.font_px, "overlay: font resized");
        }
    }

    pub fn font_px(&self) -> f32 {
        self.surface.as_ref().map_or(self.baseline_px, |s| s.font_px)
    }

    /// Snapshot of what should be on screen. `None` until the box exists.
    pub fn view(&self, drift: Option<f64>) -> Option<OverlayView> {
        let surface = self.surface.as_ref()?;
        Some(OverlayView {
            displayed: surface.displayed,
            lines: if surface.displayed {
                surface.lines.clone()
            } else {
                Vec::new()
            },
            font_px: surface.font_px,
            drift,
        })
    }
}
