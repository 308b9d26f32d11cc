//! The owned context object tying every component together.
//!
//! A [`Session`] holds the timeline, the presenter, the suppression flag and
//! the watcher for one page. Every method runs to completion and leaves the
//! session consistent, so a single-threaded driver needs no locking.

use crate::adjust::{self, Adjustment, DriftNotice, Suppression};
use crate::config::SyncConfig;
use crate::error::{Direction, SyncError};
use crate::host::Host;
use crate::keys::{Command, KeyMap};
use crate::overlay::{OverlayView, Presenter};
use crate::srt::{self, ParseAnomaly};
use crate::sync::SyncEngine;
use crate::timeline::Timeline;
use crate::watcher::IdentityWatcher;
use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Outcome of loading a subtitle file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub entries: usize,
    pub anomalies: Vec<ParseAnomaly>,
}

pub struct Session<H> {
    config: SyncConfig,
    keys: KeyMap,
    host: H,
    timeline: Timeline,
    engine: SyncEngine,
    presenter: Presenter,
    watcher: IdentityWatcher,
    suppression: Suppression,
    drift: Option<DriftNotice>,
    hovering: bool,
    last_view: Option<OverlayView>,
}

impl<H: Host> Session<H> {
    /// Build a session around `host`. Fails only on an invalid config.
    pub fn new(config: SyncConfig, host: H) -> Result<Self> {
        config.validate()?;
        let keys = config.key_map()?;
        Ok(Self {
            keys,
            host,
            timeline: Timeline::new(),
            engine: SyncEngine::new(),
            presenter: Presenter::new(config.font_baseline_px, config.font_step_px),
            watcher: IdentityWatcher::new(),
            suppression: Suppression::new(config.suppression()),
            drift: None,
            hovering: false,
            last_view: None,
            config,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Drift value currently on display, if any.
    pub fn drift(&self) -> Option<f64> {
        self.drift.map(|notice| notice.drift)
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppression.is_active(now)
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Parse `raw` and make it the active timeline, dropping any undo history.
    pub fn load_subtitles(&mut self, raw: &str) -> LoadReport {
        let parsed = srt::parse(raw, self.config.parse_mode);
        let report = LoadReport {
            entries: parsed.entries.len(),
            anomalies: parsed.anomalies,
        };
        self.timeline.load(parsed.entries);
        info!(
            entries = report.entries,
            anomalies = report.anomalies.len(),
            "session: subtitles loaded"
        );
        report
    }

    /// Periodic caption lookup.
    ///
    /// Skipped while a manual adjustment is settling or when no video is
    /// present; in both cases the previous active caption is returned.
    pub fn sync_tick(&mut self, now: Instant) -> Option<usize> {
        self.expire_drift(now);
        if self.suppression.is_active(now) {
            trace!("session: autosync suppressed");
            self.publish();
            return self.timeline.active();
        }
        let Some(position) = self.host.playback_position() else {
            self.publish();
            return self.timeline.active();
        };
        let active = self.engine.tick(&mut self.timeline, position);
        if active.is_some() {
            if let Err(err) = self.ensure_overlay() {
                debug!(%err, "session: caption not shown");
            }
        }
        self.display_active();
        self.publish();
        active
    }

    /// Periodic video identity check. A new video empties the timeline.
    pub fn identity_tick(&mut self) -> bool {
        if self.host.playback_position().is_none() {
            return false;
        }
        let identity = self.host.video_identity();
        if !self.watcher.check_identity(identity.as_deref()) {
            return false;
        }
        self.timeline.clear();
        self.drift = None;
        self.presenter.hide();
        self.publish();
        info!("session: subtitles cleared for new video");
        true
    }

    pub fn pointer_enter(&mut self) {
        self.hovering = true;
    }

    pub fn pointer_leave(&mut self) {
        self.hovering = false;
    }

    /// Handle a key press. Returns whether the key was consumed.
    ///
    /// Keys only act while the pointer is over the video, a video is present
    /// and subtitles are loaded.
    pub fn key_press(&mut self, key: char, now: Instant) -> bool {
        if !self.hovering {
            return false;
        }
        let Some(command) = self.keys.lookup(key) else {
            return false;
        };
        if self.host.playback_position().is_none() || self.timeline.is_empty() {
            debug!(?command, "session: key ignored, nothing to control");
            return false;
        }
        if let Err(err) = self.apply(command, now) {
            debug!(?command, %err, "session: command had no effect");
        }
        true
    }

    /// Carry out `command`. Failures leave the session untouched.
    pub fn apply(&mut self, command: Command, now: Instant) -> Result<(), SyncError> {
        let result = match command {
            Command::Show => {
                self.presenter.set_visible(true);
                self.display_active();
                Ok(())
            }
            Command::Hide => {
                self.presenter.set_visible(false);
                self.display_active();
                Ok(())
            }
            Command::CoarseBackward => self.coarse(Direction::Backward, now),
            Command::CoarseForward => self.coarse(Direction::Forward, now),
            Command::FineBackward => self.fine(Direction::Backward, now),
            Command::FineForward => self.fine(Direction::Forward, now),
            Command::Undo => self.undo(now),
            Command::Reset => {
                self.timeline.reset();
                self.drift = None;
                self.presenter.reset_font_size();
                self.display_active();
                info!("session: timings reset");
                Ok(())
            }
            Command::GrowFont => {
                self.presenter.grow();
                Ok(())
            }
            Command::ShrinkFont => {
                self.presenter.shrink();
                Ok(())
            }
            Command::ResetFont => {
                self.presenter.reset_font_size();
                Ok(())
            }
        };
        self.publish();
        result
    }

    /// The working timeline as SRT text.
    pub fn export_srt(&self) -> String {
        srt::format(self.timeline.current())
    }

    fn coarse(&mut self, direction: Direction, now: Instant) -> Result<(), SyncError> {
        self.ensure_overlay()?;
        let mut applied = 0;
        for _ in 0..self.config.coarse_repeat {
            let position = self.host.playback_position();
            match adjust::coarse(&mut self.timeline, position, direction) {
                Ok(adjustment) => {
                    applied += 1;
                    self.after_adjustment(adjustment, now);
                }
                Err(err) if applied > 0 => {
                    debug!(%err, applied, "session: repeated coarse step stopped early");
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn fine(&mut self, direction: Direction, now: Instant) -> Result<(), SyncError> {
        self.ensure_overlay()?;
        let position = self.host.playback_position();
        let adjustment = adjust::fine(
            &mut self.timeline,
            position,
            self.config.fine_step_secs,
            direction,
        )?;
        self.after_adjustment(adjustment, now);
        Ok(())
    }

    fn undo(&mut self, now: Instant) -> Result<(), SyncError> {
        self.ensure_overlay()?;
        self.timeline.undo()?;
        self.suppression.engage(now);
        self.drift = self
            .timeline
            .active()
            .and_then(|i| self.timeline.drift(i))
            .map(|drift| DriftNotice::new(drift, now, self.config.drift_display()));
        self.display_active();
        Ok(())
    }

    fn after_adjustment(&mut self, adjustment: Adjustment, now: Instant) {
        self.suppression.engage(now);
        if let Some(drift) = adjustment.drift {
            info!(drift, active = ?adjustment.active, "session: timeline adjusted");
            self.drift = Some(DriftNotice::new(drift, now, self.config.drift_display()));
        }
        self.display_active();
    }

    fn ensure_overlay(&mut self) -> Result<(), SyncError> {
        if !self.host.has_overlay_host() {
            return Err(SyncError::NoOverlayHost);
        }
        self.presenter.ensure_surface();
        Ok(())
    }

    /// Show the active caption, or hide the box when nothing is active.
    fn display_active(&mut self) {
        match self.timeline.active_entry() {
            Some(entry) => self.presenter.show(&entry.text),
            None => self.presenter.hide(),
        }
    }

    fn expire_drift(&mut self, now: Instant) {
        if self.drift.is_some_and(|notice| notice.is_expired(now)) {
            self.drift = None;
        }
    }

    /// Send the current view to the host if it changed.
    fn publish(&mut self) {
        let view = self.presenter.view(self.drift());
        if view != self.last_view {
            if let Some(view) = &view {
                self.host.render(view);
            }
            self.last_view = view;
        }
    }
}
