//! Single-threaded event loop driving a session.
//!
//! Two timers (caption lookup and identity check) and the inbound command
//! queue are multiplexed in one `select!`. Each branch runs to completion
//! before the next is polled, so the session is never touched concurrently.

use crate::host::Host;
use crate::session::Session;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Commands delivered to a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Raw SubRip text picked by the user.
    Load(String),
    KeyPress(char),
    PointerEnter,
    PointerLeave,
    Shutdown,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Dispatch one inbound command. Returns `false` on shutdown.
pub fn handle<H: Host>(session: &mut Session<H>, message: Inbound) -> bool {
    match message {
        Inbound::Load(raw) => {
            session.load_subtitles(&raw);
        }
        Inbound::KeyPress(key) => {
            let consumed = session.key_press(key, now());
            debug!(%key, consumed, "runtime: key press");
        }
        Inbound::PointerEnter => session.pointer_enter(),
        Inbound::PointerLeave => session.pointer_leave(),
        Inbound::Shutdown => return false,
    }
    true
}

/// Run `session` until a shutdown command arrives or every sender is dropped.
/// The session is handed back so callers can inspect or export it.
pub async fn run<H: Host>(
    mut session: Session<H>,
    mut inbound: mpsc::Receiver<Inbound>,
) -> Session<H> {
    let mut sync = interval(session.config().sync_interval());
    sync.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut identity = interval(session.config().identity_interval());
    identity.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        sync_ms = session.config().sync_interval_ms,
        identity_ms = session.config().identity_interval_ms,
        "runtime: started"
    );

    loop {
        tokio::select! {
            biased;
            message = inbound.recv() => {
                let Some(message) = message else { break };
                if !handle(&mut session, message) {
                    break;
                }
            }
            _ = sync.tick() => {
                session.sync_tick(now());
            }
            _ = identity.tick() => {
                session.identity_tick();
            }
        }
    }
    info!("runtime: stopped");
    session
}
