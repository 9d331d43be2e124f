// Author: Dustin Pilgrim
// License: MIT

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::{
    action::TimerKind,
    manager_msg::{ManagerMsg, PollKind},
};
use crate::services::ticker::run_ticker;

/// Owns every timer task of one monitor: the two state timers (at most one
/// alive at a time) and the discovery pollers that live until teardown.
#[derive(Debug, Default)]
pub struct TimerSet {
    idle_check: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    pollers: Vec<JoinHandle<()>>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `kind`, replacing a previous instance of the same kind.
    pub fn start(&mut self, kind: TimerKind, period: Duration, tx: mpsc::Sender<ManagerMsg>) {
        self.stop(kind);

        let (label, handle) = match kind {
            TimerKind::IdleCheck => ("idle-check", &mut self.idle_check),
            TimerKind::Countdown => ("countdown", &mut self.countdown),
        };

        *handle = Some(tokio::spawn(run_ticker(label, period, tx, move || {
            ManagerMsg::Timer(kind)
        })));
    }

    pub fn stop(&mut self, kind: TimerKind) {
        let slot = match kind {
            TimerKind::IdleCheck => &mut self.idle_check,
            TimerKind::Countdown => &mut self.countdown,
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    pub fn spawn_poller(&mut self, kind: PollKind, period: Duration, tx: mpsc::Sender<ManagerMsg>) {
        let label = match kind {
            PollKind::Frames => "frame-poll",
            PollKind::Editors => "editor-poll",
        };
        self.pollers.push(tokio::spawn(run_ticker(label, period, tx, move || {
            ManagerMsg::Poll(kind)
        })));
    }

    pub fn active(&self) -> Vec<TimerKind> {
        let mut out = Vec::new();
        if self.idle_check.is_some() {
            out.push(TimerKind::IdleCheck);
        }
        if self.countdown.is_some() {
            out.push(TimerKind::Countdown);
        }
        out
    }

    /// Abort all tasks including pollers.
    pub fn abort_all(&mut self) {
        self.stop(TimerKind::IdleCheck);
        self.stop(TimerKind::Countdown);

        for handle in self.pollers.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.abort_all();
    }
}
