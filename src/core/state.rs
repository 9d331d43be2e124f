// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

/// Which watchdog loop currently owns the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Created but `Start` not yet handled.
    Pending,

    /// Idle-check timer running; banner hidden.
    Idle,

    /// Countdown timer running; banner visible.
    Warning {
        /// When the banner was shown. Shared activity newer than this cancels the warning.
        display_ms: u64,
        remaining: i64,
    },

    /// Logout redirect issued.
    Terminated,
}

#[derive(Debug, Clone)]
pub struct State {
    phase: Phase,

    // Most recent activity seen on this page (also written to the cookie).
    last_action_ms: u64,

    // Last value read back from the cookie, if any.
    last_shared_ms: Option<u64>,
}

impl State {
    pub fn new(now_ms: u64) -> Self {
        Self {
            phase: Phase::Pending,
            last_action_ms: now_ms,
            last_shared_ms: None,
        }
    }

    // ---------------- getters ----------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.phase, Phase::Warning { .. })
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, Phase::Terminated)
    }

    pub fn last_action_ms(&self) -> u64 {
        self.last_action_ms
    }

    pub fn last_shared_ms(&self) -> Option<u64> {
        self.last_shared_ms
    }

    pub fn remaining(&self) -> Option<i64> {
        match self.phase {
            Phase::Warning { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    // ---------------- setters ----------------

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn set_last_action_ms(&mut self, v: u64) {
        self.last_action_ms = v;
    }

    pub fn set_last_shared_ms(&mut self, v: Option<u64>) {
        if v.is_some() {
            self.last_shared_ms = v;
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::new(0)
    }
}
