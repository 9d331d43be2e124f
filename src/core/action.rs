// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

/// The two state-machine timers. Exactly one of them runs while the monitor is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    IdleCheck,
    Countdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Store `at_ms` in the shared activity cookie.
    WriteActivity {
        at_ms: u64,
    },

    StartTimer(TimerKind),
    StopTimer(TimerKind),

    /// Make the warning banner visible with the given remaining seconds.
    ShowWarning {
        seconds: i64,
    },

    /// Refresh the countdown badge.
    UpdateCountdown {
        seconds: i64,
    },

    HideWarning,

    /// Hard navigation to the logout url. Terminal.
    Logout {
        url: String,
    },
}
