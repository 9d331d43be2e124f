// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

use crate::core::{action::TimerKind, state::Phase};

/// Point-in-time view of a running monitor, returned by `MonitorHandle::snapshot`.
#[derive(Debug, Clone, Serialize)]
pub struct InfoSnapshot {
    #[serde(flatten)]
    pub phase: Phase,

    pub now_ms: u64,
    pub last_action_ms: u64,
    pub last_shared_ms: Option<u64>,

    /// Time since the most recent activity known to this page.
    pub idle_for_ms: u64,

    pub active_timers: Vec<TimerKind>,
    pub instrumented_targets: usize,
    pub editor_subscriptions: usize,
}

impl InfoSnapshot {
    pub fn remaining(&self) -> Option<i64> {
        match self.phase {
            Phase::Warning { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    pub fn pretty_text(&self) -> String {
        let phase = match self.phase {
            Phase::Pending => "pending".to_string(),
            Phase::Idle => "watching".to_string(),
            Phase::Warning { remaining, .. } => format!("warning ({remaining}s left)"),
            Phase::Terminated => "logged out".to_string(),
        };

        format!(
            "State: {phase}\nIdle for: {}\nTargets: {} (editor hooks: {})",
            crate::core::utils::format_duration(std::time::Duration::from_millis(self.idle_for_ms)),
            self.instrumented_targets,
            self.editor_subscriptions,
        )
    }
}
