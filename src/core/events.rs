// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

/// Where an activity signal came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    /// Input listener on a window, frame or iframe body.
    Input { target: String, kind: InputKind },

    /// Notification from a rich-text editor instance.
    Editor { instance: String, channel: EditorChannel },

    /// Reported by the embedder through the monitor's sink.
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    MouseDown,
    MouseMove,
    Scroll,
    KeyDown,
}

impl InputKind {
    pub const ALL: [InputKind; 4] = [
        InputKind::MouseDown,
        InputKind::MouseMove,
        InputKind::Scroll,
        InputKind::KeyDown,
    ];

    /// DOM event name.
    pub fn event_name(self) -> &'static str {
        match self {
            InputKind::MouseDown => "mousedown",
            InputKind::MouseMove => "mousemove",
            InputKind::Scroll => "scroll",
            InputKind::KeyDown => "keydown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorChannel {
    Key,
    SelectionChange,
}

impl EditorChannel {
    pub const ALL: [EditorChannel; 2] = [EditorChannel::Key, EditorChannel::SelectionChange];

    /// Editor notification name.
    pub fn event_name(self) -> &'static str {
        match self {
            EditorChannel::Key => "key",
            EditorChannel::SelectionChange => "selectionChange",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Page loaded; enter the idle phase.
    Start {
        now_ms: u64,
    },

    /// Idle-check timer fired. `shared_ms` is the activity cookie just read
    /// (`None` when absent or unparseable).
    IdleCheck {
        now_ms: u64,
        shared_ms: Option<u64>,
    },

    /// Countdown timer fired.
    CountdownTick {
        now_ms: u64,
        shared_ms: Option<u64>,
    },

    UserActivity {
        source: ActivitySource,
        now_ms: u64,
    },
}

impl Event {
    pub fn now_ms(&self) -> u64 {
        match self {
            Event::Start { now_ms }
            | Event::IdleCheck { now_ms, .. }
            | Event::CountdownTick { now_ms, .. }
            | Event::UserActivity { now_ms, .. } => *now_ms,
        }
    }
}
