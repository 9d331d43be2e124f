// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::oneshot;

use crate::core::{action::TimerKind, events::ActivitySource, info::InfoSnapshot};

/// Discovery scans that run for the whole page lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Frames,
    Editors,
}

#[derive(Debug)]
pub enum ManagerMsg {
    /// A state-machine timer fired.
    Timer(TimerKind),

    /// A discovery poll fired.
    Poll(PollKind),

    /// An attached listener observed input.
    Activity(ActivitySource),

    GetInfo { reply: oneshot::Sender<InfoSnapshot> },
}
