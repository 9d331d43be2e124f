// Author: Dustin Pilgrim
// License: MIT

use tokio::time::Instant;

pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall time anchored once, then advanced by the tokio clock.
///
/// Under a paused tokio runtime this clock moves only when tokio time does,
/// which keeps timer ticks and timestamps consistent.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin_ms: u64,
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::anchored_at(crate::core::utils::now_ms())
    }

    pub fn anchored_at(origin_ms: u64) -> Self {
        Self {
            origin_ms,
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.origin_ms + self.origin.elapsed().as_millis() as u64
    }
}
