// Author: Dustin Pilgrim
// License: MIT

pub mod engine;

use std::sync::Arc;

use crate::core::config::MonitorConfig;

/// Pure idle/warning state machine. Owns no timers and performs no I/O:
/// every transition is expressed as an ordered list of `Action`s.
#[derive(Debug, Clone)]
pub struct Manager {
    cfg: Arc<MonitorConfig>,
}

impl Manager {
    pub fn new(cfg: Arc<MonitorConfig>) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &MonitorConfig {
        &self.cfg
    }
}
