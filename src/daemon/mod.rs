// Author: Dustin Pilgrim
// License: MIT

mod actions;
mod run;
pub mod timers;


use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::core::{
    config::MonitorConfig,
    events::ActivitySource,
    info::InfoSnapshot,
    manager::Manager,
    manager_msg::ManagerMsg,
    state::State,
};
use crate::services::{
    clock::Clock,
    cookie::ActivityStore,
    listeners::Attacher,
    surface::{Banner, Surface},
    EventSink, Host,
};

use self::timers::TimerSet;

const CHANNEL_CAPACITY: usize = 256;

/// How a monitor task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `stop()` was called (or every handle was dropped).
    Stopped,

    /// The countdown ran out and the page was sent to the logout url.
    LoggedOut { url: String },
}

#[derive(Debug)]
pub enum MonitorError {
    /// The monitor task panicked or was cancelled.
    Join(tokio::task::JoinError),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Join(e) => write!(f, "monitor task failed: {e}"),
        }
    }
}

impl std::error::Error for MonitorError {}

struct MpscEventSink {
    tx: mpsc::Sender<ManagerMsg>,
}

impl EventSink for MpscEventSink {
    fn push(&self, source: ActivitySource) {
        // Never blocks the listener; the next event carries a newer time anyway.
        match self.tx.try_send(ManagerMsg::Activity(source)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(msg)) => {
                tracing::trace!("activity dropped (mailbox full): {:?}", msg);
            }
            Err(mpsc::error::TrySendError::Closed(msg)) => {
                tracing::trace!("activity dropped (monitor gone): {:?}", msg);
            }
        }
    }
}

/// The per-page activity monitor: engine, state, shared-cookie store,
/// listener attacher, warning surface and timers, all owned by one task.
pub struct Monitor {
    cfg: Arc<MonitorConfig>,

    manager: Manager,
    state: State,

    store: ActivityStore,
    attacher: Attacher,
    surface: Arc<dyn Surface>,
    clock: Arc<dyn Clock>,
    banner: Banner,

    timers: TimerSet,

    tx: mpsc::Sender<ManagerMsg>,
    rx: mpsc::Receiver<ManagerMsg>,
    sink: Arc<dyn EventSink>,
}

impl Monitor {
    pub fn new(cfg: MonitorConfig, host: Host) -> Self {
        let cfg = Arc::new(cfg);
        let (tx, rx) = mpsc::channel::<ManagerMsg>(CHANNEL_CAPACITY);
        let sink: Arc<dyn EventSink> = Arc::new(MpscEventSink { tx: tx.clone() });

        let now_ms = host.clock.now_ms();

        tracing::debug!(
            "monitor: idle_timeout={}ms, countdown={}s, cookie={} domain={}, logout={}",
            cfg.idle_timeout_ms(),
            cfg.countdown_seconds,
            cfg.cookie_name,
            cfg.cookie_domain,
            cfg.logout_url,
        );

        Self {
            manager: Manager::new(cfg.clone()),
            state: State::new(now_ms),
            store: ActivityStore::new(host.cookies, &cfg),
            attacher: Attacher::new(host.dom, sink.clone()),
            surface: host.surface,
            clock: host.clock,
            banner: Banner::new(cfg.warning_text.clone(), cfg.countdown_seconds),
            timers: TimerSet::new(),
            cfg,
            tx,
            rx,
            sink,
        }
    }

    /// Spawn the monitor task. Mounts the banner, attaches listeners, starts
    /// the pollers and enters the idle phase.
    pub fn start(self) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tx = self.tx.clone();
        let sink = self.sink.clone();

        let mut monitor = self;
        let task = tokio::spawn(async move { monitor.run(shutdown_rx).await });

        MonitorHandle {
            tx,
            sink,
            shutdown_tx,
            task,
        }
    }

    fn snapshot(&self) -> InfoSnapshot {
        let now_ms = self.clock.now_ms();
        let last_known = self
            .state
            .last_shared_ms()
            .unwrap_or(0)
            .max(self.state.last_action_ms());

        InfoSnapshot {
            phase: self.state.phase(),
            now_ms,
            last_action_ms: self.state.last_action_ms(),
            last_shared_ms: self.state.last_shared_ms(),
            idle_for_ms: now_ms.saturating_sub(last_known),
            active_timers: self.timers.active(),
            instrumented_targets: self.attacher.instrumented_count(),
            editor_subscriptions: self.attacher.editor_hook_count(),
        }
    }
}

/// Control side of a started monitor.
pub struct MonitorHandle {
    tx: mpsc::Sender<ManagerMsg>,
    sink: Arc<dyn EventSink>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Outcome>,
}

impl MonitorHandle {
    /// Sink for activity observed outside the attached listeners.
    pub fn sink(&self) -> Arc<dyn EventSink> {
        self.sink.clone()
    }

    /// Report activity directly (same path as a DOM listener).
    pub fn report_activity(&self) {
        self.sink.push(ActivitySource::External);
    }

    /// Current state, or `None` once the task has ended.
    pub async fn snapshot(&self) -> Option<InfoSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(ManagerMsg::GetInfo { reply }).await.ok()?;
        rx.await.ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop every timer and end the task.
    pub async fn stop(self) -> Result<Outcome, MonitorError> {
        let _ = self.shutdown_tx.send(true);
        self.task.await.map_err(MonitorError::Join)
    }

    /// Wait for the task to end on its own (logout).
    pub async fn wait(self) -> Result<Outcome, MonitorError> {
        self.task.await.map_err(MonitorError::Join)
    }
}
