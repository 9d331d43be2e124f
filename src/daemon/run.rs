// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::watch;

use crate::core::{
    action::TimerKind,
    events::Event,
    manager_msg::{ManagerMsg, PollKind},
};

use super::{Monitor, Outcome};

impl Monitor {
    pub(super) async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Outcome {
        tracing::info!("monitor starting");

        self.surface.mount_banner(&self.banner);
        self.attacher.attach_all();

        self.timers
            .spawn_poller(PollKind::Frames, self.cfg.frame_poll_period, self.tx.clone());
        self.timers
            .spawn_poller(PollKind::Editors, self.cfg.editor_poll_period, self.tx.clone());

        let start = Event::Start { now_ms: self.clock.now_ms() };
        if let Some(outcome) = self.dispatch(start) {
            return self.finish(outcome);
        }

        let outcome = loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("monitor stopping (shutdown requested)");
                        break Outcome::Stopped;
                    }
                }

                maybe = self.rx.recv() => {
                    let Some(msg) = maybe else {
                        tracing::info!("monitor stopping (channel closed)");
                        break Outcome::Stopped;
                    };

                    if let Some(outcome) = self.handle_msg(msg) {
                        break outcome;
                    }
                }
            }
        };

        self.finish(outcome)
    }

    fn handle_msg(&mut self, msg: ManagerMsg) -> Option<Outcome> {
        match msg {
            ManagerMsg::Timer(kind) => {
                let now_ms = self.clock.now_ms();
                let shared_ms = self.store.read();

                let event = match kind {
                    TimerKind::IdleCheck => Event::IdleCheck { now_ms, shared_ms },
                    TimerKind::Countdown => Event::CountdownTick { now_ms, shared_ms },
                };
                self.dispatch(event)
            }

            ManagerMsg::Activity(source) => {
                let now_ms = self.clock.now_ms();
                self.dispatch(Event::UserActivity { source, now_ms })
            }

            ManagerMsg::Poll(PollKind::Frames) => {
                self.attacher.scan_frames();
                None
            }

            ManagerMsg::Poll(PollKind::Editors) => {
                self.attacher.scan_editors();
                None
            }

            ManagerMsg::GetInfo { reply } => {
                let _ = reply.send(self.snapshot());
                None
            }
        }
    }

    fn dispatch(&mut self, event: Event) -> Option<Outcome> {
        let actions = match self.manager.handle_event(&mut self.state, event) {
            Ok(actions) => actions,
            Err(e) => {
                tracing::debug!("event rejected: {e}");
                return None;
            }
        };

        let mut outcome = None;
        for action in actions {
            if let Some(o) = self.exec_action(action) {
                outcome = Some(o);
            }
        }
        outcome
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        self.timers.abort_all();
        tracing::info!("monitor stopped: {:?}", outcome);
        outcome
    }
}
