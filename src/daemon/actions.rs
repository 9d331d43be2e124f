// Author: Dustin Pilgrim
// License: MIT

use crate::core::action::{Action, TimerKind};

use super::{Monitor, Outcome};

impl Monitor {
    /// Apply one engine action. Returns an outcome when the action ends the session.
    pub(super) fn exec_action(&mut self, action: Action) -> Option<Outcome> {
        match action {
            Action::WriteActivity { at_ms } => {
                self.store.write(at_ms);
            }

            Action::StartTimer(kind) => {
                let period = match kind {
                    TimerKind::IdleCheck | TimerKind::Countdown => self.cfg.check_period,
                };
                tracing::debug!("timer start: {:?}", kind);
                self.timers.start(kind, period, self.tx.clone());
            }

            Action::StopTimer(kind) => {
                tracing::debug!("timer stop: {:?}", kind);
                self.timers.stop(kind);
            }

            Action::ShowWarning { seconds } => {
                self.surface.show_banner(seconds);
            }

            Action::UpdateCountdown { seconds } => {
                self.surface.set_countdown(seconds);
            }

            Action::HideWarning => {
                self.surface.hide_banner();
            }

            Action::Logout { url } => {
                tracing::info!("logout: {}", url);
                self.surface.navigate(&url);
                return Some(Outcome::LoggedOut { url });
            }
        }

        None
    }
}
