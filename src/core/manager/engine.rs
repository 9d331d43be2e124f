// Author: Dustin Pilgrim
// License: MIT

use crate::core::{
    action::{Action, TimerKind},
    error::{Error, StateError},
    events::Event,
    state::{Phase, State},
};

use super::Manager;

impl Manager {
    pub fn handle_event(&mut self, state: &mut State, event: Event) -> Result<Vec<Action>, Error> {
        let now_ms = event.now_ms();

        if state.is_terminated() {
            return Err(Error::InvalidState(StateError::Terminated));
        }

        let mut out = Vec::new();

        match event {
            Event::Start { .. } => {
                if state.phase() != Phase::Pending {
                    return Err(Error::InvalidState(StateError::AlreadyStarted));
                }
                tracing::info!("monitor started");
                self.enter_idle(state, now_ms, &mut out);
            }

            Event::IdleCheck { shared_ms, .. } => {
                match state.phase() {
                    Phase::Pending => return Err(Error::InvalidState(StateError::NotStarted)),
                    // Tick queued before the idle timer was stopped.
                    Phase::Warning { .. } | Phase::Terminated => return Ok(out),
                    Phase::Idle => {}
                }

                state.set_last_shared_ms(shared_ms);

                let last_known = match shared_ms {
                    Some(ms) => ms,
                    None => {
                        // Missing cookie: fall back to the newest time this page
                        // knows of and put it back so other pages see it too.
                        let known = state
                            .last_action_ms()
                            .max(state.last_shared_ms().unwrap_or(0));
                        tracing::debug!(
                            "idle check: activity cookie missing, reseeding with {}",
                            known
                        );
                        out.push(Action::WriteActivity { at_ms: known });
                        known
                    }
                };

                let idle_for = now_ms.saturating_sub(last_known);
                if idle_for >= self.cfg().idle_timeout_ms() {
                    tracing::info!(
                        "idle for {}ms (timeout {}ms); showing logout warning",
                        idle_for,
                        self.cfg().idle_timeout_ms()
                    );
                    self.enter_warning(state, now_ms, &mut out);
                }
            }

            Event::CountdownTick { shared_ms, .. } => {
                let (display_ms, remaining) = match state.phase() {
                    Phase::Pending => return Err(Error::InvalidState(StateError::NotStarted)),
                    Phase::Idle | Phase::Terminated => return Ok(out),
                    Phase::Warning { display_ms, remaining } => (display_ms, remaining),
                };

                state.set_last_shared_ms(shared_ms);

                if shared_ms.is_some_and(|ms| ms > display_ms) {
                    tracing::info!("activity recorded since warning was shown; resetting");
                    self.cancel_warning(state, now_ms, &mut out);
                    return Ok(out);
                }

                let remaining = remaining - 1;
                if remaining <= 0 {
                    tracing::info!("countdown exhausted; logging out");
                    out.push(Action::StopTimer(TimerKind::Countdown));
                    out.push(Action::Logout { url: self.cfg().logout_url.clone() });
                    state.set_phase(Phase::Terminated);
                    return Ok(out);
                }

                state.set_phase(Phase::Warning { display_ms, remaining });
                out.push(Action::UpdateCountdown { seconds: remaining });
            }

            Event::UserActivity { source, .. } => {
                if state.phase() == Phase::Pending {
                    return Err(Error::InvalidState(StateError::NotStarted));
                }

                tracing::trace!("activity: {:?}", source);

                if state.is_warning() {
                    // Re-entering idle records the action and writes the cookie.
                    self.cancel_warning(state, now_ms, &mut out);
                } else {
                    state.set_last_action_ms(now_ms);
                    out.push(Action::WriteActivity { at_ms: now_ms });
                }
            }
        }

        Ok(out)
    }

    // ---------------- transitions ----------------

    fn enter_idle(&self, state: &mut State, now_ms: u64, out: &mut Vec<Action>) {
        state.set_last_action_ms(now_ms);
        state.set_phase(Phase::Idle);

        out.push(Action::WriteActivity { at_ms: now_ms });
        out.push(Action::StartTimer(TimerKind::IdleCheck));
    }

    fn enter_warning(&self, state: &mut State, now_ms: u64, out: &mut Vec<Action>) {
        let seconds = self.cfg().countdown_seconds;

        state.set_phase(Phase::Warning {
            display_ms: now_ms,
            remaining: seconds,
        });

        out.push(Action::StopTimer(TimerKind::IdleCheck));
        out.push(Action::ShowWarning { seconds });
        out.push(Action::StartTimer(TimerKind::Countdown));
    }

    fn cancel_warning(&self, state: &mut State, now_ms: u64, out: &mut Vec<Action>) {
        out.push(Action::StopTimer(TimerKind::Countdown));
        out.push(Action::HideWarning);
        self.enter_idle(state, now_ms, out);
    }
}
