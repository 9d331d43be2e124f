// Author: Dustin Pilgrim
// License: MIT

use std::time::Duration;

use serde::Serialize;

use crate::core::error::ConfigError;

/// Idle timeout value that selects the short development timings.
pub const DEV_SENTINEL: i64 = -1;

/// Name of the shared activity cookie.
pub const COOKIE_NAME: &str = "IdleCheck";

/// How often the idle check and the countdown run.
pub const CHECK_PERIOD: Duration = Duration::from_millis(1000);

/// How often the rich-text editor registry is re-scanned.
pub const EDITOR_POLL_PERIOD: Duration = Duration::from_millis(3000);

/// How often nested frames are re-scanned for new documents.
pub const FRAME_POLL_PERIOD: Duration = Duration::from_millis(3000);

/// Seconds the logout warning is shown before the redirect.
pub const COUNTDOWN_SECONDS: i64 = 60;

const DEV_IDLE_TIMEOUT: Duration = Duration::from_millis(10_000);
const DEV_COUNTDOWN_SECONDS: i64 = 10;

/// Per-page configuration. Built once from the construction parameters and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorConfig {
    #[serde(serialize_with = "as_millis")]
    pub idle_timeout: Duration,
    pub countdown_seconds: i64,

    #[serde(serialize_with = "as_millis")]
    pub check_period: Duration,
    #[serde(serialize_with = "as_millis")]
    pub editor_poll_period: Duration,
    #[serde(serialize_with = "as_millis")]
    pub frame_poll_period: Duration,

    pub cookie_name: String,
    pub cookie_domain: String,
    pub logout_url: String,
    pub warning_text: String,

    pub dev_mode: bool,
}

impl MonitorConfig {
    /// `idle_timeout_minutes` is scaled as `minutes * 5 * 1000` ms; `-1` picks the
    /// development timings (10 s idle window, 10 s countdown).
    pub fn from_params(
        idle_timeout_minutes: i64,
        cookie_domain: impl Into<String>,
        logout_url: impl Into<String>,
        warning_text: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (idle_timeout, countdown_seconds, dev_mode) = if idle_timeout_minutes == DEV_SENTINEL {
            (DEV_IDLE_TIMEOUT, DEV_COUNTDOWN_SECONDS, true)
        } else if idle_timeout_minutes > 0 {
            let ms = (idle_timeout_minutes as u64).saturating_mul(5 * 1000);
            (Duration::from_millis(ms), COUNTDOWN_SECONDS, false)
        } else {
            return Err(ConfigError::InvalidIdleTimeout(idle_timeout_minutes));
        };

        let cookie_domain = cookie_domain.into();
        if !valid_cookie_domain(&cookie_domain) {
            return Err(ConfigError::InvalidCookieDomain);
        }

        let logout_url = logout_url.into();
        if logout_url.is_empty() || logout_url.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidLogoutUrl);
        }

        let cfg = Self {
            idle_timeout,
            countdown_seconds,
            check_period: CHECK_PERIOD,
            editor_poll_period: EDITOR_POLL_PERIOD,
            frame_poll_period: FRAME_POLL_PERIOD,
            cookie_name: COOKIE_NAME.to_string(),
            cookie_domain,
            logout_url,
            warning_text: warning_text.into(),
            dev_mode,
        };

        tracing::debug!(
            idle_timeout_ms = cfg.idle_timeout_ms(),
            countdown = cfg.countdown_seconds,
            check_period_ms = cfg.check_period.as_millis() as u64,
            editor_poll_ms = cfg.editor_poll_period.as_millis() as u64,
            frame_poll_ms = cfg.frame_poll_period.as_millis() as u64,
            dev_mode = cfg.dev_mode,
            "monitor config built"
        );

        Ok(cfg)
    }

    /// Override the polling periods. All three must be non-zero.
    pub fn with_polling(
        mut self,
        check: Duration,
        editor: Duration,
        frame: Duration,
    ) -> Result<Self, ConfigError> {
        if check.is_zero() || editor.is_zero() || frame.is_zero() {
            return Err(ConfigError::ZeroPollPeriod);
        }
        self.check_period = check;
        self.editor_poll_period = editor;
        self.frame_poll_period = frame;
        Ok(self)
    }

    pub fn idle_timeout_ms(&self) -> u64 {
        self.idle_timeout.as_millis() as u64
    }
}

fn valid_cookie_domain(domain: &str) -> bool {
    !domain.is_empty()
        && !domain
            .chars()
            .any(|c| c == ';' || c == '=' || c == ',' || c.is_whitespace())
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
